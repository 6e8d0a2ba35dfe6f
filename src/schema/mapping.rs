use crate::core::error::Result;
use crate::core::types::{Record, RecordKind};
use crate::index::document::Document;
use crate::index::sortable::sortable_serialise;
use crate::index::termgen::TermGenerator;
use crate::schema::schema::{prefix, RecordSchema, TextIndexing};
use crate::source::annotation::AnnotationCache;

/// A record turned into an index document, ready to upsert.
#[derive(Debug, Clone)]
pub struct MappedDocument {
    pub id: String,
    pub id_term: String,
    pub document: Document,
}

/// `<tag>:<name>:<dataset>`, lowercased; `None` unless both identifier
/// fields are present.
pub fn document_id(schema: &RecordSchema, record: &Record) -> Option<String> {
    let (name_field, dataset_field) = schema.id_fields;
    let name = record.text(name_field)?;
    let dataset = record.text(dataset_field)?;
    Some(format!("{}:{}:{}", schema.kind.tag(), name, dataset).to_lowercase())
}

pub fn id_term(id: &str) -> String {
    format!("{}{}", prefix::ID, id)
}

pub fn type_term(kind: RecordKind) -> String {
    format!("{}{}", prefix::TYPE, kind.tag())
}

/// Maps records of one kind. Owns its term generator, so each worker
/// builds its own mapper.
pub struct DocumentMapper<'a> {
    schema: &'a RecordSchema,
    annotations: &'a AnnotationCache,
    termgen: TermGenerator,
}

impl<'a> DocumentMapper<'a> {
    pub fn new(schema: &'a RecordSchema, annotations: &'a AnnotationCache) -> Self {
        DocumentMapper {
            schema,
            annotations,
            termgen: TermGenerator::english(),
        }
    }

    /// `Ok(None)` when the record lacks an identifier field.
    pub fn map(&mut self, record: &Record) -> Result<Option<MappedDocument>> {
        let Some(id) = document_id(self.schema, record) else {
            return Ok(None);
        };

        let mut document = Document::new();
        self.termgen.reset();

        for field in &self.schema.values {
            if let Some(value) = record.number(field.name) {
                document.add_value(field.slot, sortable_serialise(value));
            }
        }

        for field in &self.schema.text_fields {
            if let Some(text) = record.text(field.name) {
                match field.indexing {
                    TextIndexing::Positional => self.termgen.index_text(&mut document, &text, ""),
                    TextIndexing::PositionFree => {
                        self.termgen.index_text_without_positions(&mut document, &text, "")
                    }
                }
            }
        }

        for facet in &self.schema.facets {
            if let Some(text) = record.text(facet.name) {
                self.termgen
                    .index_text_without_positions(&mut document, &text, facet.prefix);
            }
        }

        if let Some(comment) = self.annotation_for(record) {
            self.termgen
                .index_text_without_positions(&mut document, comment, prefix::ANNOTATION);
        }

        document.set_data(serde_json::to_vec(record)?);

        let id_term = id_term(&id);
        document.add_boolean_term(&id_term);
        document.add_boolean_term(&type_term(self.schema.kind));

        Ok(Some(MappedDocument { id, id_term, document }))
    }

    fn annotation_for(&self, record: &Record) -> Option<&'a str> {
        let (species_field, symbol_field) = self.schema.annotation_key?;
        let species = record.text(species_field)?;
        let symbol = record.text(symbol_field)?;
        self.annotations.get(&species, &symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::sortable::sortable_unserialise;
    use crate::schema::schema::slot;

    fn gene() -> Record {
        Record::new()
            .with("name", "G1")
            .with("dataset", "DS1")
            .with("species", "mouse")
            .with("symbol", "Shh")
            .with("description", "sonic hedgehog")
            .with("mean", 5.2)
            .with_null("lrs")
    }

    #[test]
    fn gene_record_maps_terms_values_and_payload() {
        let schema = RecordSchema::genes();
        let cache = AnnotationCache::new();
        let mut mapper = DocumentMapper::new(&schema, &cache);

        let mapped = mapper.map(&gene()).unwrap().unwrap();
        assert_eq!(mapped.id, "gene:g1:ds1");
        assert_eq!(mapped.id_term, "Qgene:g1:ds1");

        let doc = &mapped.document;
        assert!(doc.has_term("Qgene:g1:ds1"));
        assert!(doc.has_term("XTgene"));
        assert!(doc.has_term("XSmouse"));
        assert!(doc.has_term("XYshh"));
        assert!(!doc.terms["hedgehog"].positions.is_empty());
        assert_eq!(sortable_unserialise(doc.value(slot::MEAN).unwrap()), Some(5.2));
        assert!(doc.value(slot::PEAK_LRS).is_none());

        let payload: Record = serde_json::from_slice(&doc.data).unwrap();
        assert_eq!(payload, gene());
    }

    #[test]
    fn missing_identifier_field_skips_record() {
        let schema = RecordSchema::genes();
        let cache = AnnotationCache::new();
        let mut mapper = DocumentMapper::new(&schema, &cache);

        let no_dataset = Record::new().with("name", "G1").with_null("dataset");
        assert!(mapper.map(&no_dataset).unwrap().is_none());
        let no_name = Record::new().with("dataset", "DS1");
        assert!(mapper.map(&no_name).unwrap().is_none());
    }

    #[test]
    fn annotation_indexed_under_its_prefix() {
        let schema = RecordSchema::genes();
        let mut cache = AnnotationCache::new();
        cache.insert("mouse", "Shh", "Required for limb patterning");
        let mut mapper = DocumentMapper::new(&schema, &cache);

        let doc = mapper.map(&gene()).unwrap().unwrap().document;
        assert!(doc.has_term("XRFlimb"));
        assert!(doc.terms["XRFlimb"].positions.is_empty());
    }

    #[test]
    fn phenotype_identifier_uses_numeric_name() {
        let schema = RecordSchema::phenotypes();
        let cache = AnnotationCache::new();
        let mut mapper = DocumentMapper::new(&schema, &cache);

        let record = Record::new()
            .with("name", 10001i64)
            .with("dataset", "BXDPublish")
            .with("authors", "Williams RW")
            .with("year", 2001i64);
        let mapped = mapper.map(&record).unwrap().unwrap();
        assert_eq!(mapped.id, "phenotype:10001:bxdpublish");
        assert!(mapped.document.has_term("XTphenotype"));
        assert!(mapped.document.has_term("Awilliams"));
        assert_eq!(sortable_unserialise(mapped.document.value(slot::YEAR).unwrap()), Some(2001.0));
    }
}
