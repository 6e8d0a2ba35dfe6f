use crate::core::types::RecordKind;

/// Term prefixes. Single-purpose facets get short upper-case tags so
/// boolean filters can address one field.
pub mod prefix {
    pub const ID: &str = "Q";
    pub const TYPE: &str = "XT";
    pub const AUTHOR: &str = "A";
    pub const SPECIES: &str = "XS";
    pub const GROUP: &str = "XG";
    pub const TISSUE: &str = "XI";
    pub const DATASET: &str = "XDS";
    pub const CHROMOSOME: &str = "XC";
    pub const SYMBOL: &str = "XY";
    pub const PEAK_CHROMOSOME: &str = "XPC";
    pub const ANNOTATION: &str = "XRF";
}

/// Value slots shared by both record kinds.
pub mod slot {
    pub const MEAN: u32 = 0;
    pub const PEAK_LRS: u32 = 1;
    pub const POSITION_MB: u32 = 2;
    pub const PEAK_POSITION_MB: u32 = 3;
    pub const ADDITIVE: u32 = 4;
    pub const YEAR: u32 = 5;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextIndexing {
    Positional,     // Phrase-searchable
    PositionFree,   // Term presence only
}

/// Field definition for free text
#[derive(Debug, Clone)]
pub struct TextField {
    pub name: &'static str,
    pub indexing: TextIndexing,
}

/// Field indexed a second time under its own prefix
#[derive(Debug, Clone)]
pub struct FacetField {
    pub name: &'static str,
    pub prefix: &'static str,
}

/// Numeric field stored in a sortable slot
#[derive(Debug, Clone)]
pub struct ValueField {
    pub name: &'static str,
    pub slot: u32,
}

/// How records of one kind become documents.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub kind: RecordKind,
    pub id_fields: (&'static str, &'static str),
    pub annotation_key: Option<(&'static str, &'static str)>,
    pub text_fields: Vec<TextField>,
    pub facets: Vec<FacetField>,
    pub values: Vec<ValueField>,
}

impl RecordSchema {
    pub fn new(kind: RecordKind) -> Self {
        RecordSchema {
            kind,
            id_fields: ("name", "dataset"),
            annotation_key: None,
            text_fields: Vec::new(),
            facets: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Gene => RecordSchema::genes(),
            RecordKind::Phenotype => RecordSchema::phenotypes(),
        }
    }

    pub fn genes() -> Self {
        RecordSchema::new(RecordKind::Gene)
            .add_value("mean", slot::MEAN)
            .add_value("lrs", slot::PEAK_LRS)
            .add_value("mb", slot::POSITION_MB)
            .add_value("geno_mb", slot::PEAK_POSITION_MB)
            .add_value("additive", slot::ADDITIVE)
            .add_text_field("description", TextIndexing::Positional)
            .add_text_field("tissue", TextIndexing::Positional)
            .add_text_field("dataset_fullname", TextIndexing::Positional)
            .add_text_field("probe_target_description", TextIndexing::Positional)
            .add_text_field("name", TextIndexing::Positional)
            .add_text_field("symbol", TextIndexing::Positional)
            .add_text_field("species", TextIndexing::Positional)
            .add_text_field("group", TextIndexing::Positional)
            .add_text_field("alias", TextIndexing::PositionFree)
            .add_text_field("genbank_id", TextIndexing::PositionFree)
            .add_text_field("unigene_id", TextIndexing::PositionFree)
            .add_facet("species", prefix::SPECIES)
            .add_facet("group", prefix::GROUP)
            .add_facet("tissue", prefix::TISSUE)
            .add_facet("dataset", prefix::DATASET)
            .add_facet("chr", prefix::CHROMOSOME)
            .add_facet("symbol", prefix::SYMBOL)
            .add_facet("geno_chr", prefix::PEAK_CHROMOSOME)
            .with_annotation_key("species", "symbol")
    }

    pub fn phenotypes() -> Self {
        RecordSchema::new(RecordKind::Phenotype)
            .add_value("mean", slot::MEAN)
            .add_value("lrs", slot::PEAK_LRS)
            .add_value("geno_mb", slot::PEAK_POSITION_MB)
            .add_value("additive", slot::ADDITIVE)
            .add_value("year", slot::YEAR)
            .add_text_field("description", TextIndexing::Positional)
            .add_text_field("abbreviation", TextIndexing::Positional)
            .add_text_field("title", TextIndexing::Positional)
            .add_text_field("abstract", TextIndexing::Positional)
            .add_text_field("authors", TextIndexing::Positional)
            .add_text_field("dataset_fullname", TextIndexing::Positional)
            .add_text_field("name", TextIndexing::Positional)
            .add_text_field("species", TextIndexing::Positional)
            .add_text_field("group", TextIndexing::Positional)
            .add_text_field("lab_code", TextIndexing::PositionFree)
            .add_text_field("pubmed_id", TextIndexing::PositionFree)
            .add_facet("species", prefix::SPECIES)
            .add_facet("group", prefix::GROUP)
            .add_facet("dataset", prefix::DATASET)
            .add_facet("geno_chr", prefix::PEAK_CHROMOSOME)
            .add_facet("authors", prefix::AUTHOR)
    }

    pub fn add_text_field(mut self, name: &'static str, indexing: TextIndexing) -> Self {
        self.text_fields.push(TextField { name, indexing });
        self
    }

    pub fn add_facet(mut self, name: &'static str, prefix: &'static str) -> Self {
        self.facets.push(FacetField { name, prefix });
        self
    }

    pub fn add_value(mut self, name: &'static str, slot: u32) -> Self {
        self.values.push(ValueField { name, slot });
        self
    }

    pub fn with_annotation_key(mut self, species: &'static str, symbol: &'static str) -> Self {
        self.annotation_key = Some((species, symbol));
        self
    }
}
