use std::collections::BTreeSet;
use crate::core::types::RecordKind;

/// How a column is decoded into a [`crate::core::types::FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float,
    Integer,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub expr: &'static str,
    pub alias: &'static str,
    pub ty: ColumnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub table: &'static str,
    pub on: &'static str,
}

/// Declared shape of the relational query for one record kind.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub kind: RecordKind,
    pub columns: Vec<Column>,
    pub from: &'static str,
    pub joins: Vec<Join>,
    pub filter: Option<&'static str>,
    pub order_by: Vec<&'static str>,
}

// MySQL has no "OFFSET without LIMIT"; this is its documented idiom.
const UNBOUNDED_LIMIT: &str = "18446744073709551615";

fn col(expr: &'static str, alias: &'static str, ty: ColumnType) -> Column {
    Column { expr, alias, ty }
}

fn inner(table: &'static str, on: &'static str) -> Join {
    Join { kind: JoinKind::Inner, table, on }
}

fn left(table: &'static str, on: &'static str) -> Join {
    Join { kind: JoinKind::Left, table, on }
}

impl RecordQuery {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Gene => RecordQuery::genes(),
            RecordKind::Phenotype => RecordQuery::phenotypes(),
        }
    }

    pub fn genes() -> Self {
        use ColumnType::*;
        RecordQuery {
            kind: RecordKind::Gene,
            columns: vec![
                col("ProbeSet.Name", "name", Text),
                col("ProbeSet.Symbol", "symbol", Text),
                col("ProbeSet.description", "description", Text),
                col("ProbeSet.Chr", "chr", Text),
                col("ProbeSet.Mb", "mb", Float),
                col("ProbeSet.alias", "alias", Text),
                col("ProbeSet.GenbankId", "genbank_id", Text),
                col("ProbeSet.UniGeneId", "unigene_id", Text),
                col("ProbeSet.Probe_Target_Description", "probe_target_description", Text),
                col("ProbeSetFreeze.Name", "dataset", Text),
                col("ProbeSetFreeze.FullName", "dataset_fullname", Text),
                col("Species.Name", "species", Text),
                col("InbredSet.Name", "group", Text),
                col("Tissue.Name", "tissue", Text),
                col("ProbeSetXRef.Mean", "mean", Float),
                col("ProbeSetXRef.LRS", "lrs", Float),
                col("ProbeSetXRef.additive", "additive", Float),
                col("Geno.Chr", "geno_chr", Text),
                col("Geno.Mb", "geno_mb", Float),
            ],
            from: "Species",
            joins: vec![
                inner("InbredSet", "InbredSet.SpeciesId = Species.Id"),
                inner("ProbeFreeze", "ProbeFreeze.InbredSetId = InbredSet.Id"),
                inner("Tissue", "ProbeFreeze.TissueId = Tissue.Id"),
                inner("ProbeSetFreeze", "ProbeSetFreeze.ProbeFreezeId = ProbeFreeze.Id"),
                inner("ProbeSetXRef", "ProbeSetXRef.ProbeSetFreezeId = ProbeSetFreeze.Id"),
                inner("ProbeSet", "ProbeSet.Id = ProbeSetXRef.ProbeSetId"),
                left("Geno", "ProbeSetXRef.Locus = Geno.Name AND Geno.SpeciesId = Species.Id"),
            ],
            filter: Some("ProbeSetFreeze.confidentiality < 1 AND ProbeSetFreeze.public > 0"),
            order_by: vec!["ProbeSetXRef.ProbeSetFreezeId", "ProbeSetXRef.ProbeSetId"],
        }
    }

    pub fn phenotypes() -> Self {
        use ColumnType::*;
        RecordQuery {
            kind: RecordKind::Phenotype,
            columns: vec![
                col("Species.Name", "species", Text),
                col("InbredSet.Name", "group", Text),
                col("PublishFreeze.Name", "dataset", Text),
                col("PublishFreeze.FullName", "dataset_fullname", Text),
                col("PublishXRef.Id", "name", Integer),
                col(
                    "COALESCE(Phenotype.Post_publication_abbreviation, Phenotype.Pre_publication_abbreviation)",
                    "abbreviation",
                    Text,
                ),
                col(
                    "COALESCE(Phenotype.Post_publication_description, Phenotype.Pre_publication_description)",
                    "description",
                    Text,
                ),
                col("Phenotype.Lab_code", "lab_code", Text),
                col("Publication.Abstract", "abstract", Text),
                col("Publication.Title", "title", Text),
                col("Publication.Authors", "authors", Text),
                col(
                    "IF(CONVERT(Publication.Year, UNSIGNED) = 0, NULL, CONVERT(Publication.Year, UNSIGNED))",
                    "year",
                    Integer,
                ),
                col("Publication.PubMed_ID", "pubmed_id", Integer),
                col("PublishXRef.LRS", "lrs", Float),
                col("PublishXRef.additive", "additive", Float),
                col("PublishXRef.mean", "mean", Float),
                col("InbredSet.InbredSetCode", "inbredsetcode", Text),
                col("Geno.Chr", "geno_chr", Text),
                col("Geno.Mb", "geno_mb", Float),
            ],
            from: "Species",
            joins: vec![
                inner("InbredSet", "InbredSet.SpeciesId = Species.Id"),
                inner("PublishFreeze", "PublishFreeze.InbredSetId = InbredSet.Id"),
                inner("PublishXRef", "PublishXRef.InbredSetId = InbredSet.Id"),
                inner("Phenotype", "PublishXRef.PhenotypeId = Phenotype.Id"),
                inner("Publication", "PublishXRef.PublicationId = Publication.Id"),
                left("Geno", "PublishXRef.Locus = Geno.Name AND Geno.SpeciesId = Species.Id"),
            ],
            filter: None,
            order_by: vec!["PublishFreeze.Id", "PublishXRef.Id"],
        }
    }

    /// Every table the query reads, in declaration order.
    pub fn tables(&self) -> Vec<&'static str> {
        std::iter::once(self.from)
            .chain(self.joins.iter().map(|j| j.table))
            .collect()
    }

    pub fn to_sql(&self, offset: u64, limit: Option<u64>) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} AS `{}`", c.expr, c.alias))
            .collect();

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.from);
        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            sql.push_str(&format!(" {} {} ON {}", keyword, join.table, join.on));
        }
        if let Some(filter) = self.filter {
            sql.push_str(&format!(" WHERE {}", filter));
        }
        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }
        match (limit, offset) {
            (Some(limit), 0) => sql.push_str(&format!(" LIMIT {}", limit)),
            (Some(limit), offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (None, 0) => {}
            (None, offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", UNBOUNDED_LIMIT, offset)),
        }
        sql
    }
}

/// Sorted, de-duplicated tables read by any of `queries`.
pub fn watched_tables(queries: &[RecordQuery]) -> Vec<String> {
    queries
        .iter()
        .flat_map(RecordQuery::tables)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_without_limit_uses_unbounded_limit() {
        let sql = RecordQuery::genes().to_sql(200, None);
        assert!(sql.starts_with("SELECT ProbeSet.Name AS `name`, "));
        assert!(sql.contains(" LEFT JOIN Geno ON ProbeSetXRef.Locus = Geno.Name"));
        assert!(sql.contains(" WHERE ProbeSetFreeze.confidentiality < 1"));
        assert!(sql.ends_with("ORDER BY ProbeSetXRef.ProbeSetFreezeId, ProbeSetXRef.ProbeSetId LIMIT 18446744073709551615 OFFSET 200"));
    }

    #[test]
    fn first_page_has_no_offset() {
        let sql = RecordQuery::phenotypes().to_sql(0, Some(10));
        assert!(sql.ends_with("ORDER BY PublishFreeze.Id, PublishXRef.Id LIMIT 10"));
        assert!(!sql.contains("WHERE"));
        assert_eq!(RecordQuery::phenotypes().to_sql(0, None).find("LIMIT"), None);
    }

    #[test]
    fn watched_tables_cover_both_queries() {
        let tables = watched_tables(&[RecordQuery::genes(), RecordQuery::phenotypes()]);
        assert_eq!(
            tables,
            vec![
                "Geno", "InbredSet", "Phenotype", "ProbeFreeze", "ProbeSet", "ProbeSetFreeze",
                "ProbeSetXRef", "Publication", "PublishFreeze", "PublishXRef", "Species", "Tissue",
            ]
        );
    }
}
