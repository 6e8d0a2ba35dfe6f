use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use crate::core::database::{Database, WritableDatabase};
use crate::core::error::Result;
use crate::core::types::RecordKind;
use crate::source::RecordSource;
use crate::source::annotation::AnnotationSource;
use crate::source::query::{watched_tables, RecordQuery};

pub const TABLES_KEY: &str = "tables";
pub const CHECKSUMS_KEY: &str = "checksums";
pub const ANNOTATION_HASH_KEY: &str = "generif-checksum";

/// Source-data state an index was built from: one checksum per watched
/// table plus the hash of the annotation dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub tables: Vec<String>,
    pub checksums: Vec<String>,
    pub annotation_hash: String,
}

impl Fingerprint {
    /// Tables read by any record query, sorted.
    pub fn watched_tables() -> Vec<String> {
        let queries: Vec<RecordQuery> = RecordKind::ALL
            .iter()
            .map(|kind| RecordQuery::for_kind(*kind))
            .collect();
        watched_tables(&queries)
    }

    pub fn compute(records: &mut dyn RecordSource, annotations: &dyn AnnotationSource) -> Result<Self> {
        let tables = Fingerprint::watched_tables();
        let checksums = records
            .table_checksums(&tables)?
            .iter()
            .map(|c| c.render().to_string())
            .collect();
        let annotation_hash = annotations.dataset_hash()?;

        Ok(Fingerprint {
            tables,
            checksums,
            annotation_hash,
        })
    }

    /// Fingerprint stored in `db`, if it carries one.
    pub fn read_from(db: &Database) -> Option<Self> {
        let checksums = db.get_metadata(CHECKSUMS_KEY)?;
        let annotation_hash = db.get_metadata(ANNOTATION_HASH_KEY)?;
        Some(Fingerprint {
            tables: split(db.get_metadata(TABLES_KEY).unwrap_or_default()),
            checksums: split(checksums),
            annotation_hash: annotation_hash.to_string(),
        })
    }

    /// Fingerprint of the index published at `dir`; `None` if there is no
    /// index or it was built without one.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        if !Database::exists(dir) {
            return Ok(None);
        }
        let db = Database::open(dir)?;
        Ok(Fingerprint::read_from(&db))
    }

    pub fn write_to(&self, db: &mut WritableDatabase) -> Result<()> {
        db.set_metadata(TABLES_KEY, &self.tables.join(" "))?;
        db.set_metadata(CHECKSUMS_KEY, &self.checksums.join(" "))?;
        db.set_metadata(ANNOTATION_HASH_KEY, &self.annotation_hash)
    }

    /// Same source state. The table list is only compared when both sides
    /// recorded one.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        let same_tables = self.tables.is_empty() || other.tables.is_empty() || self.tables == other.tables;
        same_tables && self.checksums == other.checksums && self.annotation_hash == other.annotation_hash
    }
}

fn split(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Changed,
    Unchanged,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Change::Changed => f.write_str("changed"),
            Change::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Compare `current` against the fingerprint of the index at `dir`.
pub fn compare(dir: &Path, current: &Fingerprint) -> Result<Change> {
    let change = match Fingerprint::load(dir)? {
        Some(previous) if previous.matches(current) => Change::Unchanged,
        Some(previous) => {
            debug!(previous = ?previous, current = ?current, "fingerprint differs");
            Change::Changed
        }
        None => {
            debug!(dir = %dir.display(), "no stored fingerprint");
            Change::Changed
        }
    };
    Ok(change)
}

/// Has the source data moved on since the index at `dir` was built?
pub fn detect(dir: &Path, records: &mut dyn RecordSource, annotations: &dyn AnnotationSource) -> Result<Change> {
    let current = Fingerprint::compute(records, annotations)?;
    let change = compare(dir, &current)?;
    info!(dir = %dir.display(), %change, "checked source data");
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::annotation::StaticAnnotations;
    use crate::source::memory::MemorySource;
    use tempfile::TempDir;

    fn publish_fingerprint(dir: &Path, fingerprint: &Fingerprint) {
        let mut db = WritableDatabase::create(dir).unwrap();
        fingerprint.write_to(&mut db).unwrap();
        db.commit().unwrap();
    }

    #[test]
    fn watched_tables_are_sorted_and_unique() {
        let tables = Fingerprint::watched_tables();
        let mut sorted = tables.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(tables, sorted);
        assert!(tables.contains(&"ProbeSetXRef".to_string()));
        assert!(tables.contains(&"Publication".to_string()));
    }

    #[test]
    fn missing_table_checksum_renders_null() {
        let mut source = MemorySource::new().with_checksum("Geno", "17");
        let fingerprint = Fingerprint::compute(&mut source, &StaticAnnotations::default()).unwrap();
        assert_eq!(fingerprint.tables[0], "Geno");
        assert_eq!(fingerprint.checksums[0], "17");
        assert_eq!(fingerprint.checksums[1], "NULL");
    }

    #[test]
    fn stored_fingerprint_round_trips_through_metadata() {
        let dir = TempDir::new().unwrap();
        let mut source = MemorySource::new().with_checksum("Species", "9");
        let annotations = StaticAnnotations::new(Default::default(), "abc");
        let fingerprint = Fingerprint::compute(&mut source, &annotations).unwrap();
        publish_fingerprint(dir.path(), &fingerprint);

        assert_eq!(Fingerprint::load(dir.path()).unwrap(), Some(fingerprint));
    }

    #[test]
    fn never_built_counts_as_changed() {
        let dir = TempDir::new().unwrap();
        let mut source = MemorySource::new();
        let change = detect(&dir.path().join("missing"), &mut source, &StaticAnnotations::default()).unwrap();
        assert_eq!(change, Change::Changed);
    }

    #[test]
    fn index_without_fingerprint_counts_as_changed() {
        let dir = TempDir::new().unwrap();
        WritableDatabase::create(dir.path()).unwrap().commit().unwrap();
        let mut source = MemorySource::new();
        let change = detect(dir.path(), &mut source, &StaticAnnotations::default()).unwrap();
        assert_eq!(change, Change::Changed);
    }
}
