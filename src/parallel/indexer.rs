use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{debug, warn};
use crate::core::database::WritableDatabase;
use crate::core::error::Result;
use crate::core::types::{Record, RecordKind};
use crate::schema::mapping::DocumentMapper;
use crate::schema::schema::RecordSchema;
use crate::source::annotation::AnnotationCache;

/// Serializes shard commits across workers. Held only while the encoded
/// segment is written; mapping and encoding run unlocked.
pub type CommitLock = Arc<Mutex<()>>;

pub fn commit_lock() -> CommitLock {
    Arc::new(Mutex::new(()))
}

/// One batch of records bound for one new shard directory.
pub struct ShardJob {
    pub kind: RecordKind,
    pub chunk: u64,
    pub path: PathBuf,
    pub records: Vec<Record>,
    pub annotations: Arc<AnnotationCache>,
    pub commit_lock: CommitLock,
}

impl ShardJob {
    pub fn label(&self) -> String {
        format!("{}-{:05}", self.kind.shard_dir(), self.chunk)
    }
}

/// A committed shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardInfo {
    pub kind: RecordKind,
    pub chunk: u64,
    pub path: PathBuf,
    pub records: usize,
    pub documents: usize,
    pub skipped: usize,
}

/// Build one shard from `job` inside a single transaction. On any failure
/// the transaction is cancelled and the shard directory removed.
pub fn index_shard(job: ShardJob) -> Result<ShardInfo> {
    let schema = RecordSchema::for_kind(job.kind);
    let mut db = WritableDatabase::create(&job.path)?;
    db.begin_transaction()?;

    let outcome = add_records(&mut db, &schema, &job).and_then(|skipped| {
        let prepared = db.prepare_transaction()?;
        let _guard = job.commit_lock.lock();
        db.write_prepared(prepared).map(|segment| (skipped, segment))
    });

    match outcome {
        Ok((skipped, segment)) => {
            debug!(
                shard = %job.label(),
                records = job.records.len(),
                documents = segment.doc_count,
                skipped,
                bytes = segment.size_bytes,
                "shard committed"
            );
            Ok(ShardInfo {
                kind: job.kind,
                chunk: job.chunk,
                path: job.path,
                records: job.records.len(),
                documents: segment.doc_count as usize,
                skipped,
            })
        }
        Err(err) => {
            if db.in_transaction() {
                db.cancel_transaction()?;
            }
            drop(db);
            discard(&job.path);
            Err(err.within(&format!("shard {}", job.label())))
        }
    }
}

/// Map and stage every record; returns how many were skipped for lack of
/// an identifier.
fn add_records(db: &mut WritableDatabase, schema: &RecordSchema, job: &ShardJob) -> Result<usize> {
    let mut mapper = DocumentMapper::new(schema, &job.annotations);
    let mut skipped = 0;

    for record in &job.records {
        match mapper.map(record)? {
            Some(mapped) => db.replace_document(&mapped.id_term, mapped.document)?,
            None => skipped += 1,
        }
    }
    Ok(skipped)
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_dir_all(path) {
        warn!(path = %path.display(), error = %err, "could not remove failed shard");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::Database;
    use crate::core::error::ErrorKind;
    use crate::schema::mapping::id_term;
    use crate::storage::layout::StorageLayout;
    use tempfile::TempDir;

    fn job(dir: &TempDir, records: Vec<Record>) -> ShardJob {
        ShardJob {
            kind: RecordKind::Gene,
            chunk: 0,
            path: dir.path().join("genes").join("00000"),
            records,
            annotations: Arc::new(AnnotationCache::new()),
            commit_lock: commit_lock(),
        }
    }

    fn gene(name: &str, mean: f64) -> Record {
        Record::new().with("name", name).with("dataset", "DS1").with("mean", mean)
    }

    #[test]
    fn duplicate_identifiers_keep_last_record() {
        let dir = TempDir::new().unwrap();
        let info = index_shard(job(&dir, vec![gene("G1", 1.0), gene("G2", 2.0), gene("G1", 3.0)])).unwrap();
        assert_eq!(info.records, 3);
        assert_eq!(info.documents, 2);

        let db = Database::open(&info.path).unwrap();
        let stored = db.document(&id_term("gene:g1:ds1")).unwrap();
        let payload: Record = serde_json::from_slice(&stored.document.data).unwrap();
        assert_eq!(payload.number("mean"), Some(3.0));
    }

    #[test]
    fn records_without_identifier_are_skipped() {
        let dir = TempDir::new().unwrap();
        let records = vec![gene("G1", 1.0), Record::new().with("name", "G2"), Record::new()];
        let info = index_shard(job(&dir, records)).unwrap();
        assert_eq!(info.documents, 1);
        assert_eq!(info.skipped, 2);
    }

    #[test]
    fn existing_shard_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        index_shard(job(&dir, vec![gene("G1", 1.0)])).unwrap();
        assert!(index_shard(job(&dir, vec![gene("G2", 1.0)])).is_err());

        let db = Database::open(&dir.path().join("genes").join("00000")).unwrap();
        assert!(db.document(&id_term("gene:g1:ds1")).is_some());
        assert!(db.document(&id_term("gene:g2:ds1")).is_none());
    }

    #[test]
    fn failed_commit_removes_the_shard() {
        let dir = TempDir::new().unwrap();
        let job = job(&dir, vec![gene("G1", 1.0), gene("G2", 2.0)]);
        let lock = Arc::clone(&job.commit_lock);
        // The segment cannot be written over a directory
        fs::create_dir_all(StorageLayout::new(&job.path).temp_segment_path()).unwrap();

        let err = index_shard(job).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.context.starts_with("shard genes-00000"));
        assert!(!dir.path().join("genes").join("00000").exists());
        assert!(!lock.is_locked());
    }
}
