use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use fst::Map;
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::transaction::{Transaction, TransactionOp};
use crate::core::types::DocId;
use crate::index::document::Document;
use crate::index::posting::PostingList;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentBody, SegmentBodyRef, StoredDocument};
use crate::storage::segment_reader::SegmentReader;
use crate::storage::segment_writer::{EncodedSegment, SegmentWriter};

/// In-memory contents of one index: documents keyed by number, the
/// identifier-term lookup, and metadata.
#[derive(Debug, Default)]
pub struct IndexState {
    documents: BTreeMap<DocId, StoredDocument>,
    by_id: HashMap<String, DocId>,
    next_doc_id: u32,
    metadata: BTreeMap<String, String>,
}

impl IndexState {
    pub fn new() -> Self {
        IndexState {
            next_doc_id: 1,
            ..Default::default()
        }
    }

    fn from_body(body: SegmentBody) -> Self {
        let mut state = IndexState::new();
        for stored in body.documents {
            state.next_doc_id = state.next_doc_id.max(stored.doc_id.0 + 1);
            state.by_id.insert(stored.id_term.clone(), stored.doc_id);
            state.documents.insert(stored.doc_id, stored);
        }
        state.metadata = body.metadata;
        state
    }

    /// Upsert: a document already filed under `id_term` is overwritten in
    /// place and keeps its number. Returns true when it replaced one.
    pub fn replace(&mut self, id_term: String, document: Document) -> bool {
        if let Some(&doc_id) = self.by_id.get(&id_term) {
            self.documents.insert(doc_id, StoredDocument { doc_id, id_term, document });
            return true;
        }

        let doc_id = DocId(self.next_doc_id);
        self.next_doc_id += 1;
        self.by_id.insert(id_term.clone(), doc_id);
        self.documents.insert(doc_id, StoredDocument { doc_id, id_term, document });
        false
    }

    fn apply(&mut self, op: TransactionOp) {
        match op {
            TransactionOp::Replace { id_term, document } => {
                self.replace(id_term, document);
            }
            TransactionOp::SetMetadata { key, value } => {
                self.metadata.insert(key, value);
            }
        }
    }

    /// Append `other` after this index, renumbering its documents. Later
    /// documents win on identifier clashes, as do later metadata values.
    pub fn absorb(&mut self, other: IndexState) {
        for (_, stored) in other.documents {
            self.replace(stored.id_term, stored.document);
        }
        self.metadata.extend(other.metadata);
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// Serialize and compress the current contents without copying them.
    fn encode(&self) -> Result<EncodedSegment> {
        let body = SegmentBodyRef::build(self.documents.values().collect(), &self.metadata)?;
        SegmentWriter::default().encode(&body)
    }
}

/// Writable handle on an index directory. Holds the directory's writer
/// lock until dropped.
pub struct WritableDatabase {
    layout: StorageLayout,
    _lock: FileLock,
    state: IndexState,
    transaction: Option<Transaction>,
}

impl WritableDatabase {
    /// Start a brand new index; fails if `dir` already holds one.
    pub fn create(dir: &Path) -> Result<Self> {
        let layout = StorageLayout::create(dir)?;
        let lock = FileLock::acquire(&layout)?;
        if layout.has_segment() {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("index already exists at {}", dir.display()),
            ));
        }

        Ok(WritableDatabase {
            layout,
            _lock: lock,
            state: IndexState::new(),
            transaction: None,
        })
    }

    /// Open the index in `dir`, creating an empty one if there is none.
    pub fn open(dir: &Path) -> Result<Self> {
        let layout = StorageLayout::create(dir)?;
        let lock = FileLock::acquire(&layout)?;

        let state = if layout.has_segment() {
            let (_reader, body) = SegmentReader::open(&layout)?;
            IndexState::from_body(body)
        } else {
            IndexState::new()
        };

        Ok(WritableDatabase {
            layout,
            _lock: lock,
            state,
            transaction: None,
        })
    }

    /// Create an index at `dir` holding `state`; used by compaction.
    pub fn create_from(dir: &Path, state: IndexState) -> Result<Self> {
        let mut db = WritableDatabase::create(dir)?;
        db.state = state;
        Ok(db)
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        if let Some(tx) = &self.transaction {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("transaction {} already in progress", tx.id),
            ));
        }
        self.transaction = Some(Transaction::begin());
        Ok(())
    }

    /// Apply the open transaction and persist the result.
    pub fn commit_transaction(&mut self) -> Result<Segment> {
        let segment = self.prepare_transaction()?;
        self.write_prepared(segment)
    }

    /// First half of `commit_transaction`: close the transaction, apply it
    /// and encode the new segment. Nothing is written to disk; if the
    /// prepared segment is never written the handle must be discarded.
    pub fn prepare_transaction(&mut self) -> Result<EncodedSegment> {
        let mut tx = self.transaction.take().ok_or_else(|| {
            Error::new(ErrorKind::InvalidState, "no transaction in progress".to_string())
        })?;

        let ops = tx.commit()?;
        debug!(tx = tx.id, ops = ops.len(), dir = %self.layout.base_dir().display(), "preparing commit");
        for op in ops {
            self.state.apply(op);
        }
        self.state.encode()
    }

    /// Second half of `commit_transaction`: write, fsync and rename.
    pub fn write_prepared(&self, segment: EncodedSegment) -> Result<Segment> {
        segment.write(&self.layout)
    }

    /// Drop the open transaction; the index is left as it was before it.
    pub fn cancel_transaction(&mut self) -> Result<()> {
        match self.transaction.take() {
            Some(mut tx) => {
                tx.rollback();
                Ok(())
            }
            None => Err(Error::new(ErrorKind::InvalidState, "no transaction in progress".to_string())),
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn replace_document(&mut self, id_term: &str, document: Document) -> Result<()> {
        self.write(TransactionOp::Replace {
            id_term: id_term.to_string(),
            document,
        })
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) -> Result<()> {
        self.write(TransactionOp::SetMetadata {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Committed metadata value; pending transaction writes are not visible.
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.state.metadata.get(key).map(String::as_str)
    }

    pub fn doc_count(&self) -> usize {
        self.state.doc_count()
    }

    /// Persist changes made outside a transaction.
    pub fn commit(&mut self) -> Result<Segment> {
        if let Some(tx) = &self.transaction {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("commit while transaction {} is open", tx.id),
            ));
        }
        self.state.encode()?.write(&self.layout)
    }

    fn write(&mut self, op: TransactionOp) -> Result<()> {
        match self.transaction.as_mut() {
            Some(tx) => tx.push(op),
            None => {
                self.state.apply(op);
                Ok(())
            }
        }
    }
}

/// Read-only handle on a committed index. The segment file stays open
/// for the life of the handle.
pub struct Database {
    _reader: SegmentReader,
    documents: Vec<StoredDocument>,
    by_id: HashMap<String, usize>,
    terms: Map<Vec<u8>>,
    postings: Vec<PostingList>,
    metadata: BTreeMap<String, String>,
}

impl Database {
    pub fn open(dir: &Path) -> Result<Self> {
        let (reader, body) = SegmentReader::open(&StorageLayout::new(dir))?;

        let terms = Map::new(body.terms)?;
        let by_id = body
            .documents
            .iter()
            .enumerate()
            .map(|(idx, d)| (d.id_term.clone(), idx))
            .collect();

        Ok(Database {
            _reader: reader,
            documents: body.documents,
            by_id,
            terms,
            postings: body.postings,
            metadata: body.metadata,
        })
    }

    /// True when `dir` holds a committed index.
    pub fn exists(dir: &Path) -> bool {
        StorageLayout::new(dir).has_segment()
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Document filed under identifier term `id_term`.
    pub fn document(&self, id_term: &str) -> Option<&StoredDocument> {
        self.by_id.get(id_term).map(|&idx| &self.documents[idx])
    }

    pub fn documents(&self) -> impl Iterator<Item = &StoredDocument> {
        self.documents.iter()
    }

    pub fn postlist(&self, term: &str) -> Option<&PostingList> {
        self.terms
            .get(term.as_bytes())
            .and_then(|idx| self.postings.get(idx as usize))
    }

    pub fn term_exists(&self, term: &str) -> bool {
        self.terms.contains_key(term.as_bytes())
    }

    /// Give up the file handle and keep the contents, for merging.
    pub fn into_state(self) -> IndexState {
        let body = SegmentBody {
            created_at: chrono::Utc::now(),
            documents: self.documents,
            terms: Vec::new(),
            postings: Vec::new(),
            metadata: self.metadata,
        };
        IndexState::from_body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc_with(term: &str, data: &str) -> Document {
        let mut doc = Document::new();
        doc.add_term(term, 1);
        doc.set_data(data.as_bytes().to_vec());
        doc
    }

    #[test]
    fn replace_keeps_one_document_per_identifier() {
        let dir = TempDir::new().unwrap();
        let mut db = WritableDatabase::create(dir.path()).unwrap();
        db.begin_transaction().unwrap();
        db.replace_document("Qgene:a:b", doc_with("first", "1")).unwrap();
        db.replace_document("Qgene:a:b", doc_with("second", "2")).unwrap();
        db.commit_transaction().unwrap();
        drop(db);

        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.doc_count(), 1);
        assert_eq!(db.document("Qgene:a:b").unwrap().document.data, b"2");
        assert!(db.term_exists("second"));
        assert!(!db.term_exists("first"));
    }

    #[test]
    fn cancelled_transaction_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let mut db = WritableDatabase::create(dir.path()).unwrap();
        db.begin_transaction().unwrap();
        db.replace_document("Qx", doc_with("x", "x")).unwrap();
        db.cancel_transaction().unwrap();
        assert_eq!(db.doc_count(), 0);
        assert!(!Database::exists(dir.path()));
    }

    #[test]
    fn prepared_commit_touches_disk_only_when_written() {
        let dir = TempDir::new().unwrap();
        let mut db = WritableDatabase::create(dir.path()).unwrap();
        db.begin_transaction().unwrap();
        db.replace_document("Qa", doc_with("a", "payload")).unwrap();

        let prepared = db.prepare_transaction().unwrap();
        assert!(!db.in_transaction());
        assert!(!Database::exists(dir.path()));

        let segment = db.write_prepared(prepared).unwrap();
        assert_eq!(segment.doc_count, 1);
        drop(db);
        assert_eq!(Database::open(dir.path()).unwrap().doc_count(), 1);
    }

    #[test]
    fn create_refuses_existing_index() {
        let dir = TempDir::new().unwrap();
        let mut db = WritableDatabase::create(dir.path()).unwrap();
        db.commit().unwrap();
        drop(db);

        let err = WritableDatabase::create(dir.path()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }

    #[test]
    fn second_writer_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _first = WritableDatabase::open(dir.path()).unwrap();
        assert!(WritableDatabase::open(dir.path()).is_err());
    }

    #[test]
    fn metadata_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut db = WritableDatabase::open(dir.path()).unwrap();
            db.set_metadata("generif-checksum", "abc").unwrap();
            db.commit().unwrap();
        }
        let mut db = WritableDatabase::open(dir.path()).unwrap();
        assert_eq!(db.get_metadata("generif-checksum"), Some("abc"));
        db.set_metadata("tables", "Geno").unwrap();
        db.commit().unwrap();
        drop(db);

        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.get_metadata("tables"), Some("Geno"));
        assert_eq!(db.get_metadata("generif-checksum"), Some("abc"));
    }

    #[test]
    fn postlists_follow_documents() {
        let dir = TempDir::new().unwrap();
        let mut db = WritableDatabase::create(dir.path()).unwrap();
        db.replace_document("Qa", doc_with("XSmouse", "a")).unwrap();
        db.replace_document("Qb", doc_with("XSmouse", "b")).unwrap();
        db.replace_document("Qc", doc_with("XSrat", "c")).unwrap();
        db.commit().unwrap();
        drop(db);

        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.postlist("XSmouse").unwrap().doc_freq(), 2);
        assert_eq!(db.postlist("XSrat").unwrap().doc_freq(), 1);
        assert!(db.postlist("XShuman").is_none());
    }

    #[test]
    fn corrupted_segment_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut db = WritableDatabase::create(dir.path()).unwrap();
        db.replace_document("Qa", doc_with("a", "payload")).unwrap();
        db.commit().unwrap();
        drop(db);

        let path = StorageLayout::new(dir.path()).segment_path();
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let err = Database::open(dir.path()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Corruption);
    }
}
