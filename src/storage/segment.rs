use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use fst::MapBuilder;
use serde::{Deserialize, Serialize};
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::document::Document;
use crate::index::posting::{invert, PostingList};

/// Segment file header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHeader {
    pub version: u32,     // Format version
    pub doc_count: u32,   // Number of documents
    pub checksum: u32,    // CRC32 of the (compressed) body
    pub compression: CompressionType,
    pub body_len: u64,    // Compressed body length in bytes
    pub raw_len: u64,     // Body length before compression
}

impl SegmentHeader {
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 32; // Fixed header size

    pub fn new(doc_count: u32, checksum: u32, compression: CompressionType, body_len: u64, raw_len: u64) -> Self {
        SegmentHeader {
            version: Self::VERSION,
            doc_count,
            checksum,
            compression,
            body_len,
            raw_len,
        }
    }
}

/// A document as persisted: its number, the identifier term it was
/// upserted under, and its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub doc_id: DocId,
    pub id_term: String,
    pub document: Document,
}

/// Everything after the header: documents, postings with their term
/// dictionary, and string metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentBody {
    pub created_at: DateTime<Utc>,
    pub documents: Vec<StoredDocument>,   // Sorted by doc_id
    pub terms: Vec<u8>,                   // FST: term -> index into `postings`
    pub postings: Vec<PostingList>,
    pub metadata: BTreeMap<String, String>,
}

impl SegmentBody {
    pub fn doc_count(&self) -> u32 {
        self.documents.len() as u32
    }
}

/// Borrowed view of a `SegmentBody` for writing. Field order matches, so
/// it serializes to bytes that deserialize as a `SegmentBody`; documents
/// and metadata are not copied.
#[derive(Debug, Serialize)]
pub struct SegmentBodyRef<'a> {
    pub created_at: DateTime<Utc>,
    pub documents: Vec<&'a StoredDocument>,   // Sorted by doc_id
    pub terms: Vec<u8>,
    pub postings: Vec<PostingList>,
    pub metadata: &'a BTreeMap<String, String>,
}

impl<'a> SegmentBodyRef<'a> {
    pub fn build(documents: Vec<&'a StoredDocument>, metadata: &'a BTreeMap<String, String>) -> Result<Self> {
        let inverted = invert(documents.iter().map(|d| (d.doc_id, &d.document.terms)));

        // BTreeMap iteration is already in lexicographic byte order
        let mut builder = MapBuilder::memory();
        let mut postings = Vec::with_capacity(inverted.len());
        for (idx, (term, list)) in inverted.into_iter().enumerate() {
            builder.insert(term.as_bytes(), idx as u64)?;
            postings.push(list);
        }

        Ok(SegmentBodyRef {
            created_at: Utc::now(),
            documents,
            terms: builder.into_inner()?,
            postings,
            metadata,
        })
    }

    pub fn doc_count(&self) -> u32 {
        self.documents.len() as u32
    }
}

/// Summary of a written segment
#[derive(Debug, Clone)]
pub struct Segment {
    pub doc_count: u32,
    pub size_bytes: u64,
}

pub fn corrupt(context: impl Into<String>) -> Error {
    Error::new(ErrorKind::Corruption, context.into())
}
