use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use crate::core::types::DocId;
use crate::index::document::TermInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Term frequency in document
    pub positions: Vec<u32>,  // Token positions for phrase queries
}

/// Posting list for a term
/// Note: Sorted by doc_id for efficient merging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingList {
    pub postings: Vec<Posting>,  // Sorted by doc_id
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        // Keep sorted by doc_id for efficient merging
        match self.postings.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(pos) => {
                self.postings[pos] = posting;
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }
}

/// Invert per-document term maps into per-term posting lists.
pub fn invert<'a, I>(documents: I) -> BTreeMap<String, PostingList>
where
    I: IntoIterator<Item = (DocId, &'a BTreeMap<String, TermInfo>)>,
{
    let mut inverted: BTreeMap<String, PostingList> = BTreeMap::new();

    for (doc_id, terms) in documents {
        for (term, info) in terms {
            inverted
                .entry(term.clone())
                .or_insert_with(PostingList::new)
                .add_posting(Posting {
                    doc_id,
                    term_freq: info.wdf,
                    positions: info.positions.clone(),
                });
        }
    }

    inverted
}
