use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Occurrences of one term inside one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermInfo {
    pub wdf: u32,             // Within-document frequency
    pub positions: Vec<u32>,  // Sorted, empty for position-free terms
}

/// A document under construction: terms, sortable value slots and an
/// opaque payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub terms: BTreeMap<String, TermInfo>,
    pub values: BTreeMap<u32, Vec<u8>>,
    pub data: Vec<u8>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Add a position-free occurrence of `term`.
    pub fn add_term(&mut self, term: &str, wdf_inc: u32) {
        let info = self.terms.entry(term.to_string()).or_default();
        info.wdf += wdf_inc;
    }

    /// Add an occurrence of `term` at `position`.
    pub fn add_posting(&mut self, term: &str, position: u32) {
        let info = self.terms.entry(term.to_string()).or_default();
        info.wdf += 1;
        if let Err(idx) = info.positions.binary_search(&position) {
            info.positions.insert(idx, position);
        }
    }

    /// Filter-only term: present but contributes no frequency.
    pub fn add_boolean_term(&mut self, term: &str) {
        self.terms.entry(term.to_string()).or_default();
    }

    pub fn add_value(&mut self, slot: u32, value: Vec<u8>) {
        self.values.insert(slot, value);
    }

    pub fn value(&self, slot: u32) -> Option<&[u8]> {
        self.values.get(&slot).map(Vec::as_slice)
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }
}
