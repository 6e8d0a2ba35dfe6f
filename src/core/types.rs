use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;

/// Internal document number inside one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

/// The two families of source rows that end up in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Gene,
    Phenotype,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Gene, RecordKind::Phenotype];

    /// Type tag used in document identifiers and the `XT` type term.
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Gene => "gene",
            RecordKind::Phenotype => "phenotype",
        }
    }

    /// Directory name for this kind's shards within a build.
    pub fn shard_dir(&self) -> &'static str {
        match self {
            RecordKind::Gene => "genes",
            RecordKind::Phenotype => "phenotypes",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// One source row. A field that is declared but NULL is kept as `None`
/// so the stored payload still shows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    pub fn with_null(mut self, name: &str) -> Self {
        self.set(name, None);
        self
    }

    pub fn set(&mut self, name: &str, value: Option<FieldValue>) {
        self.fields.insert(name.to_string(), value);
    }

    /// Present, non-NULL value of `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Present value rendered as non-empty text.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(FieldValue::as_text)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_fields_read_as_none() {
        let record = Record::new().with("name", "G1").with_null("mean");
        assert_eq!(record.text("name").as_deref(), Some("G1"));
        assert_eq!(record.number("mean"), None);
        assert_eq!(record.number("lrs"), None);
    }

    #[test]
    fn payload_keeps_null_fields() {
        let record = Record::new().with("name", "G1").with("mean", 5.2).with_null("chr");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"chr":null,"mean":5.2,"name":"G1"}"#);
    }

    #[test]
    fn integers_render_without_fraction() {
        let record = Record::new().with("name", 10001i64);
        assert_eq!(record.text("name").as_deref(), Some("10001"));
        assert_eq!(record.number("name"), Some(10001.0));
    }
}
