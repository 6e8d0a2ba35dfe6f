pub mod annotation;
pub mod chunker;
pub mod memory;
pub mod mysql;
pub mod query;
pub mod sparql;

use crate::core::error::Result;
use crate::core::types::Record;
use crate::source::query::RecordQuery;

/// Records in query order. An `Err` item ends the stream.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record>>>;

/// Checksum of one watched table; `None` when the server has none (missing table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableChecksum {
    pub table: String,
    pub checksum: Option<String>,
}

impl TableChecksum {
    pub fn new(table: &str, checksum: Option<String>) -> Self {
        TableChecksum {
            table: table.to_string(),
            checksum,
        }
    }

    pub fn render(&self) -> &str {
        self.checksum.as_deref().unwrap_or("NULL")
    }
}

/// The relational collaborator: streamed record queries plus table checksums.
pub trait RecordSource {
    /// Stream `query` starting after the first `offset` rows.
    fn stream(&mut self, query: &RecordQuery, offset: u64) -> Result<RecordStream>;

    /// Drop the current connection and open a fresh one.
    fn reconnect(&mut self) -> Result<()>;

    fn table_checksums(&mut self, tables: &[String]) -> Result<Vec<TableChecksum>>;
}
