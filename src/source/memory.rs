use std::collections::{BTreeMap, HashMap};
use crate::core::error::{Error, Result};
use crate::core::types::{Record, RecordKind};
use crate::source::query::RecordQuery;
use crate::source::{RecordSource, RecordStream, TableChecksum};

/// Planned disconnect: the next `times` streams fail after yielding
/// `after` records each.
#[derive(Debug, Clone, Copy)]
struct Disconnect {
    after: u64,
    times: usize,
}

/// Record source backed by in-memory rows, with call counters and
/// disconnect injection for exercising the build pipeline.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: HashMap<RecordKind, Vec<Record>>,
    checksums: BTreeMap<String, String>,
    disconnect: Option<Disconnect>,
    /// `(kind, offset)` of every stream opened, in order.
    pub streams: Vec<(RecordKind, u64)>,
    pub reconnects: usize,
    pub checksum_queries: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn with_records(mut self, kind: RecordKind, records: Vec<Record>) -> Self {
        self.records.insert(kind, records);
        self
    }

    pub fn with_checksum(mut self, table: &str, checksum: &str) -> Self {
        self.set_checksum(table, checksum);
        self
    }

    pub fn set_checksum(&mut self, table: &str, checksum: &str) {
        self.checksums.insert(table.to_string(), checksum.to_string());
    }

    /// Make the next `times` streams fail with a disconnect after `after` records.
    pub fn disconnect_after(mut self, after: u64, times: usize) -> Self {
        self.disconnect = Some(Disconnect { after, times });
        self
    }

    /// Number of streams opened (first attempts and resumes).
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Any interaction at all with this source.
    pub fn touched(&self) -> bool {
        !self.streams.is_empty() || self.reconnects > 0 || self.checksum_queries > 0
    }

    fn take_disconnect(&mut self) -> Option<u64> {
        let planned = self.disconnect.as_mut().filter(|d| d.times > 0)?;
        planned.times -= 1;
        Some(planned.after)
    }
}

impl RecordSource for MemorySource {
    fn stream(&mut self, query: &RecordQuery, offset: u64) -> Result<RecordStream> {
        self.streams.push((query.kind, offset));

        let rows: Vec<Record> = self
            .records
            .get(&query.kind)
            .map(|rows| rows.iter().skip(offset as usize).cloned().collect())
            .unwrap_or_default();

        match self.take_disconnect() {
            Some(after) => {
                let kind = query.kind;
                let head: Vec<Result<Record>> =
                    rows.into_iter().take(after as usize).map(Ok).collect();
                let failure = std::iter::once(Err(Error::disconnected(format!(
                    "{} stream dropped after {} records",
                    kind, after
                ))));
                Ok(Box::new(head.into_iter().chain(failure)))
            }
            None => Ok(Box::new(rows.into_iter().map(Ok))),
        }
    }

    fn reconnect(&mut self) -> Result<()> {
        self.reconnects += 1;
        Ok(())
    }

    fn table_checksums(&mut self, tables: &[String]) -> Result<Vec<TableChecksum>> {
        self.checksum_queries += 1;
        Ok(tables
            .iter()
            .map(|table| TableChecksum::new(table, self.checksums.get(table).cloned()))
            .collect())
    }
}
