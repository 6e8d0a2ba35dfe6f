use std::path::{Path, PathBuf};
use rayon::prelude::*;
use tracing::{debug, info};
use crate::core::database::{Database, IndexState, WritableDatabase};
use crate::core::error::Result;
use crate::storage::rlimit::raise_open_file_limit;

/// Descriptors kept free beyond one per input shard.
const FD_MARGIN: u64 = 64;

/// Merges a run's shards into one index.
pub struct Compactor {
    pub fan_in: usize,
}

impl Compactor {
    pub fn new(fan_in: usize) -> Self {
        Compactor {
            fan_in: fan_in.max(2),
        }
    }

    /// Merge `shards` (in order; later shards win on identifier clashes)
    /// into a new index at `dest`. The result is returned uncommitted so
    /// the caller can add metadata before the single write.
    pub fn compact(&self, shards: &[PathBuf], dest: &Path) -> Result<WritableDatabase> {
        raise_open_file_limit(shards.len() as u64 + FD_MARGIN)?;

        // Every input is opened (and verified) before any merging starts
        let databases = shards
            .iter()
            .map(|path| Database::open(path))
            .collect::<Result<Vec<_>>>()?;
        let input_docs: usize = databases.iter().map(Database::doc_count).sum();
        info!(shards = databases.len(), documents = input_docs, "compacting shards");

        let mut level: Vec<IndexState> = databases.into_iter().map(Database::into_state).collect();
        let mut pass = 0;
        while level.len() > 1 {
            pass += 1;
            level = level
                .into_par_iter()
                .chunks(self.fan_in)
                .map(merge_group)
                .collect();
            debug!(pass, remaining = level.len(), "merge pass done");
        }

        let merged = level.pop().unwrap_or_else(IndexState::new);
        info!(documents = merged.doc_count(), passes = pass, "compaction merged");
        WritableDatabase::create_from(dest, merged)
    }
}

fn merge_group(group: Vec<IndexState>) -> IndexState {
    group.into_iter().fold(IndexState::new(), |mut merged, state| {
        merged.absorb(state);
        merged
    })
}
