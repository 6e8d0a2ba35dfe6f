use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn};
use uuid::Uuid;
use crate::build::change::Fingerprint;
use crate::build::publish::{ensure_empty, publish, Staging};
use crate::core::config::BuildConfig;
use crate::core::error::{Error, Result};
use crate::core::types::RecordKind;
use crate::parallel::indexer::{commit_lock, index_shard, CommitLock, ShardInfo, ShardJob};
use crate::parallel::merger::Compactor;
use crate::parallel::scheduler::WorkerPool;
use crate::source::RecordSource;
use crate::source::annotation::{AnnotationCache, AnnotationSource};
use crate::source::chunker::Chunker;
use crate::source::query::RecordQuery;

/// Per-kind totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindReport {
    pub shards: usize,
    pub records: usize,
    pub documents: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub kinds: BTreeMap<RecordKind, KindReport>,
    pub retries: u32,
    /// Documents in the published index.
    pub documents: usize,
    pub fingerprint: Fingerprint,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn kind(&self, kind: RecordKind) -> KindReport {
        self.kinds.get(&kind).cloned().unwrap_or_default()
    }

    pub fn shards(&self) -> usize {
        self.kinds.values().map(|k| k.shards).sum()
    }

    pub fn skipped(&self) -> usize {
        self.kinds.values().map(|k| k.skipped).sum()
    }
}

/// Where a kind's stream stands: rows handed to workers and the next
/// chunk number. A resume restarts the stream at `offset`.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    offset: u64,
    chunk: u64,
}

/// Why a streaming pass stopped early.
enum Interrupted {
    /// The record stream failed; may be resumable.
    Source(Error),
    /// A worker failed or could not be started; always fatal.
    Dispatch(Error),
}

/// Shared per-run state handed to every shard job.
struct RunContext {
    staging: Staging,
    annotations: Arc<AnnotationCache>,
    commit_lock: CommitLock,
}

/// Runs one complete build: fingerprint, stream and shard, compact,
/// publish.
pub struct IndexBuilder<'a> {
    config: BuildConfig,
    records: &'a mut dyn RecordSource,
    annotations: &'a dyn AnnotationSource,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        config: BuildConfig,
        records: &'a mut dyn RecordSource,
        annotations: &'a dyn AnnotationSource,
    ) -> Self {
        IndexBuilder {
            config: config.normalized(),
            records,
            annotations,
        }
    }

    /// Build and publish a new index at `dest`, which must be missing or
    /// empty. Nothing appears in `dest` unless the whole run succeeds.
    pub fn build(&mut self, dest: &Path) -> Result<BuildReport> {
        ensure_empty(dest)?;
        let staging = Staging::new(dest)?;
        self.build_in(staging, dest)
    }

    /// `build` using a caller-provided staging area, which is removed when
    /// the run ends either way.
    pub fn build_in(&mut self, staging: Staging, dest: &Path) -> Result<BuildReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("build", run = %run_id);
        let _entered = span.enter();
        let started_at = Utc::now();
        let clock = Instant::now();

        ensure_empty(dest)?;
        info!(
            dest = %dest.display(),
            staging = %staging.path().display(),
            batch_size = self.config.batch_size,
            workers = self.config.workers,
            "starting build"
        );

        // Taken before any records are read so changes made mid-build
        // show up on the next check
        let fingerprint = Fingerprint::compute(self.records, self.annotations)?;
        let annotations = Arc::new(self.annotations.annotations()?);
        info!(annotations = annotations.len(), tables = fingerprint.tables.len(), "fingerprint taken");

        let run = RunContext {
            staging,
            annotations,
            commit_lock: commit_lock(),
        };

        let mut pool = WorkerPool::new(self.config.workers);
        let mut retries = 0;
        for kind in RecordKind::ALL {
            retries += self.stream_kind(kind, &run, &mut pool)?;
        }
        let mut shards = pool.drain()?;
        shards.sort_by_key(|s| (s.kind, s.chunk));
        let kinds = summarize(&shards);

        let combined_path = run.staging.combined_path();
        let paths: Vec<PathBuf> = shards.iter().map(|s| s.path.clone()).collect();
        let mut combined = Compactor::new(self.config.merge_fan_in).compact(&paths, &combined_path)?;
        fingerprint.write_to(&mut combined)?;
        let documents = combined.doc_count();
        combined.commit()?;
        drop(combined);

        publish(&combined_path, dest)?;

        let report = BuildReport {
            run_id,
            started_at,
            kinds,
            retries,
            documents,
            fingerprint,
            elapsed: clock.elapsed(),
        };
        info!(
            shards = report.shards(),
            documents = report.documents,
            skipped = report.skipped(),
            retries = report.retries,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "build finished"
        );
        Ok(report)
    }

    /// Stream one record kind into shard jobs, resuming after transient
    /// source failures. Returns the number of resumes taken.
    fn stream_kind(&mut self, kind: RecordKind, run: &RunContext, pool: &mut WorkerPool<ShardInfo>) -> Result<u32> {
        let query = RecordQuery::for_kind(kind);
        let mut cursor = Cursor::default();
        let mut failures = 0u32;
        let mut retries = 0u32;

        loop {
            let chunks_before = cursor.chunk;
            let err = match self.stream_pass(&query, &mut cursor, run, pool) {
                Ok(()) => {
                    info!(%kind, records = cursor.offset, shards = cursor.chunk, "stream complete");
                    return Ok(retries);
                }
                Err(Interrupted::Dispatch(err)) => return Err(err),
                Err(Interrupted::Source(err)) if !err.is_transient() => return Err(err),
                Err(Interrupted::Source(err)) => err,
            };

            // Only consecutive failures without progress count against the limit
            if cursor.chunk > chunks_before {
                failures = 0;
            }
            failures += 1;
            if failures > self.config.retry.max_retries {
                return Err(err.within(&format!(
                    "{} stream failed {} times in a row",
                    kind, failures
                )));
            }

            let delay = self.config.retry.backoff(failures);
            warn!(
                %kind,
                offset = cursor.offset,
                attempt = failures,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "record stream interrupted, resuming"
            );
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            retries += 1;

            if let Err(err) = self.records.reconnect() {
                if !err.is_transient() {
                    return Err(err);
                }
                warn!(%kind, error = %err, "reconnect failed");
            }
        }
    }

    fn stream_pass(
        &mut self,
        query: &RecordQuery,
        cursor: &mut Cursor,
        run: &RunContext,
        pool: &mut WorkerPool<ShardInfo>,
    ) -> std::result::Result<(), Interrupted> {
        let stream = self
            .records
            .stream(query, cursor.offset)
            .map_err(Interrupted::Source)?;

        for batch in Chunker::new(stream, self.config.batch_size) {
            let records = batch.map_err(Interrupted::Source)?;
            let count = records.len() as u64;
            let job = ShardJob {
                kind: query.kind,
                chunk: cursor.chunk,
                path: run.staging.shard_path(query.kind, cursor.chunk),
                records,
                annotations: Arc::clone(&run.annotations),
                commit_lock: Arc::clone(&run.commit_lock),
            };

            pool.dispatch(job.label(), move || index_shard(job))
                .map_err(Interrupted::Dispatch)?;
            cursor.offset += count;
            cursor.chunk += 1;
        }
        Ok(())
    }
}

fn summarize(shards: &[ShardInfo]) -> BTreeMap<RecordKind, KindReport> {
    let mut kinds: BTreeMap<RecordKind, KindReport> =
        RecordKind::ALL.iter().map(|k| (*k, KindReport::default())).collect();
    for shard in shards {
        let entry = kinds.entry(shard.kind).or_default();
        entry.shards += 1;
        entry.records += shard.records;
        entry.documents += shard.documents;
        entry.skipped += shard.skipped;
    }
    for (kind, report) in &kinds {
        if report.skipped > 0 {
            warn!(%kind, skipped = report.skipped, "records without identifier skipped");
        }
    }
    kinds
}
