use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub batch_size: usize,          // Records per shard
    pub workers: usize,             // Max shard workers in flight
    pub merge_fan_in: usize,        // Inputs merged together per compaction pass
    pub retry: RetryPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            batch_size: 100_000,
            workers: num_cpus::get(),
            merge_fan_in: 8,
            retry: RetryPolicy::default(),
        }
    }
}

impl BuildConfig {
    /// Clamp values that would stall the pipeline.
    pub fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.workers = self.workers.max(1);
        self.merge_fan_in = self.merge_fan_in.max(2);
        self
    }
}

/// Reconnect policy for a data source that drops mid-stream.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,           // Consecutive failures tolerated
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before the `attempt`-th retry (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}
