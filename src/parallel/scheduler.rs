use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};

struct InFlight<T> {
    label: String,
    handle: JoinHandle<Result<T>>,
}

/// Bounded set of worker threads. Dispatch blocks on the oldest worker
/// once `capacity` are running; completion order is not tracked.
pub struct WorkerPool<T> {
    capacity: usize,
    in_flight: VecDeque<InFlight<T>>,
    completed: Vec<T>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(capacity: usize) -> Self {
        WorkerPool {
            capacity: capacity.max(1),
            in_flight: VecDeque::new(),
            completed: Vec::new(),
        }
    }

    /// Start `job` on its own thread, first joining the oldest worker if
    /// the pool is full. A failure of that worker is returned here.
    pub fn dispatch<F>(&mut self, label: String, job: F) -> Result<()>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        while self.in_flight.len() >= self.capacity {
            self.join_oldest()?;
        }

        let handle = thread::Builder::new().name(label.clone()).spawn(job)?;
        debug!(worker = %label, in_flight = self.in_flight.len() + 1, "dispatched");
        self.in_flight.push_back(InFlight { label, handle });
        Ok(())
    }

    /// Join every remaining worker and return all outputs.
    pub fn drain(mut self) -> Result<Vec<T>> {
        while !self.in_flight.is_empty() {
            self.join_oldest()?;
        }
        Ok(std::mem::take(&mut self.completed))
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn join_oldest(&mut self) -> Result<()> {
        let Some(worker) = self.in_flight.pop_front() else {
            return Ok(());
        };
        let output = match worker.handle.join() {
            Ok(result) => result.map_err(|e| e.within(&worker.label))?,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                return Err(Error::new(
                    ErrorKind::Worker,
                    format!("{} panicked: {}", worker.label, reason),
                ));
            }
        };
        self.completed.push(output);
        Ok(())
    }
}

impl<T> Drop for WorkerPool<T> {
    // Never leave workers running past the pool, even on an error path
    fn drop(&mut self) {
        for worker in self.in_flight.drain(..) {
            let _ = worker.handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn never_exceeds_capacity_and_loses_nothing() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(3);

        for i in 0..12usize {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.dispatch(format!("job-{}", i), move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            })
            .unwrap();
            assert!(pool.in_flight() <= 3);
        }

        let mut outputs = pool.drain().unwrap();
        outputs.sort();
        assert_eq!(outputs, (0..12).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn worker_error_surfaces_on_drain() {
        let mut pool = WorkerPool::new(2);
        pool.dispatch("ok".into(), || Ok(1)).unwrap();
        pool.dispatch("bad".into(), || {
            Err(Error::new(ErrorKind::Io, "disk full".into()))
        })
        .unwrap();

        let err = pool.drain().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.context, "bad: disk full");
    }

    #[test]
    fn panic_becomes_worker_error() {
        let mut pool: WorkerPool<()> = WorkerPool::new(1);
        pool.dispatch("boom".into(), || panic!("shard exploded")).unwrap();
        let err = pool.drain().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Worker);
        assert!(err.context.contains("shard exploded"));
    }
}
