use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{Span, debug};
use tracing_futures::Instrument;

/// Bounded pool for blocking work such as chart rendering.
///
/// At most `size` jobs run on the blocking threads at once; the rest wait for
/// a permit without holding up the event loop.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `job` on a blocking thread once a slot is free.
    pub async fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let span = Span::current();

        async move {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .context("worker pool closed")?;
            debug!(available = self.permits.available_permits(), "worker slot acquired");

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job()
            });

            handle.await.context("worker job panicked")
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[tokio::test]
    async fn returns_the_job_result() {
        let pool = WorkerPool::new(2);
        let value = pool.run(|| 6 * 7).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_its_size() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..6)
            .map(|_| {
                let pool = pool.clone();
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    pool.run(move || {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(30));
                        running.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                })
            })
            .collect();

        for job in jobs {
            job.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.size(), 2);
    }

    #[tokio::test]
    async fn panics_become_errors() {
        let pool = WorkerPool::new(1);
        let result: Result<()> = pool.run(|| panic!("boom")).await;
        assert!(result.is_err());

        // The permit came back.
        assert_eq!(pool.run(|| 1).await.unwrap(), 1);
    }
}
