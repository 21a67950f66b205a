//! Best-effort batch execution over a bounded worker pool.
//!
//! Each item runs start to finish on one blocking worker. Failures are
//! collected per item and never stop the batch; results come back in input
//! order regardless of completion order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::PipelineError;
use crate::types::{ImageFailure, ProgressEvent, ProgressFn};

/// An item that can be attributed to a file when it fails.
pub trait BatchItem: Send + 'static {
    fn path(&self) -> &Path;
}

/// Aggregate outcome of a batch.
#[derive(Debug)]
pub struct BatchReport<O> {
    /// Successful outputs, in input order
    pub succeeded: Vec<O>,
    /// Failures, in input order
    pub failed: Vec<ImageFailure>,
}

/// Run `f` over `items` with at most `workers` running at once.
pub async fn run_bounded<T, O, F>(
    stage: &'static str,
    items: Vec<T>,
    workers: usize,
    progress: Option<ProgressFn>,
    f: F,
) -> BatchReport<O>
where
    T: BatchItem,
    O: Send + 'static,
    F: Fn(T) -> Result<O, PipelineError> + Send + Sync + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let completed = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);
    let mut handles: Vec<(PathBuf, _)> = Vec::with_capacity(total);

    for item in items {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            tracing::warn!("{stage}: worker pool closed unexpectedly, stopping batch");
            break;
        };

        let path = item.path().to_path_buf();
        let f = f.clone();
        let completed = completed.clone();
        let progress = progress.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let result = f(item);
            drop(permit);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(progress) = progress {
                progress(ProgressEvent {
                    stage,
                    completed: done,
                    total,
                });
            }
            result
        });
        handles.push((path, handle));
    }

    let mut report = BatchReport {
        succeeded: Vec::with_capacity(handles.len()),
        failed: Vec::new(),
    };

    for (path, handle) in handles {
        match handle.await {
            Ok(Ok(output)) => report.succeeded.push(output),
            Ok(Err(e)) => {
                tracing::error!("Failed: {:?} - {}", path, e);
                report.failed.push(ImageFailure::new(path, stage, e.to_string()));
            }
            Err(e) => {
                tracing::error!("{stage} task panicked for {:?}: {e}", path);
                report
                    .failed
                    .push(ImageFailure::new(path, stage, format!("worker panicked: {e}")));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    struct Job {
        path: PathBuf,
        value: u32,
    }

    impl BatchItem for Job {
        fn path(&self) -> &Path {
            &self.path
        }
    }

    fn jobs(n: u32) -> Vec<Job> {
        (0..n)
            .map(|value| Job {
                path: PathBuf::from(format!("{value}.png")),
                value,
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_results_keep_input_order() {
        let report = run_bounded("test", jobs(8), 4, None, |job: Job| {
            // Later items finish first
            std::thread::sleep(Duration::from_millis(u64::from(8 - job.value) * 3));
            Ok(job.value)
        })
        .await;

        assert_eq!(report.succeeded, (0..8).collect::<Vec<_>>());
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_batch() {
        let report = run_bounded("pad", jobs(5), 2, None, |job: Job| {
            if job.value % 2 == 1 {
                Err(PipelineError::Pad {
                    path: job.path,
                    message: "boom".into(),
                })
            } else {
                Ok(job.value)
            }
        })
        .await;

        assert_eq!(report.succeeded, vec![0, 2, 4]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].path, PathBuf::from("1.png"));
        assert_eq!(report.failed[0].stage, "pad");
        assert_eq!(report.failed[1].path, PathBuf::from("3.png"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));
        let (flight, max) = (in_flight.clone(), max_seen.clone());

        run_bounded("test", jobs(12), 2, None, move |job: Job| {
            let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
            max.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            flight.fetch_sub(1, Ordering::SeqCst);
            Ok(job.value)
        })
        .await;

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_progress_reports_every_item() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |event| sink.lock().unwrap().push(event));

        run_bounded("restore", jobs(3), 1, Some(progress), |job: Job| Ok(job.value)).await;

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.stage == "restore" && e.total == 3));
        assert_eq!(events.iter().map(|e| e.completed).max(), Some(3));
    }
}
