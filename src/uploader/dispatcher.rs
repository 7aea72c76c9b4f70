use std::sync::Arc;

use log::{error, info};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::FileEntry;
use crate::uploader::executor::UploadExecutor;

/// One unit of work for the dispatcher: a file and its destination.
pub type UploadJob = (FileEntry, String, String);

/// Runs executor invocations under a fixed concurrency cap.
pub struct ParallelDispatcher {
    executor: Arc<UploadExecutor>,
    workers: usize,
}

impl ParallelDispatcher {
    pub fn new(executor: Arc<UploadExecutor>, workers: usize) -> Self {
        ParallelDispatcher {
            executor,
            workers: workers.max(1),
        }
    }

    /// Upload every job, never more than `workers` at a time, and return
    /// `(successful, failed)` once all outcomes are in.
    ///
    /// Outcomes are drained in completion order, not submission order. A
    /// worker that panics outside the executor's own error capture counts
    /// as one failed file and does not disturb its siblings.
    pub async fn upload_all(&self, jobs: Vec<UploadJob>) -> (usize, usize) {
        let total = jobs.len();
        info!(
            "Starting parallel upload of {} files with {} workers",
            total, self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();

        for (entry, bucket, key) in jobs {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                executor.upload_file(&entry, &bucket, &key).await
            });
        }

        let mut successful = 0;
        let mut failed = 0;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(outcome) if outcome.success => successful += 1,
                Ok(_) => failed += 1,
                Err(e) => {
                    error!("Upload worker terminated abnormally: {}", e);
                    failed += 1;
                }
            }
        }

        (successful, failed)
    }
}
