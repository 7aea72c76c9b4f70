use std::sync::Arc;

use log::{error, info, warn};
use tokio::time::sleep;

use crate::cloud::store::{ObjectStore, ProgressFn, StoreError};
use crate::config::UploadOptions;
use crate::models::{FileEntry, UploadOutcome};
use crate::progress::ProgressAggregator;
use crate::uploader::retry::{RetryDecision, RetryPolicy};

/// Executes one file transfer with retry and backoff.
///
/// Every failure mode is captured into the returned outcome; nothing
/// escapes this boundary.
pub struct UploadExecutor {
    store: Arc<dyn ObjectStore>,
    policy: RetryPolicy,
    dry_run: bool,
    enable_progress: bool,
    progress: ProgressAggregator,
}

impl UploadExecutor {
    pub fn new(store: Arc<dyn ObjectStore>, options: &UploadOptions) -> Self {
        UploadExecutor {
            store,
            policy: RetryPolicy::new(options.max_retries),
            dry_run: options.dry_run,
            enable_progress: options.enable_progress,
            progress: ProgressAggregator::new(),
        }
    }

    /// Transfer one file, producing exactly one outcome.
    pub async fn upload_file(&self, entry: &FileEntry, bucket: &str, key: &str) -> UploadOutcome {
        if self.dry_run {
            info!(
                "[DRY RUN] Would upload {} to s3://{}/{}",
                entry.path.display(),
                bucket,
                key
            );
            return UploadOutcome::success(&entry.path);
        }

        let mut attempt: u32 = 0;
        loop {
            match self.attempt_upload(entry, bucket, key).await {
                Ok(()) => {
                    info!(
                        "Successfully uploaded {} to s3://{}/{}",
                        entry.path.display(),
                        bucket,
                        key
                    );
                    return UploadOutcome::success(&entry.path);
                }
                Err(err) => match self.policy.decide(attempt, &err) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            "Upload failed (attempt {}/{}), retrying in {}s: {}: {}",
                            attempt + 1,
                            self.policy.total_attempts(),
                            delay.as_secs(),
                            entry.path.display(),
                            err
                        );
                        sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => {
                        error!(
                            "Upload failed after {} attempt(s): {}: {}",
                            attempt + 1,
                            entry.path.display(),
                            err
                        );
                        return UploadOutcome::failure(&entry.path, err.to_string());
                    }
                },
            }
        }
    }

    /// Number of trackers currently registered. Exposed so callers can
    /// observe that completed transfers release their progress state.
    pub fn active_trackers(&self) -> usize {
        self.progress.active_count()
    }

    async fn attempt_upload(
        &self,
        entry: &FileEntry,
        bucket: &str,
        key: &str,
    ) -> Result<(), StoreError> {
        let tracker = if self.enable_progress {
            Some(self.progress.create(&entry.path, entry.size, &entry.name()))
        } else {
            None
        };

        let callback: Option<ProgressFn> = tracker.as_ref().map(|tracker| {
            let tracker = Arc::clone(tracker);
            Arc::new(move |delta: u64| tracker.add_bytes(delta)) as ProgressFn
        });

        let result = self.store.put_file(&entry.path, bucket, key, callback).await;

        if let Some(tracker) = &tracker {
            if result.is_ok() {
                tracker.complete();
            }
            // The attempt is over either way; a retried attempt starts
            // with a fresh tracker, so the registry cannot grow across a
            // long directory upload.
            self.progress.remove(&entry.path);
        }

        result
    }
}
