use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use crate::cloud::store::ObjectStore;
use crate::config::{Config, UploadTask};
use crate::scanner::{FileScanner, ScanError};
use crate::uploader::dispatcher::{ParallelDispatcher, UploadJob};
use crate::uploader::executor::UploadExecutor;

/// Drives the configured task list end-to-end.
///
/// Failures recover at the smallest enclosing boundary: a failed file
/// fails its task, a failed task is counted and logged, and the run
/// always finishes with the aggregate counters.
pub struct TaskRunner {
    scanner: FileScanner,
    executor: Arc<UploadExecutor>,
    dispatcher: ParallelDispatcher,
    tasks: Vec<UploadTask>,
}

impl TaskRunner {
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        let executor = Arc::new(UploadExecutor::new(store, &config.options));
        let dispatcher =
            ParallelDispatcher::new(Arc::clone(&executor), config.options.parallel_uploads);
        TaskRunner {
            scanner: FileScanner::new(&config.options.exclude_patterns),
            executor,
            dispatcher,
            tasks: config.upload_tasks.clone(),
        }
    }

    /// Run every enabled task in declaration order and return
    /// `(successful_tasks, failed_tasks)`.
    pub async fn run_all(&self) -> (usize, usize) {
        let total = self.tasks.len();
        info!("Starting upload tasks: {} tasks to process", total);

        let mut successful_tasks = 0;
        let mut failed_tasks = 0;

        for (i, task) in self.tasks.iter().enumerate() {
            let index = i + 1;
            if !task.enabled {
                info!("Skipping disabled task: {}", task.name);
                continue;
            }

            info!("Task {}/{}: starting '{}'", index, total, task.name);
            if self.run_task(task).await {
                successful_tasks += 1;
                info!("Task {}/{}: '{}' completed successfully", index, total, task.name);
            } else {
                failed_tasks += 1;
                error!("Task {}/{}: '{}' failed", index, total, task.name);
            }
        }

        info!(
            "Upload tasks completed: {} successful, {} failed",
            successful_tasks, failed_tasks
        );
        (successful_tasks, failed_tasks)
    }

    async fn run_task(&self, task: &UploadTask) -> bool {
        if task.bucket.trim().is_empty() {
            error!("Task '{}' has no bucket configured", task.name);
            return false;
        }

        // The source's filesystem kind decides the route, at run time
        // rather than declaration time.
        let source = Path::new(&task.source);
        if source.is_file() {
            self.upload_single_file(task).await
        } else if source.is_dir() {
            self.upload_directory(task).await
        } else {
            error!(
                "Task '{}': {}",
                task.name,
                ScanError::InvalidSource(source.to_path_buf())
            );
            false
        }
    }

    async fn upload_single_file(&self, task: &UploadTask) -> bool {
        let key = match task.s3_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None => {
                error!("s3_key is required for file upload: {}", task.name);
                return false;
            }
        };

        match self.scanner.file_entry(Path::new(&task.source)) {
            Ok(entry) => {
                self.executor
                    .upload_file(&entry, &task.bucket, key)
                    .await
                    .success
            }
            Err(e) => {
                error!("Error uploading file {}: {}", task.source, e);
                false
            }
        }
    }

    async fn upload_directory(&self, task: &UploadTask) -> bool {
        let prefix = task.s3_key_prefix.as_deref().unwrap_or("");

        let jobs: Vec<UploadJob> = match self.scanner.scan(Path::new(&task.source), task.recursive)
        {
            Ok(entries) => entries
                .map(|entry| {
                    let key = entry.s3_key(prefix);
                    (entry, task.bucket.clone(), key)
                })
                .collect(),
            Err(e) => {
                error!("Error scanning directory {}: {}", task.source, e);
                return false;
            }
        };

        if jobs.is_empty() {
            warn!("No files found in {}", task.source);
            return true;
        }

        let (successful, failed) = self.dispatcher.upload_all(jobs).await;
        info!(
            "Directory upload completed: {} successful, {} failed",
            successful, failed
        );
        failed == 0
    }
}
