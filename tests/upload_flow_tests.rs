//! Integration tests for the upload pipeline.
//!
//! These drive the public API end-to-end (config → task runner →
//! dispatcher → executor) against an in-memory object store, so no
//! network or credentials are involved.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use rust_uploader::cloud::store::{ObjectStore, ProgressFn, StoreError};
use rust_uploader::config::Config;
use rust_uploader::uploader::task_runner::TaskRunner;

/// In-memory store: records keys, counts calls, tracks concurrency, and
/// fails scripted keys.
struct FakeStore {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    keys: Mutex<Vec<String>>,
    fail_keys: HashSet<String>,
    delay: Duration,
}

impl FakeStore {
    fn new() -> Self {
        FakeStore {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
            fail_keys: HashSet::new(),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_on(mut self, keys: &[&str]) -> Self {
        self.fail_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn uploaded_keys(&self) -> Vec<String> {
        let mut keys = self.keys.lock().unwrap().clone();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put_file(
        &self,
        local_path: &Path,
        _bucket: &str,
        key: &str,
        progress: Option<ProgressFn>,
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_keys.contains(key) {
            return Err(StoreError::Transient("injected".into()));
        }

        if let Some(progress) = progress {
            let size = fs::metadata(local_path).map(|m| m.len()).unwrap_or(0);
            progress(size);
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

fn touch(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn load_config(yaml: &str) -> Config {
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_mixed_run_counts_only_enabled_tasks() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();
    touch(&data_dir, "one.txt", "1");
    touch(&data_dir, "two.txt", "22");
    let single = touch(temp_dir.path(), "single.csv", "a,b");

    let yaml = format!(
        r#"
upload_tasks:
  - name: directory
    source: {data}
    bucket: bucket
    s3_key_prefix: "data/"
  - name: single-file
    source: {single}
    bucket: bucket
    s3_key: "exports/single.csv"
  - name: switched-off
    source: {single}
    bucket: bucket
    s3_key: "never.csv"
    enabled: false
  - name: vanished
    source: {missing}
    bucket: bucket
    s3_key: "never.bin"
"#,
        data = data_dir.display(),
        single = single.display(),
        missing = temp_dir.path().join("missing.bin").display(),
    );

    let store = Arc::new(FakeStore::new());
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    // Three enabled tasks: the directory and single-file succeed, the
    // vanished source fails. The disabled task is invisible to counters.
    assert_eq!(successful + failed, 3);
    assert_eq!((successful, failed), (2, 1));
    assert_eq!(
        store.uploaded_keys(),
        vec!["data/one.txt", "data/two.txt", "exports/single.csv"]
    );
}

#[tokio::test]
async fn test_exclusion_scenario_from_config() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "a.txt", "a");
    touch(temp_dir.path(), "b.log", "b");
    touch(temp_dir.path(), "c.tmp", "c");

    let yaml = format!(
        r#"
options:
  exclude_patterns: ["*.tmp"]
upload_tasks:
  - name: logs
    source: {dir}
    bucket: bucket
    s3_key_prefix: ""
"#,
        dir = temp_dir.path().display(),
    );

    let store = Arc::new(FakeStore::new());
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    assert_eq!((successful, failed), (1, 0));
    assert_eq!(store.uploaded_keys(), vec!["a.txt", "b.log"]);
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_dry_run_never_touches_the_store() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "a.txt", "a");
    touch(temp_dir.path(), "b.txt", "b");

    let yaml = format!(
        r#"
options:
  dry_run: true
upload_tasks:
  - name: rehearsal
    source: {dir}
    bucket: bucket
    s3_key_prefix: "out/"
"#,
        dir = temp_dir.path().display(),
    );

    let store = Arc::new(FakeStore::new());
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    assert_eq!((successful, failed), (1, 0));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_parallelism_is_capped_by_config() {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..5 {
        touch(temp_dir.path(), &format!("f{}.bin", i), "x");
    }

    let yaml = format!(
        r#"
options:
  parallel_uploads: 2
upload_tasks:
  - name: burst
    source: {dir}
    bucket: bucket
    s3_key_prefix: "burst/"
"#,
        dir = temp_dir.path().display(),
    );

    let store = Arc::new(FakeStore::new().with_delay(Duration::from_millis(25)));
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    assert_eq!((successful, failed), (1, 0));
    assert_eq!(store.calls(), 5);
    assert!(
        store.high_water.load(Ordering::SeqCst) <= 2,
        "dispatcher exceeded the worker cap"
    );
}

#[tokio::test]
async fn test_empty_directory_task_is_vacuously_successful() {
    let temp_dir = TempDir::new().unwrap();

    let yaml = format!(
        r#"
upload_tasks:
  - name: nothing-to-do
    source: {dir}
    bucket: bucket
    s3_key_prefix: "void/"
"#,
        dir = temp_dir.path().display(),
    );

    let store = Arc::new(FakeStore::new());
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    assert_eq!((successful, failed), (1, 0));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_failed_file_fails_task_but_siblings_continue() {
    let temp_dir = TempDir::new().unwrap();
    let bad_dir = temp_dir.path().join("bad");
    let good_dir = temp_dir.path().join("good");
    fs::create_dir(&bad_dir).unwrap();
    fs::create_dir(&good_dir).unwrap();
    touch(&bad_dir, "poison.txt", "p");
    touch(&good_dir, "fine.txt", "f");

    let yaml = format!(
        r#"
options:
  max_retries: 0
upload_tasks:
  - name: doomed
    source: {bad}
    bucket: bucket
    s3_key_prefix: "bad/"
  - name: healthy
    source: {good}
    bucket: bucket
    s3_key_prefix: "good/"
"#,
        bad = bad_dir.display(),
        good = good_dir.display(),
    );

    let store = Arc::new(FakeStore::new().failing_on(&["bad/poison.txt"]));
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    assert_eq!((successful, failed), (1, 1));
    assert_eq!(store.uploaded_keys(), vec!["good/fine.txt"]);
}

#[tokio::test]
async fn test_recursive_directory_preserves_structure_in_keys() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    touch(temp_dir.path(), "root.txt", "r");
    touch(&nested, "leaf.txt", "l");

    let yaml = format!(
        r#"
upload_tasks:
  - name: tree
    source: {dir}
    bucket: bucket
    s3_key_prefix: "tree/"
    recursive: true
"#,
        dir = temp_dir.path().display(),
    );

    let store = Arc::new(FakeStore::new());
    let runner = TaskRunner::new(store.clone(), &load_config(&yaml));
    let (successful, failed) = runner.run_all().await;

    assert_eq!((successful, failed), (1, 0));
    assert_eq!(store.uploaded_keys(), vec!["tree/a/b/leaf.txt", "tree/root.txt"]);
}
