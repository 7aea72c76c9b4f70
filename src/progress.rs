use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info};

/// Byte-level progress for one in-flight upload.
///
/// Chunk callbacks may arrive concurrently from multiple part-upload
/// futures for the same file, so the uploaded counter is atomic. The
/// counter only ever grows; each delta is merged exactly once.
pub struct ProgressTracker {
    filename: String,
    total_size: u64,
    uploaded: AtomicU64,
    start: Instant,
}

impl ProgressTracker {
    pub fn new(filename: impl Into<String>, total_size: u64) -> Self {
        ProgressTracker {
            filename: filename.into(),
            total_size,
            uploaded: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    /// Merge one transferred chunk into the counter.
    pub fn add_bytes(&self, delta: u64) {
        let uploaded = self.uploaded.fetch_add(delta, Ordering::SeqCst) + delta;
        if self.total_size > 0 {
            debug!(
                "{}: {:.1}% ({}/{} bytes)",
                self.filename,
                (uploaded as f64 / self.total_size as f64) * 100.0,
                uploaded,
                self.total_size
            );
        }
    }

    pub fn uploaded(&self) -> u64 {
        self.uploaded.load(Ordering::SeqCst)
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Completion percentage, zero for empty files.
    pub fn percent(&self) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        (self.uploaded() as f64 / self.total_size as f64) * 100.0
    }

    /// Average transfer rate so far, zero before any bytes have moved.
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.uploaded() as f64 / elapsed
    }

    /// Estimated seconds remaining, zero while the rate is still unknown.
    pub fn eta_secs(&self) -> f64 {
        let rate = self.throughput_bytes_per_sec();
        if rate <= 0.0 {
            return 0.0;
        }
        (self.total_size.saturating_sub(self.uploaded())) as f64 / rate
    }

    /// Emit the final summary for this file. Terminal: no further byte
    /// counts are merged after completion.
    pub fn complete(&self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let throughput = if elapsed > 0.0 {
            self.total_size as f64 / elapsed / 1024.0 / 1024.0
        } else {
            0.0
        };
        info!(
            "{}: complete ({} bytes in {:.1}s, {:.2} MB/s)",
            self.filename, self.total_size, elapsed, throughput
        );
    }
}

/// Registry mapping each active upload to its tracker.
///
/// Removal is the only way a tracker is released; entries for files that
/// have not finished must stay in the map.
#[derive(Default)]
pub struct ProgressAggregator {
    trackers: Mutex<HashMap<PathBuf, Arc<ProgressTracker>>>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, path: &Path, total_size: u64, filename: &str) -> Arc<ProgressTracker> {
        let tracker = Arc::new(ProgressTracker::new(filename, total_size));
        self.trackers
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Arc::clone(&tracker));
        tracker
    }

    pub fn get(&self, path: &Path) -> Option<Arc<ProgressTracker>> {
        self.trackers.lock().unwrap().get(path).cloned()
    }

    pub fn remove(&self, path: &Path) {
        self.trackers.lock().unwrap().remove(path);
    }

    pub fn active_count(&self) -> usize {
        self.trackers.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_chunk_merges_are_not_lost() {
        let tracker = Arc::new(ProgressTracker::new("big.bin", 10_000));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.add_bytes(10);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.uploaded(), 10_000);
        assert!((tracker.percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percent_guards_empty_file() {
        let tracker = ProgressTracker::new("empty", 0);
        assert_eq!(tracker.percent(), 0.0);
    }

    #[test]
    fn test_eta_is_zero_before_any_bytes() {
        let tracker = ProgressTracker::new("pending", 1024);
        assert_eq!(tracker.eta_secs(), 0.0);
        assert_eq!(tracker.throughput_bytes_per_sec(), 0.0);
    }

    #[test]
    fn test_eta_shrinks_with_progress() {
        let tracker = ProgressTracker::new("half", 1000);
        thread::sleep(std::time::Duration::from_millis(10));
        tracker.add_bytes(500);
        let eta = tracker.eta_secs();
        assert!(eta > 0.0);

        tracker.add_bytes(500);
        // Fully uploaded: nothing remains regardless of rate.
        assert_eq!(tracker.eta_secs(), 0.0);
    }

    #[test]
    fn test_complete_logs_without_panicking() {
        let tracker = ProgressTracker::new("done.bin", 2048);
        tracker.add_bytes(2048);
        tracker.complete();
        tracker.complete();
    }

    #[test]
    fn test_aggregator_create_get_remove() {
        let aggregator = ProgressAggregator::new();
        let path = Path::new("/tmp/file.bin");

        let tracker = aggregator.create(path, 100, "file.bin");
        tracker.add_bytes(40);

        let looked_up = aggregator.get(path).unwrap();
        assert_eq!(looked_up.uploaded(), 40);
        assert_eq!(aggregator.active_count(), 1);

        aggregator.remove(path);
        assert!(aggregator.get(path).is_none());
        assert_eq!(aggregator.active_count(), 0);
    }

    #[test]
    fn test_aggregator_remove_is_idempotent() {
        let aggregator = ProgressAggregator::new();
        aggregator.remove(Path::new("/never/created"));
        assert_eq!(aggregator.active_count(), 0);
    }
}
