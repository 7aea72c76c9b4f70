//! Global constants for the rust-uploader application.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

// Multipart upload constants
/// Default threshold above which files use multipart uploads (100MB)
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default multipart part size (10MB)
pub const DEFAULT_MULTIPART_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// S3 minimum part size for multipart uploads (5MB)
pub const S3_MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Default concurrent parts per multipart upload
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

// Retry and timeout constants
/// Default maximum retries beyond the first upload attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt transfer timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// Worker pool constants
/// Default concurrent file uploads within a directory task
pub const DEFAULT_PARALLEL_UPLOADS: usize = 2;

// File paths
/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
