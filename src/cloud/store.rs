use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Callback invoked with byte deltas as a transfer makes progress.
///
/// May be called zero or more times per upload, possibly from multiple
/// concurrent part-upload futures for the same file.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Failure classes for a single store operation.
///
/// `Transient` failures are eligible for retry; everything else is
/// terminal for the file being transferred.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// The single seam the upload engine depends on: transfer one local file
/// to an object-storage destination.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        progress: Option<ProgressFn>,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(StoreError::Transient("socket closed".into()).is_transient());
        assert!(!StoreError::NotFound("/gone".into()).is_transient());
        assert!(!StoreError::PermissionDenied("/locked".into()).is_transient());
        assert!(!StoreError::Unexpected("bug".into()).is_transient());
    }
}
