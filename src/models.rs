use std::path::{Path, PathBuf};

/// One file eligible for transfer, produced by the scanner.
///
/// `relative_path` is relative to the scan root and is what the destination
/// key is derived from; for a single-file source it is just the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub relative_path: PathBuf,
}

impl FileEntry {
    /// Base name of the file, for progress display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Destination object key: prefix + relative path, with path
    /// separators normalized to `/`.
    pub fn s3_key(&self, prefix: &str) -> String {
        let rel = self.relative_path.to_string_lossy().replace('\\', "/");
        format!("{}{}", prefix, rel)
    }
}

/// Result of one file's complete transfer attempt sequence.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file_path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn success(path: &Path) -> Self {
        UploadOutcome {
            file_path: path.to_path_buf(),
            success: true,
            error: None,
        }
    }

    pub fn failure(path: &Path, error: impl Into<String>) -> Self {
        UploadOutcome {
            file_path: path.to_path_buf(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_key_from_prefix_and_relative_path() {
        let entry = FileEntry {
            path: PathBuf::from("/data/logs/app/server.log"),
            size: 42,
            relative_path: PathBuf::from("app/server.log"),
        };
        assert_eq!(entry.s3_key("backups/"), "backups/app/server.log");
        assert_eq!(entry.s3_key(""), "app/server.log");
    }

    #[test]
    fn test_s3_key_normalizes_backslashes() {
        let entry = FileEntry {
            path: PathBuf::from("C:/data/app/server.log"),
            size: 1,
            relative_path: PathBuf::from(r"app\server.log"),
        };
        assert_eq!(entry.s3_key("pre/"), "pre/app/server.log");
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = UploadOutcome::success(Path::new("/tmp/a.txt"));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let bad = UploadOutcome::failure(Path::new("/tmp/a.txt"), "boom");
        assert!(!bad.success);
        assert_eq!(bad.error.as_deref(), Some("boom"));
    }
}
