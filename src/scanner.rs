use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::FileEntry;

/// Errors produced while resolving an upload source into file entries.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("source is neither a file nor a directory: {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compiled form of one exclusion pattern.
///
/// A path is excluded when its base name matches the pattern with shell-glob
/// semantics, or when the pattern matches anywhere inside the full path
/// (`*pattern*`). Both tests are kept, and any matching pattern excludes.
struct ExcludePattern {
    name: Pattern,
    anywhere: Pattern,
}

/// Expands an upload source (file or directory) into transferable entries,
/// applying the configured exclusion patterns.
pub struct FileScanner {
    patterns: Vec<ExcludePattern>,
}

impl FileScanner {
    /// Build a scanner from raw glob strings. Patterns that fail to compile
    /// are logged and ignored rather than failing the whole run.
    pub fn new(exclude_patterns: &[String]) -> Self {
        let mut patterns = Vec::with_capacity(exclude_patterns.len());
        for raw in exclude_patterns {
            let name = Pattern::new(raw);
            let anywhere = Pattern::new(&format!("*{}*", raw));
            match (name, anywhere) {
                (Ok(name), Ok(anywhere)) => patterns.push(ExcludePattern { name, anywhere }),
                _ => warn!("Ignoring invalid exclude pattern: {}", raw),
            }
        }
        FileScanner { patterns }
    }

    /// Test a path against all exclusion patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let full_path = path.to_string_lossy();

        self.patterns.iter().any(|p| {
            p.name.matches(&file_name) || p.anywhere.matches(&full_path)
        })
    }

    /// Resolve a single-file source into exactly one entry.
    pub fn file_entry(&self, path: &Path) -> Result<FileEntry, ScanError> {
        let metadata = fs::metadata(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ScanError::NotAFile(path.to_path_buf()),
            _ => ScanError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        if !metadata.is_file() {
            return Err(ScanError::NotAFile(path.to_path_buf()));
        }

        let relative_path = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());

        Ok(FileEntry {
            path: path.to_path_buf(),
            size: metadata.len(),
            relative_path,
        })
    }

    /// Walk a directory source and yield non-excluded regular files.
    ///
    /// The returned iterator is lazy and single-pass. In recursive mode,
    /// excluded directories are pruned from the traversal entirely; their
    /// contents are never visited. Ordering within a directory follows the
    /// filesystem and is not guaranteed. Unreadable entries are logged and
    /// skipped without aborting the walk.
    pub fn scan<'a>(
        &'a self,
        root: &Path,
        recursive: bool,
    ) -> Result<Box<dyn Iterator<Item = FileEntry> + 'a>, ScanError> {
        let metadata = fs::metadata(root).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ScanError::InvalidSource(root.to_path_buf()),
            _ => ScanError::Io {
                path: root.to_path_buf(),
                source,
            },
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::InvalidSource(root.to_path_buf()));
        }

        debug!(
            "Scanning {} (recursive: {}, {} exclude patterns)",
            root.display(),
            recursive,
            self.patterns.len()
        );

        if recursive {
            Ok(Box::new(self.walk_recursive(root)))
        } else {
            Ok(Box::new(self.walk_flat(root)?))
        }
    }

    fn walk_recursive<'a>(&'a self, root: &Path) -> impl Iterator<Item = FileEntry> + 'a {
        let root_buf = root.to_path_buf();
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            // Depth 0 is the root itself; everything below is subject to
            // exclusion, which prunes whole subtrees before descent.
            .filter_entry(move |entry| entry.depth() == 0 || !self.is_excluded(entry.path()))
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry: {}", e);
                        return None;
                    }
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                let size = match entry.metadata() {
                    Ok(m) => m.len(),
                    Err(e) => {
                        warn!("Skipping {}: {}", entry.path().display(), e);
                        return None;
                    }
                };
                let relative_path = entry
                    .path()
                    .strip_prefix(&root_buf)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                Some(FileEntry {
                    path: entry.path().to_path_buf(),
                    size,
                    relative_path,
                })
            })
    }

    fn walk_flat<'a>(
        &'a self,
        root: &Path,
    ) -> Result<impl Iterator<Item = FileEntry> + 'a, ScanError> {
        let read_dir = fs::read_dir(root).map_err(|source| ScanError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        Ok(read_dir.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    return None;
                }
            };
            let path = entry.path();
            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    return None;
                }
            };
            if !metadata.is_file() || self.is_excluded(&path) {
                return None;
            }
            Some(FileEntry {
                size: metadata.len(),
                relative_path: PathBuf::from(entry.file_name()),
                path,
            })
        }))
    }
}
