//! Stable file identity.
//!
//! The import walk dedupes units by what file they actually are, not by the
//! path string used to reach them, so hardlinks and `dir/../dir` spellings
//! of the same file are visited once.

use std::fs;
use std::path::Path;

/// Identity key for a file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(FileIdInner);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FileIdInner {
    #[cfg(unix)]
    DevIno(u64, u64),
    Canonical(std::path::PathBuf),
}

impl FileId {
    /// Identity of the file at `path`, or `None` if it cannot be stat'ed.
    pub fn of(path: &Path) -> Option<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if let Ok(meta) = fs::metadata(path) {
                return Some(Self(FileIdInner::DevIno(meta.dev(), meta.ino())));
            }
        }
        fs::canonicalize(path)
            .ok()
            .map(|p| Self(FileIdInner::Canonical(p)))
    }
}
