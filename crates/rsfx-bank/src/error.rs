//! Error types for bank persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing preset banks or host state.
///
/// Reading has no error type: a missing or corrupt bank file loads as "no
/// bank" by design.
#[derive(Debug, Error)]
pub enum BankError {
    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize host state to JSON
    #[error("failed to serialize host state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BankError {
    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BankError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BankError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
