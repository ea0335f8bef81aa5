//! Error types for script loading and effect management.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, resolving or compiling a script.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to read a script file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An `import` name did not resolve to a file
    #[error("{importer}: could not resolve import '{name}'")]
    ImportNotFound {
        /// Path of the file whose header declared the import.
        importer: PathBuf,
        /// The unresolved import name as written.
        name: String,
    },

    /// Import nesting exceeded the depth limit
    #[error("{importer}: too many import levels")]
    TooManyImportLevels {
        /// Path of the file at the depth limit.
        importer: PathBuf,
    },

    /// Preprocessing or section/header parsing failed
    #[error("{path}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        path: PathBuf,
        /// The parse-layer error.
        #[source]
        source: rsfx_lang::LangError,
    },

    /// The external compiler service rejected a section
    #[error("compile error in '{path}' ({section}): {message}")]
    Compile {
        /// Path of the unit the failing section came from.
        path: PathBuf,
        /// Section name, e.g. `@init`.
        section: String,
        /// Compiler diagnostic.
        message: String,
    },
}

impl EngineError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an unresolved-import error.
    pub fn import_not_found(importer: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        EngineError::ImportNotFound {
            importer: importer.into(),
            name: name.into(),
        }
    }

    /// Create a parse error for a specific file.
    pub fn parse(path: impl Into<PathBuf>, source: rsfx_lang::LangError) -> Self {
        EngineError::Parse {
            path: path.into(),
            source,
        }
    }
}
