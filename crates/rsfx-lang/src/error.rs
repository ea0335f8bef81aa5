//! Error types for script parsing and preprocessing.

use thiserror::Error;

/// Errors produced while preprocessing or parsing script text.
///
/// Every variant carries the 0-based line number in the original source
/// where the problem was found, so hosts can point at the offending line
/// even after sections have been concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LangError {
    /// A `@name` line whose name is not one of the recognized sections.
    #[error("line {line}: invalid section: {text}")]
    UnrecognizedSection {
        /// 0-based source line of the offending tag.
        line: u32,
        /// The full offending line.
        text: String,
    },

    /// Meta-code inside `<? ?>` failed to evaluate.
    ///
    /// The message echoes the offending statement with a ` <!> ` marker
    /// inserted at the failure column.
    #[error("line {line}: {message}")]
    Preprocess {
        /// 0-based physical line of the failing statement.
        line: u32,
        /// Annotated diagnostic, e.g. `preprocessor: syntax error: 'c = 1 <!> a2;'`.
        message: String,
    },

    /// Two `config:` lines declared the same identifier (case-insensitive).
    #[error("line {line}: duplicate config variable: {identifier}")]
    DuplicateConfig {
        /// 0-based source line of the second declaration.
        line: u32,
        /// The identifier as written on the duplicate line.
        identifier: String,
    },
}

impl LangError {
    /// 0-based source line the error refers to.
    pub fn line(&self) -> u32 {
        match self {
            Self::UnrecognizedSection { line, .. }
            | Self::Preprocess { line, .. }
            | Self::DuplicateConfig { line, .. } => *line,
        }
    }
}
