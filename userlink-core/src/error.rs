//! Typed error handling for userlink.
//!
//! Malformed macros, lookup failures and document I/O are scoped to a single
//! document: a batch reports the failing document and moves on. Config,
//! directory and ledger errors stop the batch before any document is written.

use std::path::PathBuf;
use thiserror::Error;

/// The directory could not answer for a reference key.
///
/// Kept separate from [`UserlinkError`] so resolver implementations only
/// need this one type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("lookup failed for user key '{key}': {reason}")]
pub struct LookupFailure {
    /// The cleaned reference key that was looked up
    pub key: String,
    /// Why the directory could not answer
    pub reason: String,
}

impl LookupFailure {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for userlink operations.
#[derive(Error, Debug)]
pub enum UserlinkError {
    /// A start marker with no recognisable terminator after it
    #[error("malformed user link at byte {offset}: no terminator found")]
    MalformedMacro {
        /// Offset of the start marker within the original document
        offset: usize,
    },

    /// The resolver could not answer; never guessed either way
    #[error(transparent)]
    Lookup(#[from] LookupFailure),

    /// I/O error when reading/writing documents
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Directory snapshot could not be loaded
    #[error("Directory error at {path}: {message}")]
    Directory { path: PathBuf, message: String },

    /// Version ledger errors
    #[error("Ledger error: {message}")]
    Ledger { message: String },
}

impl UserlinkError {
    /// Create a malformed-macro error at an absolute document offset.
    pub fn malformed(offset: usize) -> Self {
        Self::MalformedMacro { offset }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a directory snapshot error.
    pub fn directory(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Directory {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a ledger error.
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }
}

/// Convenience type alias for userlink results.
pub type UserlinkResult<T> = Result<T, UserlinkError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> UserlinkResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> UserlinkResult<T> {
        self.map_err(|e| UserlinkError::io(path, e))
    }
}
