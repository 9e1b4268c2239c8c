//! Error types for index loading, building and searching.
//!
//! A term that is missing from the dictionary is not an error: lookups return
//! an empty postings list instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the index and the search engine.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The persisted structures are missing or do not form a valid index.
    #[error("no index at {}: {reason}", path.display())]
    NoIndex { path: PathBuf, reason: String },

    /// A document id or byte offset outside the valid bounds.
    #[error("{what} {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: u64,
        len: u64,
    },

    /// A dictionary or postings record that does not parse. `record` names
    /// the offending line or the term whose postings were being decoded.
    #[error("malformed record in {file} ({record}): {reason}")]
    MalformedRecord {
        file: &'static str,
        record: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The search was stopped through its cancellation token.
    #[error("search cancelled")]
    Cancelled,
}

impl IndexError {
    pub fn no_index(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::NoIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn out_of_range(what: &'static str, index: u64, len: u64) -> Self {
        IndexError::OutOfRange { what, index, len }
    }

    pub fn malformed(
        file: &'static str,
        record: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        IndexError::MalformedRecord {
            file,
            record: record.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, IndexError>;
