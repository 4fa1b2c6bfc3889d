//! Extraction Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Field-level errors are swallowed by the
//! [`Parser`](crate::Parser) during extraction; write errors are not.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file carries no tag the codec understands.
    #[display("no tag found: {}", _0.display())]
    NoTag(#[error(not(source))] PathBuf),
    /// The codec cannot handle this kind of file at all.
    #[display("unsupported container: {_0}")]
    UnsupportedContainer(#[error(not(source))] String),
    /// The tag exists but could not be read.
    #[display("failed to read tags: {}", _0.display())]
    TagRead(#[error(not(source))] PathBuf),
    /// Writing (committing) tags back to the file failed.
    #[display("failed to write tags: {}", _0.display())]
    TagWrite(#[error(not(source))] PathBuf),
    /// A field was found but could not be parsed.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// The raw value that was rejected.
        value: String,
    },
    /// Stream properties (duration, bit rate) could not be determined.
    #[display("failed to probe audio stream: {}", _0.display())]
    Probe(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A file that was being written by someone else may be readable on
        // the next attempt; nothing else changes between attempts.
        matches!(self, Self::TagRead(_) | Self::TagWrite(_))
    }
}
