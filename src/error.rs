//! Application Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("issue loading configuration")]
    Config,
    #[display("issue with the metadata cache")]
    Cache,
    #[display("issue reading or writing tags")]
    Tags,
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("not a supported audio file: {}", _0.display())]
    NotApplicable(#[error(not(source))] PathBuf),
    /// Cache keys are UTF-8 strings.
    #[display("path is not valid UTF-8: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    #[display("no embedded artwork: {}", _0.display())]
    NoArtwork(#[error(not(source))] PathBuf),
    #[display("failed to write output")]
    Output,
    #[display("{_0} file(s) could not be processed")]
    Failed(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache | Self::Tags)
    }
}
