//! Error types for anomaly-sheets-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a detection run.
///
/// Every variant is fatal to the current invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested worksheet is not part of the workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// No cell in column A matches the sentinel marker
    #[error("Sentinel '{marker}' not found in column A")]
    SentinelNotFound { marker: String },

    /// The sentinel sits in the very first row, leaving no room for a header
    #[error("No header row above sentinel '{marker}' (found in the first row)")]
    NoHeaderAboveSentinel { marker: String },

    /// The bytes are not a readable spreadsheet container
    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a malformed-workbook error with a message
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedWorkbook(msg.into())
    }

    /// Short, stable name of the error kind, for callers that map kinds to
    /// user guidance.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SheetNotFound(_) => "SheetNotFound",
            Error::SentinelNotFound { .. } => "SentinelNotFound",
            Error::NoHeaderAboveSentinel { .. } => "NoHeaderAboveSentinel",
            Error::MalformedWorkbook(_) => "MalformedWorkbook",
            Error::InvalidAddress(_) => "InvalidAddress",
            Error::Other(_) => "Other",
        }
    }
}
