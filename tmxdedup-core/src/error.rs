//! Layered error types for the deduplication pipeline

use thiserror::Error;

/// Pipeline-level errors
#[derive(Error, Debug)]
pub enum Error {
    /// Input ended without a parseable header
    #[error("no header found in input")]
    MissingHeader,

    /// Input ended without a single valid translation unit
    #[error("no translation units parsed ({skipped} spans skipped)")]
    NoUnitsParsed {
        /// Number of unit spans that were scanned but rejected
        skipped: u64,
    },

    /// A variant required by the active match mode is missing
    #[error("no variant matches language '{lang}'")]
    VariantNotFound {
        /// The language token that failed to match either variant
        lang: String,
    },

    /// Writer was driven out of its open/write/close protocol
    #[error("writer structure error: {reason}")]
    WriterStructure {
        /// What the writer was asked to do that it could not
        reason: String,
    },

    /// Byte-to-text conversion failed
    #[error("decode failed: {0}")]
    Decode(String),

    /// Text-to-byte conversion failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// I/O error from the chunk source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation was requested
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
