//! Unified error types for the Longan library.
//!
//! This module provides a single error type covering record-level parsing
//! failures and the consistency violations the text engine can detect.
use thiserror::Error;

/// Main error type for Longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The in-memory model violates an invariant that cannot be repaired,
    /// e.g. a paragraph without text runs or an outline reference that
    /// cannot be resolved without a sheet context.
    #[error("structural violation: {0}")]
    StructuralViolation(String),

    /// Style-span coverage is inconsistent with the actual text length.
    /// Reported as-is; the engine never patches corrupted input.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The forced write-through of the host container failed. The whole
    /// save is aborted, there is no partial-write recovery.
    #[error("write failure: {0}")]
    WriteFailure(#[from] std::io::Error),

    /// Invalid record format
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Corrupted or truncated record data
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

/// Result type for Longan operations.
pub type Result<T> = std::result::Result<T, Error>;
