//! Error types for the two error channels.
//!
//! Direct API misuse raises [`BeaconError`] synchronously. Everything hit
//! while a [`BeaconReader`](crate::BeaconReader) drives a stream (malformed
//! lines, failed deferred checks, source faults, handler failures) is
//! recorded as a [`RecordedError`] and never propagated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised synchronously from the direct configuration API.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// Meta field name is empty, whitespace-only, or contains disallowed characters
    #[error("invalid meta field name: {0:?}")]
    Argument(String),

    /// A reserved meta field was given a value its validator rejects
    #[error("invalid {field} value: {message}")]
    Validation {
        /// Canonical name of the rejected field
        field: String,
        /// What the validator objected to
        message: String,
    },
}

/// Specialized Result type for meta-field operations
pub type BeaconResult<T> = Result<T, BeaconError>;

impl BeaconError {
    /// Create an argument error for a rejected field name
    pub fn argument(name: impl Into<String>) -> Self {
        Self::Argument(name.into())
    }

    /// Create a validation error for a reserved field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Classification of a recovered error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordedErrorKind {
    /// Malformed body line, non-URI link id, too many fields
    Parse,
    /// Invalid reserved-field value met while scanning header lines
    Validation,
    /// A deferred whole-document check failed at end of stream
    Consistency,
    /// The bound input could not be opened or read
    Source,
    /// A caller-supplied link or error handler failed
    Handler,
}

/// An error recovered while scanning a stream.
///
/// Surfaced only through [`BeaconReader::error_count`](crate::BeaconReader::error_count)
/// and [`BeaconReader::last_error`](crate::BeaconReader::last_error); the
/// offending line is skipped and the pass continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
    /// Which taxonomy bucket the error falls into
    pub kind: RecordedErrorKind,
    /// Human-readable description
    pub message: String,
    /// Physical line number at the point of recording
    pub line: u64,
    /// The raw input line, or empty for errors not tied to a line
    pub raw: String,
}

impl RecordedError {
    pub fn new(
        kind: RecordedErrorKind,
        message: impl Into<String>,
        line: u64,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            raw: raw.into(),
        }
    }

    /// Consistency errors mark the whole pass as failed; everything else is line-local.
    pub fn is_consistency(&self) -> bool {
        self.kind == RecordedErrorKind::Consistency
    }
}

impl std::fmt::Display for RecordedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
