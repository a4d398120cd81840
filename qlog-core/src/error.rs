//! Error types for qlog recording
//!
//! Errors fall into two groups:
//! - Protocol mismatches (an unknown frame or header type reached the tracer).
//!   These fail the intake call so a trace never silently loses a frame.
//! - Sink failures while writing the rendered document. These are handed back
//!   to the caller unchanged; the tracer never retries.
//!
//! Each variant carries a stable error code (e.g. `UNKNOWN_FRAME_VARIANT`)
//! that is safe to match on or aggregate in logs.
//!
//! # Example
//!
//! ```rust
//! use qlog_core::error::{ErrorCategory, QlogError};
//!
//! let err = QlogError::UnknownFrameVariant { frame_type: 0x30 };
//! assert_eq!(err.error_code(), "UNKNOWN_FRAME_VARIANT");
//! assert_eq!(err.category(), ErrorCategory::Protocol);
//! assert!(!err.is_recoverable());
//! ```

use std::io;

use thiserror::Error;

/// Result type alias for qlog operations
pub type Result<T> = std::result::Result<T, QlogError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input from the protocol engine is outside the known variant set
    Protocol,
    /// Writing to the byte sink failed
    Io,
    /// Should not happen; indicates a bug in the encoder
    Internal,
}

/// Errors that can occur while recording or exporting a trace
#[derive(Error, Debug)]
pub enum QlogError {
    /// A frame variant the transformer has no mapping for
    #[error("Unknown frame variant: type 0x{frame_type:x}. The tracer does not know how to record this frame.")]
    UnknownFrameVariant { frame_type: u64 },

    /// A long-header packet type outside the mapping table
    #[error("Unknown long header packet type: 0x{type_code:x}")]
    UnknownHeaderType { type_code: u8 },

    /// A connection id could not be parsed
    #[error("Invalid connection id: {reason}")]
    InvalidConnectionId { reason: String },

    /// Writing the document to its sink failed
    #[error("Failed to write trace: {0}")]
    SinkWrite(#[source] io::Error),

    /// Rendering the document failed for a reason other than I/O
    #[error("Serialization error: {0}. This is a bug; please report it.")]
    Serialization(#[source] serde_json::Error),
}

impl From<io::Error> for QlogError {
    fn from(err: io::Error) -> Self {
        QlogError::SinkWrite(err)
    }
}

impl From<serde_json::Error> for QlogError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json wraps writer failures; surface those as sink errors
        if err.is_io() {
            QlogError::SinkWrite(io::Error::from(err))
        } else {
            QlogError::Serialization(err)
        }
    }
}

impl QlogError {
    /// Returns true if the caller may succeed by retrying
    ///
    /// Only sink failures qualify: the same input will always be rejected
    /// by the transformers.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QlogError::SinkWrite(_))
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            QlogError::UnknownFrameVariant { .. }
            | QlogError::UnknownHeaderType { .. }
            | QlogError::InvalidConnectionId { .. } => ErrorCategory::Protocol,
            QlogError::SinkWrite(_) => ErrorCategory::Io,
            QlogError::Serialization(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            QlogError::UnknownFrameVariant { .. } => "UNKNOWN_FRAME_VARIANT",
            QlogError::UnknownHeaderType { .. } => "UNKNOWN_HEADER_TYPE",
            QlogError::InvalidConnectionId { .. } => "INVALID_CONNECTION_ID",
            QlogError::SinkWrite(_) => "SINK_WRITE_ERROR",
            QlogError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
