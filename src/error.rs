//! Error types for the WebSocket engine.
//!
//! Every layer reports failures through the same three-way taxonomy:
//! transport failures, protocol violations (carrying the close code that
//! should be reported to the peer) and invalid-state errors raised by the
//! close handshake.

use std::sync::Arc;

use thiserror::Error;

use crate::close::CloseCode;

/// Result type alias for WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during WebSocket operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The transport is unusable: peer EOF, locally closed, or an I/O error.
    ///
    /// Not continuable. Calling `close()` afterwards is safe and idempotent.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// A single- or multi-frame protocol violation.
    #[error("Protocol violation ({code}): {message}")]
    Protocol {
        /// Close code to report to the peer.
        code: u16,
        /// Human-readable description.
        message: String,
    },

    /// A send attempted after the close handshake forbids it, or a close
    /// payload that exceeds its length bound.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create a protocol violation carrying the given close code.
    #[must_use]
    pub fn protocol(code: CloseCode, message: impl Into<String>) -> Self {
        Error::Protocol {
            code: code.as_u16(),
            message: message.into(),
        }
    }

    /// The error reported once the connection has been closed locally.
    #[must_use]
    pub fn closed() -> Self {
        Error::Io(Arc::new(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            "connection closed",
        )))
    }

    /// Close code carried by a protocol violation.
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Error::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` for transport failures.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns `true` for protocol violations.
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol { .. })
    }

    /// Returns `true` for invalid-state errors.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}
