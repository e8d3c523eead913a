//! Close-handshake bookkeeping (RFC 6455 Section 7).

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::message::MessageType;

/// Observable lifecycle state of a message-level connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ConnectionState {
    /// No CLOSE frame has been sent or received.
    #[default]
    Open,
    /// This side sent CLOSE; only reads remain meaningful.
    CloseSent,
    /// The peer sent CLOSE; only a CLOSE reply may be sent.
    CloseReceived,
    /// Both CLOSE frames were exchanged, or the transport was closed.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::CloseSent => write!(f, "CloseSent"),
            ConnectionState::CloseReceived => write!(f, "CloseReceived"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

/// The two close-handshake flags, shared between the reader and every sender.
#[derive(Debug, Default)]
pub struct CloseHandshake {
    sent: AtomicBool,
    received: AtomicBool,
}

impl CloseHandshake {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn close_sent(&self) -> bool {
        self.sent.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn close_received(&self) -> bool {
        self.received.load(Ordering::Acquire)
    }

    /// Record a successfully sent CLOSE frame.
    pub fn mark_sent(&self) {
        self.sent.store(true, Ordering::Release);
    }

    /// Record a received CLOSE frame.
    pub fn mark_received(&self) {
        self.received.store(true, Ordering::Release);
    }

    /// Decide whether a message of `kind` may go on the wire.
    ///
    /// Returns `Ok(false)` for a CLOSE after CLOSE was already sent, which
    /// callers treat as a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` for any non-CLOSE message once a CLOSE
    /// frame has been sent or received.
    pub fn admit(&self, kind: MessageType) -> Result<bool> {
        let is_close = kind == MessageType::Close;
        if self.close_sent() {
            if is_close {
                return Ok(false);
            }
            return Err(Error::InvalidState(format!(
                "cannot send {kind} after CLOSE has been sent"
            )));
        }
        if self.close_received() && !is_close {
            return Err(Error::InvalidState(format!(
                "cannot send {kind} after CLOSE has been received"
            )));
        }
        Ok(true)
    }

    /// Current state, ignoring whether the transport itself is still open.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match (self.close_sent(), self.close_received()) {
            (false, false) => ConnectionState::Open,
            (true, false) => ConnectionState::CloseSent,
            (false, true) => ConnectionState::CloseReceived,
            (true, true) => ConnectionState::Closed,
        }
    }
}
