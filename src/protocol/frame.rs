//! Validated WebSocket frames (RFC 6455).
//!
//! A [`Frame`] is what the frame layer hands upward after a [`WireFrame`]
//! passed every single-frame legality check and was unmasked.
//!
//! [`WireFrame`]: crate::protocol::wire::WireFrame

use crate::close::CloseCode;
use crate::error::{Error, Result};
use crate::protocol::OpCode;

/// Maximum payload size for control frames (RFC 6455).
pub const MAX_CONTROL_FRAME_PAYLOAD: usize = 125;

/// A single, unmasked WebSocket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    opcode: OpCode,
    payload: Vec<u8>,
    fin: bool,
}

impl Frame {
    /// Create a frame from its parts.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            opcode,
            payload: payload.into(),
            fin,
        }
    }

    /// Final text frame.
    #[must_use]
    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Text, payload)
    }

    /// Final binary frame.
    #[must_use]
    pub fn binary(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Binary, payload)
    }

    /// Continuation frame.
    #[must_use]
    pub fn continuation(fin: bool, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(fin, OpCode::Continuation, payload)
    }

    /// Close frame with an already encoded close payload.
    #[must_use]
    pub fn close(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Close, payload)
    }

    /// Ping frame.
    #[must_use]
    pub fn ping(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Ping, payload)
    }

    /// Pong frame.
    #[must_use]
    pub fn pong(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Pong, payload)
    }

    #[inline]
    #[must_use]
    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    #[must_use]
    pub const fn fin(&self) -> bool {
        self.fin
    }

    /// Consume the frame, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Check the control-frame constraints of RFC 6455 Section 5.5.
    ///
    /// Data frames always pass.
    ///
    /// # Errors
    ///
    /// Returns a 1002 protocol violation if a control frame is fragmented,
    /// carries more than 125 bytes, or is a CLOSE with a 1-byte payload.
    pub fn check_control(&self) -> Result<()> {
        if !self.opcode.is_control() {
            return Ok(());
        }
        if !self.fin {
            return Err(Error::protocol(
                CloseCode::ProtocolError,
                format!("{} frame must have fin = true", self.opcode),
            ));
        }
        if self.payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
            return Err(Error::protocol(
                CloseCode::ProtocolError,
                format!(
                    "{} frame payload length must be <= {MAX_CONTROL_FRAME_PAYLOAD} bytes",
                    self.opcode
                ),
            ));
        }
        if self.opcode == OpCode::Close && self.payload.len() == 1 {
            return Err(Error::protocol(
                CloseCode::ProtocolError,
                "close frame payload length must not be 1",
            ));
        }
        Ok(())
    }
}
