//! Message fragmentation and reassembly for WebSocket (RFC 6455).

use crate::close::CloseCode;
use crate::error::{Error, Result};
use crate::protocol::{Frame, OpCode};

/// Reassembles fragmented WebSocket messages.
///
/// Control frames pass straight through without touching an accumulation in
/// progress, so they may interleave with the fragments of a data message.
#[derive(Debug)]
pub struct MessageAssembler {
    fragments: Vec<Frame>,
    payload_len: usize,
    max_message_size: usize,
}

impl MessageAssembler {
    pub fn new(max_message_size: usize) -> Self {
        Self {
            fragments: Vec::new(),
            payload_len: 0,
            max_message_size,
        }
    }

    /// Feed one validated frame.
    ///
    /// Returns `Some(message)` once a complete message is available and
    /// `None` while fragments are still being collected.
    ///
    /// # Errors
    ///
    /// - 1002 protocol violation for a TEXT/BINARY frame during accumulation
    /// - 1002 protocol violation for a CONTINUATION frame outside accumulation
    /// - 1009 protocol violation if the collected fragments exceed `max_message_size`
    pub fn push(&mut self, frame: Frame) -> Result<Option<AssembledMessage>> {
        match frame.opcode() {
            OpCode::Close | OpCode::Ping | OpCode::Pong => Ok(Some(frame.into())),
            OpCode::Text | OpCode::Binary => {
                if self.is_assembling() {
                    return Err(Error::protocol(
                        CloseCode::ProtocolError,
                        format!(
                            "received {} frame while a fragmented message is in progress",
                            frame.opcode()
                        ),
                    ));
                }
                if frame.fin() {
                    return Ok(Some(frame.into()));
                }
                self.append(frame)?;
                Ok(None)
            }
            OpCode::Continuation => {
                if !self.is_assembling() {
                    return Err(Error::protocol(
                        CloseCode::ProtocolError,
                        "unexpected continuation frame (no fragmented message in progress)",
                    ));
                }
                let fin = frame.fin();
                self.append(frame)?;
                Ok(fin.then(|| self.finish()))
            }
        }
    }

    /// Returns `true` while a fragmented message is being collected.
    #[must_use]
    pub fn is_assembling(&self) -> bool {
        !self.fragments.is_empty()
    }

    fn append(&mut self, frame: Frame) -> Result<()> {
        let new_len = self.payload_len.saturating_add(frame.payload().len());
        if new_len > self.max_message_size {
            return Err(Error::protocol(CloseCode::MessageTooBig, "message too big"));
        }
        self.payload_len = new_len;
        self.fragments.push(frame);
        Ok(())
    }

    fn finish(&mut self) -> AssembledMessage {
        let opcode = self
            .fragments
            .first()
            .map_or(OpCode::Binary, Frame::opcode);

        let mut payload = Vec::with_capacity(self.payload_len);
        for fragment in self.fragments.drain(..) {
            payload.extend_from_slice(fragment.payload());
        }
        self.payload_len = 0;

        AssembledMessage { opcode, payload }
    }
}

/// A complete message: a single frame or the concatenation of its fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    /// Opcode of the first frame of the message.
    pub opcode: OpCode,
    pub payload: Vec<u8>,
}

impl From<Frame> for AssembledMessage {
    fn from(frame: Frame) -> Self {
        Self {
            opcode: frame.opcode(),
            payload: frame.into_payload(),
        }
    }
}
