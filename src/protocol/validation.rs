//! Single-frame legality checks for incoming frames (RFC 6455).
//!
//! Turns a raw [`WireFrame`] into a [`Frame`], enforcing:
//! - payload length bounds, before any payload byte is read
//! - known opcodes
//! - RSV bits clear (no extensions are negotiated)
//! - masking rules per RFC 6455 Section 5.1
//! - control-frame constraints per RFC 6455 Section 5.5

use crate::close::CloseCode;
use crate::config::Limits;
use crate::connection::Role;
use crate::error::{Error, Result};
use crate::protocol::mask::apply_mask_fast;
use crate::protocol::wire::WireFrame;
use crate::protocol::{Frame, OpCode};

/// Validator for incoming frames, bound to the local role.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    role: Role,
    limits: Limits,
}

impl FrameValidator {
    /// Create a new frame validator.
    #[must_use]
    pub fn new(role: Role, limits: Limits) -> Self {
        Self { role, limits }
    }

    /// The local role this validator enforces masking for.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Check a declared payload length.
    ///
    /// # Errors
    ///
    /// - 1002 protocol violation if the most significant bit is set
    /// - 1009 protocol violation if the length exceeds `max_frame_size`
    pub fn check_length(&self, payload_len: u64) -> Result<()> {
        if payload_len >> 63 != 0 {
            return Err(Error::protocol(
                CloseCode::ProtocolError,
                "invalid payload length",
            ));
        }
        self.limits.check_frame_size(payload_len)
    }

    /// Validate a fully read wire frame and unmask its payload.
    ///
    /// Checks run in order: opcode, RSV bits, masking, control constraints.
    ///
    /// # Errors
    ///
    /// Returns a 1002 protocol violation naming the first failed check.
    pub fn validate(&self, wire: WireFrame) -> Result<Frame> {
        let opcode = OpCode::try_from(wire.opcode)?;

        if wire.rsv1 || wire.rsv2 || wire.rsv3 {
            return Err(Error::protocol(CloseCode::ProtocolError, "unsupported rsv"));
        }

        self.role.check_incoming_mask(wire.masked())?;

        let mut payload = wire.payload;
        if let Some(key) = wire.mask {
            apply_mask_fast(&mut payload, key);
        }

        let frame = Frame::new(wire.fin, opcode, payload);
        frame.check_control()?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(opcode: u8, masked: bool, payload: &[u8]) -> WireFrame {
        let mut payload = payload.to_vec();
        let mask = masked.then_some([0x37, 0xfa, 0x21, 0x3d]);
        if let Some(key) = mask {
            apply_mask_fast(&mut payload, key);
        }
        WireFrame {
            fin: true,
            opcode,
            mask,
            payload_len: payload.len() as u64,
            payload,
            ..WireFrame::default()
        }
    }

    fn message(err: Error) -> String {
        match err {
            Error::Protocol { message, .. } => message,
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    // --------------------------------------------------------------------------
    // Masking (RFC 6455 Section 5.1)
    // --------------------------------------------------------------------------

    #[test]
    fn test_server_unmasks_client_frame() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        let frame = validator.validate(wire(0x1, true, b"Hello")).unwrap();

        assert_eq!(frame.opcode(), OpCode::Text);
        assert_eq!(frame.payload(), b"Hello");
    }

    #[test]
    fn test_server_rejects_unmasked_client_frame() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        let err = validator.validate(wire(0x1, false, b"Hello")).unwrap_err();

        assert_eq!(err.close_code(), Some(1002));
        assert_eq!(message(err), "client must has masked");
    }

    #[test]
    fn test_client_rejects_masked_server_frame() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let err = validator.validate(wire(0x2, true, b"data")).unwrap_err();

        assert_eq!(message(err), "server can not has masked");
    }

    #[test]
    fn test_client_accepts_unmasked_server_frame() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let frame = validator.validate(wire(0x2, false, &[1, 2, 3])).unwrap();
        assert_eq!(frame.payload(), &[1, 2, 3]);
    }

    // --------------------------------------------------------------------------
    // Opcode and RSV bits (RFC 6455 Section 5.2)
    // --------------------------------------------------------------------------

    #[test]
    fn test_rejects_unknown_opcode() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let err = validator.validate(wire(0x3, false, b"")).unwrap_err();
        assert_eq!(message(err), "unknown op code");
    }

    #[test]
    fn test_rejects_each_rsv_bit() {
        let validator = FrameValidator::new(Role::Server, Limits::default());

        for bit in 0..3 {
            let mut frame = wire(0x1, true, b"x");
            match bit {
                0 => frame.rsv1 = true,
                1 => frame.rsv2 = true,
                _ => frame.rsv3 = true,
            }
            let err = validator.validate(frame).unwrap_err();
            assert_eq!(message(err), "unsupported rsv");
        }
    }

    #[test]
    fn test_opcode_checked_before_rsv() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        let mut frame = wire(0xB, true, b"");
        frame.rsv1 = true;
        assert_eq!(message(validator.validate(frame).unwrap_err()), "unknown op code");
    }

    #[test]
    fn test_rsv_checked_before_masking() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        let mut frame = wire(0x1, false, b"");
        frame.rsv1 = true;
        assert_eq!(message(validator.validate(frame).unwrap_err()), "unsupported rsv");
    }

    // --------------------------------------------------------------------------
    // Control frames (RFC 6455 Section 5.5)
    // --------------------------------------------------------------------------

    #[test]
    fn test_rejects_fragmented_ping() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let mut frame = wire(0x9, false, b"");
        frame.fin = false;
        assert_eq!(
            message(validator.validate(frame).unwrap_err()),
            "PING frame must have fin = true"
        );
    }

    #[test]
    fn test_rejects_oversized_control_payload() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let err = validator.validate(wire(0x8, false, &[0; 126])).unwrap_err();
        assert_eq!(err.close_code(), Some(1002));
    }

    #[test]
    fn test_rejects_one_byte_close() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let err = validator.validate(wire(0x8, false, &[0x03])).unwrap_err();
        assert_eq!(message(err), "close frame payload length must not be 1");
    }

    // --------------------------------------------------------------------------
    // Length bounds
    // --------------------------------------------------------------------------

    #[test]
    fn test_length_msb_is_protocol_error() {
        let validator = FrameValidator::new(Role::Server, Limits::unrestricted());
        let err = validator.check_length(1 << 63).unwrap_err();
        assert_eq!(err.close_code(), Some(1002));
        assert_eq!(message(err), "invalid payload length");
    }

    #[test]
    fn test_length_over_limit_is_too_big() {
        let validator = FrameValidator::new(Role::Server, Limits::new(1024, 4096));
        assert!(validator.check_length(1024).is_ok());

        let err = validator.check_length(1025).unwrap_err();
        assert_eq!(err.close_code(), Some(1009));
        assert_eq!(message(err), "frame too large");
    }

    #[test]
    fn test_zero_length_accepted() {
        let validator = FrameValidator::new(Role::Server, Limits::embedded());
        assert!(validator.check_length(0).is_ok());
    }
}
