//! Close status codes and the CLOSE frame payload codec (RFC 6455 Section 5.5.1).
//!
//! A CLOSE payload is either empty or a 2-byte big-endian status code
//! optionally followed by a UTF-8 reason. The reason is bounded so the whole
//! payload fits a control frame.

use crate::error::{Error, Result};

/// Maximum reason length in bytes (125-byte control payload minus the code).
pub const MAX_CLOSE_REASON_LEN: usize = 123;

/// WebSocket close status code per RFC 6455 Section 7.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// Normal closure (1000).
    #[default]
    Normal,
    /// Going away (1001). Endpoint is going away.
    GoingAway,
    /// Protocol error (1002). Malformed frame or protocol violation.
    ProtocolError,
    /// Unsupported data (1003). Data type the endpoint cannot accept.
    UnsupportedData,
    /// No status received (1005). Never sent on the wire.
    NoStatus,
    /// Abnormal closure (1006). Connection dropped without a CLOSE frame.
    Abnormal,
    /// Invalid payload (1007). Data not consistent with the message type.
    InvalidPayload,
    /// Policy violation (1008).
    PolicyViolation,
    /// Message too big (1009).
    MessageTooBig,
    /// Mandatory extension (1010).
    MandatoryExtension,
    /// Internal error (1011).
    InternalError,
    /// Service restart (1012).
    ServiceRestart,
    /// Try again later (1013).
    TryAgainLater,
    /// Any other code, e.g. 3000-4999 for applications.
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1005 => CloseCode::NoStatus,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::MandatoryExtension,
            1011 => CloseCode::InternalError,
            1012 => CloseCode::ServiceRestart,
            1013 => CloseCode::TryAgainLater,
            other => CloseCode::Other(other),
        }
    }

    /// Get the numeric value of this close code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnsupportedData => 1003,
            CloseCode::NoStatus => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::MandatoryExtension => 1010,
            CloseCode::InternalError => 1011,
            CloseCode::ServiceRestart => 1012,
            CloseCode::TryAgainLater => 1013,
            CloseCode::Other(code) => *code,
        }
    }

    /// Short reason attached when this code is turned into a [`CloseInfo`].
    #[must_use]
    pub const fn default_reason(&self) -> &'static str {
        match self {
            CloseCode::Normal => "normal close",
            CloseCode::GoingAway => "going away",
            CloseCode::ProtocolError => "protocol error",
            CloseCode::UnsupportedData => "cannot accept message",
            CloseCode::NoStatus => "no status code",
            CloseCode::Abnormal => "closed abnormally",
            CloseCode::InvalidPayload => "not consistent",
            CloseCode::PolicyViolation => "violated policy",
            CloseCode::MessageTooBig => "too big",
            CloseCode::MandatoryExtension => "no extension",
            CloseCode::InternalError => "unexpected condition",
            CloseCode::ServiceRestart => "service restart",
            CloseCode::TryAgainLater => "try again later",
            CloseCode::Other(_) => "",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Status code and reason carried by a CLOSE frame.
///
/// An absent code means "no close info", e.g. an empty CLOSE payload. A
/// reason can only exist alongside a code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CloseInfo {
    code: Option<u16>,
    reason: Option<String>,
}

impl CloseInfo {
    /// Close info with a code and a reason. An empty reason is stored as none.
    #[must_use]
    pub fn of(code: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            code: Some(code),
            reason: (!reason.is_empty()).then_some(reason),
        }
    }

    /// Close info with a code and no reason.
    #[must_use]
    pub const fn with_code(code: u16) -> Self {
        Self {
            code: Some(code),
            reason: None,
        }
    }

    /// No close info at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            code: None,
            reason: None,
        }
    }

    /// The status code, if any.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        self.code
    }

    /// The reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns `true` if no status code is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.code.is_none()
    }

    /// Decode a CLOSE frame payload.
    ///
    /// # Errors
    ///
    /// - `Error::Protocol` (1002) if the payload is exactly one byte
    /// - `Error::Protocol` (1007) if the reason is not valid UTF-8
    pub fn decode(payload: &[u8]) -> Result<Self> {
        match payload.len() {
            0 => Ok(Self::empty()),
            1 => Err(Error::protocol(
                CloseCode::ProtocolError,
                "close frame payload length must not be 1",
            )),
            _ => {
                let code = u16::from_be_bytes([payload[0], payload[1]]);
                let reason = std::str::from_utf8(&payload[2..]).map_err(|_| {
                    Error::protocol(CloseCode::InvalidPayload, "invalid utf-8 in close reason")
                })?;
                Ok(Self::of(code, reason))
            }
        }
    }

    /// Decode a CLOSE frame payload, replacing invalid UTF-8 in the reason.
    ///
    /// A 1-byte payload carries no usable code and yields no close info.
    #[must_use]
    pub fn decode_lossy(payload: &[u8]) -> Self {
        if payload.len() < 2 {
            return Self::empty();
        }
        let code = u16::from_be_bytes([payload[0], payload[1]]);
        Self::of(code, String::from_utf8_lossy(&payload[2..]))
    }

    /// Encode into a CLOSE frame payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if the reason exceeds
    /// [`MAX_CLOSE_REASON_LEN`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let Some(code) = self.code else {
            return Ok(Vec::new());
        };

        let reason = self.reason.as_deref().unwrap_or_default().as_bytes();
        if reason.len() > MAX_CLOSE_REASON_LEN {
            return Err(Error::InvalidState(format!(
                "close reason too long: {} bytes (max: {MAX_CLOSE_REASON_LEN})",
                reason.len()
            )));
        }

        let mut payload = Vec::with_capacity(2 + reason.len());
        payload.extend_from_slice(&code.to_be_bytes());
        payload.extend_from_slice(reason);
        Ok(payload)
    }
}

impl From<CloseCode> for CloseInfo {
    fn from(code: CloseCode) -> Self {
        Self::of(code.as_u16(), code.default_reason())
    }
}

impl std::fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.reason()) {
            (None, _) => write!(f, "no close info"),
            (Some(code), None) => write!(f, "{code}"),
            (Some(code), Some(reason)) => write!(f, "{code} ({reason})"),
        }
    }
}
