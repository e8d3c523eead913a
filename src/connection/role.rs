//! Endpoint role (client or server).

use crate::close::CloseCode;
use crate::error::{Error, Result};

/// Which end of the connection this endpoint is.
///
/// Determines masking behavior per RFC 6455 Section 5.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Client role - masks every outgoing frame.
    Client,
    /// Server role - never masks outgoing frames.
    Server,
}

impl Role {
    /// Check if this role must mask outgoing frames.
    #[inline]
    #[must_use]
    pub const fn must_mask(&self) -> bool {
        matches!(self, Role::Client)
    }

    /// Check if this role expects incoming frames to be masked.
    #[inline]
    #[must_use]
    pub const fn expects_masked(&self) -> bool {
        matches!(self, Role::Server)
    }

    /// Check the MASK bit of an incoming frame against this role.
    ///
    /// # Errors
    ///
    /// Returns a 1002 protocol violation when a client sees a masked frame
    /// or a server sees an unmasked one.
    pub fn check_incoming_mask(&self, masked: bool) -> Result<()> {
        if masked == self.expects_masked() {
            return Ok(());
        }
        let message = if masked {
            "server can not has masked"
        } else {
            "client must has masked"
        };
        Err(Error::protocol(CloseCode::ProtocolError, message))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking_direction() {
        assert!(Role::Client.must_mask());
        assert!(!Role::Server.must_mask());
        assert!(Role::Server.expects_masked());
        assert!(!Role::Client.expects_masked());
    }

    #[test]
    fn test_client_rejects_masked() {
        let err = Role::Client.check_incoming_mask(true).unwrap_err();
        assert_eq!(err.close_code(), Some(1002));
        assert!(err.to_string().contains("server can not has masked"));
        assert!(Role::Client.check_incoming_mask(false).is_ok());
    }

    #[test]
    fn test_server_rejects_unmasked() {
        let err = Role::Server.check_incoming_mask(false).unwrap_err();
        assert!(err.to_string().contains("client must has masked"));
        assert!(Role::Server.check_incoming_mask(true).is_ok());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Client.to_string(), "client");
        assert_eq!(Role::Server.to_string(), "server");
    }
}
