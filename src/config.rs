//! Configuration and limits for WebSocket connections.

use crate::close::CloseCode;
use crate::error::{Error, Result};

/// Configuration limits for WebSocket connections.
///
/// These limits bound the memory a peer can make us allocate. Both apply to
/// received data only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum payload size of a single frame in bytes.
    ///
    /// Checked against the declared length before the payload is read.
    ///
    /// Default: 16 MiB (16 * 1024 * 1024)
    pub max_frame_size: usize,

    /// Maximum size of a complete message in bytes.
    ///
    /// This applies to the total size after reassembling all fragments.
    ///
    /// Default: 64 MiB (64 * 1024 * 1024)
    pub max_message_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,   // 16 MiB
            max_message_size: 64 * 1024 * 1024, // 64 MiB
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_frame_size: usize, max_message_size: usize) -> Self {
        Self {
            max_frame_size,
            max_message_size,
        }
    }

    /// Create limits suitable for small embedded systems.
    ///
    /// - Max frame: 64 KiB
    /// - Max message: 256 KiB
    #[must_use]
    pub const fn embedded() -> Self {
        Self {
            max_frame_size: 64 * 1024,
            max_message_size: 256 * 1024,
        }
    }

    /// Create limits for unrestricted use.
    ///
    /// Warning: Use only in trusted environments.
    ///
    /// - Max frame: 1 GiB (on 64-bit) or `usize::MAX` (on 32-bit)
    /// - Max message: 4 GiB (on 64-bit) or `usize::MAX` (on 32-bit)
    #[cfg(target_pointer_width = "64")]
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            max_frame_size: 1024 * 1024 * 1024,
            max_message_size: 4 * 1024 * 1024 * 1024,
        }
    }

    /// Create limits for unrestricted use (32-bit platforms).
    ///
    /// Warning: Use only in trusted environments.
    #[cfg(target_pointer_width = "32")]
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            max_frame_size: usize::MAX,
            max_message_size: usize::MAX,
        }
    }

    /// Validate a declared frame payload length.
    ///
    /// # Errors
    ///
    /// Returns a 1009 protocol violation if `len` exceeds `max_frame_size`.
    pub fn check_frame_size(&self, len: u64) -> Result<()> {
        if len > self.max_frame_size as u64 {
            Err(Error::protocol(CloseCode::MessageTooBig, "frame too large"))
        } else {
            Ok(())
        }
    }
}

/// WebSocket connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// Reject TEXT messages and CLOSE reasons that are not valid UTF-8.
    ///
    /// Failures are reported as a 1007 protocol violation.
    ///
    /// Default: true
    pub validate_utf8: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            validate_utf8: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum accepted frame payload size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.limits.max_frame_size = size;
        self
    }

    /// Set the maximum accepted reassembled message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.limits.max_message_size = size;
        self
    }

    /// Enable or disable UTF-8 validation of incoming text.
    #[must_use]
    pub const fn with_utf8_validation(mut self, enabled: bool) -> Self {
        self.validate_utf8 = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_default() {
        let limits = Limits::default();
        assert_eq!(limits.max_frame_size, 16 * 1024 * 1024);
        assert_eq!(limits.max_message_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_limits_embedded() {
        let limits = Limits::embedded();
        assert_eq!(limits.max_frame_size, 64 * 1024);
        assert_eq!(limits.max_message_size, 256 * 1024);
    }

    #[test]
    fn test_limits_check_frame_size() {
        let limits = Limits::default();
        assert!(limits.check_frame_size(1024).is_ok());
        assert!(limits.check_frame_size(16 * 1024 * 1024).is_ok());

        let err = limits.check_frame_size(20 * 1024 * 1024).unwrap_err();
        assert_eq!(err.close_code(), Some(1009));
        assert!(limits.check_frame_size(u64::MAX).is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.limits, Limits::default());
        assert!(config.validate_utf8);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_limits(Limits::embedded())
            .with_max_frame_size(4096)
            .with_utf8_validation(false);

        assert_eq!(config.limits.max_frame_size, 4096);
        assert_eq!(config.limits.max_message_size, 256 * 1024);
        assert!(!config.validate_utf8);
    }

    #[test]
    fn test_config_max_message_size() {
        let config = Config::new().with_max_message_size(10);
        assert_eq!(config.limits.max_message_size, 10);
    }
}
