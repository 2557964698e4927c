//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Connection Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Connection error: {message}")]
    Connect { message: String },

    #[error("Not connected to the board")]
    NotConnected,

    // ─────────────────────────────────────────────────────────────
    // Characteristic I/O Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Error on '{key}' characteristic: {message}")]
    CharacteristicIo { key: &'static str, message: String },

    // ─────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    pub fn characteristic_io(key: &'static str, message: impl Into<String>) -> Self {
        Self::CharacteristicIo {
            key,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error leaves the connection usable.
    ///
    /// Recoverable errors are surfaced to the status/error message and the
    /// session continues; non-recoverable ones tear the session down.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::CharacteristicIo { .. }
                | Error::Validation { .. }
                | Error::NotConnected
                | Error::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::connect("device selection cancelled");
        assert_eq!(
            err.to_string(),
            "Connection error: device selection cancelled"
        );

        let err = Error::characteristic_io("thumb", "read timed out");
        assert_eq!(
            err.to_string(),
            "Error on 'thumb' characteristic: read timed out"
        );

        let err = Error::NotConnected;
        assert!(err.to_string().contains("Not connected"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::characteristic_io("palm", "gatt failure").is_recoverable());
        assert!(Error::validation("PWM level must be between 0 and 5").is_recoverable());
        assert!(Error::NotConnected.is_recoverable());
        assert!(!Error::connect("no adapter").is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::connect("test");
        let _ = Error::characteristic_io("led", "test");
        let _ = Error::validation("test");
        let _ = Error::config("test");
    }
}
