//! # Error Module
//!
//! Error types for the `plc_hmi` application, built on `thiserror`.
//!
//! Nothing in the link or protocol layers is fatal: these errors are turned
//! into log lines by the session and the application keeps running.

use thiserror::Error;

/// Result type alias for `plc_hmi` operations.
pub type Result<T> = std::result::Result<T, HmiError>;

/// Main error type for the `plc_hmi` application.
#[derive(Debug, Error)]
pub enum HmiError {
    /// Failed to open serial port.
    #[error("Failed to open serial port '{port_name}': {reason}")]
    PortOpen { port_name: String, reason: String },

    /// Failed to read from serial port.
    #[error("Failed to read from serial port: {0}")]
    PortRead(String),

    /// Failed to write to serial port.
    #[error("Failed to write to serial port: {0}")]
    PortWrite(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIo(#[from] std::io::Error),
}

impl HmiError {
    /// Creates a new port open error.
    #[must_use]
    pub fn port_open(port_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PortOpen {
            port_name: port_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new port read error.
    #[must_use]
    pub fn port_read(msg: impl Into<String>) -> Self {
        Self::PortRead(msg.into())
    }

    /// Creates a new port write error.
    #[must_use]
    pub fn port_write(msg: impl Into<String>) -> Self {
        Self::PortWrite(msg.into())
    }

    /// Creates a new invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_open_error() {
        let error = HmiError::port_open("/dev/ttyUSB0", "Resource busy");
        let msg = error.to_string();
        assert!(msg.contains("/dev/ttyUSB0"));
        assert!(msg.contains("Resource busy"));
    }

    #[test]
    fn test_port_read_error() {
        let error = HmiError::port_read("device unplugged");
        assert!(error.to_string().contains("device unplugged"));
    }

    #[test]
    fn test_port_write_error() {
        let error = HmiError::port_write("broken pipe");
        assert!(error.to_string().contains("broken pipe"));
    }

    #[test]
    fn test_invalid_config_error() {
        let error = HmiError::invalid_config("baud_rate must be non-zero");
        assert!(error.to_string().contains("baud_rate"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: HmiError = io.into();
        assert!(matches!(error, HmiError::FileIo(_)));
    }
}
