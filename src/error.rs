//! # Error Types
//!
//! Custom error types for the rover controller using `thiserror`.

use thiserror::Error;

use crate::controller::DeviceId;

/// Main error type for the rover controller
#[derive(Debug, Error)]
pub enum RoverError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input subsystem errors (enumeration, permissions)
    #[error("Controller error: {0}")]
    Controller(String),

    /// The requested device is no longer attached
    #[error("Device {0} is unavailable")]
    DeviceUnavailable(DeviceId),

    /// Send failure towards a microcontroller endpoint
    #[error("Transport error on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// None of the candidate serial ports could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Frame recorder errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

/// Result type alias for the rover controller
pub type Result<T> = std::result::Result<T, RoverError>;
