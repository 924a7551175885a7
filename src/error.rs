//! # Error Types
//!
//! Custom error types for Tello Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Tello Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Socket or device initialization failed before a session existed
    #[error("Setup failed: {0}")]
    Setup(String),

    /// The vehicle actively refused the handshake
    #[error("Connection refused by the vehicle")]
    ConnectionRefused,

    /// The handshake retry schedule ran out without an "ok"
    #[error("No response from the vehicle after {attempts} handshake attempts")]
    HandshakeTimeout {
        /// Number of `command` messages that were sent
        attempts: usize,
    },

    /// A command could not be written to the socket
    #[error("Failed to send: {0}")]
    Send(#[source] std::io::Error),

    /// The receiver task could not read from the socket
    #[error("Failed to receive: {0}")]
    Receive(#[source] std::io::Error),

    /// No input backend found a usable device
    #[error("No input device found: {0}")]
    InputNotFound(String),

    /// The active input device stopped answering (may be re-detected)
    #[error("Input device disconnected: {0}")]
    InputDisconnected(String),

    /// Re-detection gave up; the failsafe sequence has to run
    #[error("Input device lost: {0}")]
    InputDeviceLost(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tello Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
