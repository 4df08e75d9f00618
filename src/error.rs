//! # Error Types
//!
//! This module defines the error type used throughout the agent.

use thiserror::Error;

/// Main error type for agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    /// The device channel could not be opened (missing path, permission, unplugged)
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Transport-level errors after the channel was opened (write, flush, read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid command or parameter
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Method payload did not have the expected JSON shape
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Text that cannot be printed under the active text policy
    #[error("Invalid text: {0}")]
    InvalidText(String),

    /// Configuration update could not be applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event or reported-property delivery to the control plane failed
    #[error("Event publish failed: {0}")]
    EventPublish(String),

    /// The device worker did not answer in time
    #[error("Device timeout: {0}")]
    DeviceTimeout(String),

    /// The device worker is no longer running
    #[error("Device worker stopped")]
    WorkerStopped,

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
