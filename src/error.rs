//! Error types for Tracer protocol operations.

use thiserror::Error;

/// Result type alias for Tracer operations.
pub type Result<T> = std::result::Result<T, TracerError>;

/// Error types for Tracer controller communication.
#[derive(Error, Debug)]
pub enum TracerError {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Checksum needs at least two bytes to seed its registers
    #[error("Checksum span too short: {length} bytes (min 2)")]
    ChecksumSpan {
        /// Length of the rejected buffer
        length: usize,
    },

    /// Payload does not fit the 1-byte length field
    #[error("Payload too long: {length} bytes (max 255)")]
    PayloadTooLong {
        /// Length of payload that was too long
        length: usize,
    },

    /// Captured bytes do not form a response envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Response checksum validation failed
    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch {
        /// Checksum computed over the received envelope
        expected: u16,
        /// Checksum carried by the frame
        actual: u16,
    },

    /// Host text parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}
