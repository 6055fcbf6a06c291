//! Error types for goridge-worker.

use thiserror::Error;

/// Main error type for relay, framing and loop failures.
///
/// Handler failures are not represented here: they are reported to the host
/// as error frames and never end the loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// I/O error on the relay (read failure or broken output stream).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (control frames, JSON payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Protocol error (bad CRC, bad header length, oversize payload, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The relay closed in the middle of a frame.
    #[error("Relay closed mid-{stage}: expected {expected} bytes, got {received}")]
    Truncated {
        /// Which part of the frame was being read ("header", "options" or "payload").
        stage: &'static str,
        /// Bytes the frame declared for that part.
        expected: usize,
        /// Bytes actually available when the relay closed.
        received: usize,
    },

    /// Writes were attempted after the relay was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Relay address could not be parsed or connected.
    #[error("Invalid relay: {0}")]
    InvalidRelay(String),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WorkerError {
    /// True for errors caused by a malformed or truncated inbound stream.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            WorkerError::Protocol(_)
                | WorkerError::Truncated { .. }
                | WorkerError::Json(_)
        )
    }
}

/// Result type alias using WorkerError.
pub type Result<T> = std::result::Result<T, WorkerError>;
