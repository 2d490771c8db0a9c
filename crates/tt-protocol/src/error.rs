//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding envelopes and their payloads
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not a structured `{type, data}` envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope is well formed but its type tag is not one we know
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    /// Envelope payload does not match the shape its type requires
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    /// JSON error while handling a nested payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Whether this error only means the peer speaks a newer protocol.
    ///
    /// Unknown types are dropped quietly rather than reported as malformed.
    pub fn is_forward_compatible(&self) -> bool {
        matches!(self, ProtocolError::UnknownMessageType(_))
    }
}
