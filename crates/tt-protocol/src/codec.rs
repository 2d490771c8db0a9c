//! Envelope codec
//!
//! The wire form of an envelope is a JSON object `{"type": ..., "data": ...}`.
//! The payload is always carried as a JSON string value, so payloads that
//! contain quotes, braces or colons survive untouched.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::message::MessageType;

/// The single unit exchanged on either channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Type tag selecting how `data` is interpreted
    pub message_type: MessageType,
    /// Opaque text payload
    pub data: String,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(message_type: MessageType, data: impl Into<String>) -> Self {
        Self {
            message_type,
            data: data.into(),
        }
    }

    /// Encode this envelope as wire text
    pub fn to_wire(&self) -> String {
        encode(self.message_type, &self.data)
    }
}

/// Encode a type tag and payload as wire text
pub fn encode(message_type: MessageType, data: &str) -> String {
    serde_json::json!({
        "type": message_type.as_str(),
        "data": data,
    })
    .to_string()
}

/// Decode wire text into an envelope
///
/// Text that is not a `{type, data}` object fails with
/// [`ProtocolError::MalformedEnvelope`]. A well-formed envelope whose type tag
/// is not recognized fails with [`ProtocolError::UnknownMessageType`] instead:
/// that is the one malformed case receivers drop quietly, see
/// [`ProtocolError::is_forward_compatible`].
///
/// A missing or `null` `data` field decodes as an empty payload, since
/// lifecycle notices are commonly sent without one.
pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| ProtocolError::MalformedEnvelope("envelope is not an object".into()))?;

    let type_tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::MalformedEnvelope("missing type".into()))?;

    let data = match object.get("data") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(ProtocolError::MalformedEnvelope(format!(
                "data must be text, got {}",
                other
            )))
        }
    };

    let message_type: MessageType = type_tag.parse()?;

    Ok(Envelope { message_type, data })
}
