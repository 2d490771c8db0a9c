//! Message types for the ts-term protocol
//!
//! [`MessageType`] is the closed set of tags that may appear in an envelope's
//! `type` field. [`Message`] pairs each tag with its decoded payload.
//!
//! # Message Flow
//!
//! 1. Control channel: server sends `info` (announcing the session host) and
//!    `peers`; client answers with `ssh-config`
//! 2. Session channel: client reports `ts-websocket-opened` on the control
//!    channel, server may ask `ssh-host` (answered by `ssh-host-action`) or
//!    report `ssh-error`, then `ssh-success`
//! 3. Terminal I/O: `input` and `size` flow out, `output` and `info` flow in

use std::fmt;
use std::str::FromStr;

use crate::codec::Envelope;
use crate::error::ProtocolError;
use crate::payload::{HostAction, PeerInfo, SessionTarget, TerminalGeometry};

/// Envelope type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Free-text status from the server
    Info,
    /// Snapshot of reachable peers (JSON array)
    Peers,
    /// Keystrokes from the terminal
    Input,
    /// Terminal geometry (JSON object)
    Size,
    /// Connection target and credentials
    SshConfig,
    /// Backend could not authenticate or connect
    SshError,
    /// Backend asks the user to trust an unknown host
    SshHost,
    /// User's answer to `SshHost`
    SshHostAction,
    /// Remote shell is ready
    SshSuccess,
    /// PTY output
    Output,
    /// Session channel opened (echoed to the control channel)
    SessionOpened,
    /// Session channel failed (echoed to the control channel)
    SessionErrored,
    /// Server-side failure text
    Error,
}

impl MessageType {
    /// Every defined type, in wire-table order
    pub const ALL: [MessageType; 13] = [
        MessageType::Info,
        MessageType::Peers,
        MessageType::Input,
        MessageType::Size,
        MessageType::SshConfig,
        MessageType::SshError,
        MessageType::SshHost,
        MessageType::SshHostAction,
        MessageType::SshSuccess,
        MessageType::Output,
        MessageType::SessionOpened,
        MessageType::SessionErrored,
        MessageType::Error,
    ];

    /// Wire name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Info => "info",
            MessageType::Peers => "peers",
            MessageType::Input => "input",
            MessageType::Size => "size",
            MessageType::SshConfig => "ssh-config",
            MessageType::SshError => "ssh-error",
            MessageType::SshHost => "ssh-host",
            MessageType::SshHostAction => "ssh-host-action",
            MessageType::SshSuccess => "ssh-success",
            MessageType::Output => "output",
            MessageType::SessionOpened => "ts-websocket-opened",
            MessageType::SessionErrored => "ts-websocket-error",
            MessageType::Error => "error",
        }
    }
}

impl FromStr for MessageType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownMessageType(s.to_string()))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Info(String),
    Peers(Vec<PeerInfo>),
    Input(String),
    Size(TerminalGeometry),
    SshConfig(SessionTarget),
    SshError(String),
    /// Identity text of the host awaiting confirmation
    SshHost(String),
    SshHostAction(HostAction),
    SshSuccess,
    Output(String),
    SessionOpened,
    SessionErrored,
    Error(String),
}

impl Message {
    /// Get the message type for this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Info(_) => MessageType::Info,
            Message::Peers(_) => MessageType::Peers,
            Message::Input(_) => MessageType::Input,
            Message::Size(_) => MessageType::Size,
            Message::SshConfig(_) => MessageType::SshConfig,
            Message::SshError(_) => MessageType::SshError,
            Message::SshHost(_) => MessageType::SshHost,
            Message::SshHostAction(_) => MessageType::SshHostAction,
            Message::SshSuccess => MessageType::SshSuccess,
            Message::Output(_) => MessageType::Output,
            Message::SessionOpened => MessageType::SessionOpened,
            Message::SessionErrored => MessageType::SessionErrored,
            Message::Error(_) => MessageType::Error,
        }
    }

    /// Build the envelope carrying this message
    pub fn to_envelope(&self) -> Envelope {
        let data = match self {
            Message::Info(text)
            | Message::Input(text)
            | Message::SshError(text)
            | Message::SshHost(text)
            | Message::Output(text)
            | Message::Error(text) => text.clone(),
            Message::Peers(peers) => payload_json(peers),
            Message::Size(geometry) => payload_json(geometry),
            Message::SshConfig(target) => target.to_wire(),
            Message::SshHostAction(action) => action.as_str().to_string(),
            Message::SshSuccess | Message::SessionOpened | Message::SessionErrored => {
                String::new()
            }
        };

        Envelope::new(self.message_type(), data)
    }

    /// Encode this message as wire text
    pub fn encode(&self) -> String {
        self.to_envelope().to_wire()
    }

    /// Decode wire text into a typed message
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Message::try_from(crate::codec::decode(text)?)
    }
}

/// Serialize a structured payload into the envelope's text field
///
/// Payload types hold only strings and integers, so serialization cannot fail.
fn payload_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

impl TryFrom<Envelope> for Message {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { message_type, data } = envelope;

        let message = match message_type {
            MessageType::Info => Message::Info(data),
            MessageType::Peers => {
                let peers: Vec<PeerInfo> =
                    serde_json::from_str(&data).map_err(|e| ProtocolError::InvalidPayload {
                        kind: "peers",
                        reason: e.to_string(),
                    })?;
                Message::Peers(peers)
            }
            MessageType::Input => Message::Input(data),
            MessageType::Size => {
                let geometry: TerminalGeometry =
                    serde_json::from_str(&data).map_err(|e| ProtocolError::InvalidPayload {
                        kind: "size",
                        reason: e.to_string(),
                    })?;
                Message::Size(geometry)
            }
            MessageType::SshConfig => Message::SshConfig(data.parse()?),
            MessageType::SshError => Message::SshError(data),
            MessageType::SshHost => Message::SshHost(data),
            MessageType::SshHostAction => Message::SshHostAction(data.parse()?),
            MessageType::SshSuccess => Message::SshSuccess,
            MessageType::Output => Message::Output(data),
            MessageType::SessionOpened => Message::SessionOpened,
            MessageType::SessionErrored => Message::SessionErrored,
            MessageType::Error => Message::Error(data),
        };

        Ok(message)
    }
}
