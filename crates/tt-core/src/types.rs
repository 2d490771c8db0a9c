//! Core type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which of the two WebSocket connections an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// First-phase connection: peer discovery and configuration relay
    Control,
    /// Second-phase connection: live terminal data
    Session,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Control => write!(f, "control"),
            ChannelKind::Session => write!(f, "session"),
        }
    }
}

/// Lifecycle state of a channel
///
/// Owned exclusively by the channel's manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No socket yet (the control channel calls this "disconnected")
    Idle,
    /// Socket created, waiting for the open callback
    Connecting,
    /// Socket open and exchanging envelopes
    Open,
    /// Socket reported an error; a close will follow
    Errored,
    /// Socket closed
    Closed,
}

impl ChannelState {
    /// Whether envelopes sent now will reach (or queue for) the peer
    pub fn is_live(&self) -> bool {
        matches!(self, ChannelState::Connecting | ChannelState::Open)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Idle => write!(f, "idle"),
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Errored => write!(f, "errored"),
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

/// Identifier of one of the host shell's modal surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    ConnectionSetup,
    InProgress,
    HostConfirmation,
    Error,
}

/// A modal surface together with what it displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Machine selection and credential form
    ConnectionSetup,
    /// Indeterminate progress indicator
    InProgress,
    /// Unknown-host trust decision
    HostConfirmation {
        /// Host identity text from the backend
        host: String,
    },
    /// Authentication or connection failure, offering retry
    Error {
        /// Backend-supplied detail (often empty)
        detail: String,
    },
}

impl Dialog {
    pub fn kind(&self) -> DialogKind {
        match self {
            Dialog::ConnectionSetup => DialogKind::ConnectionSetup,
            Dialog::InProgress => DialogKind::InProgress,
            Dialog::HostConfirmation { .. } => DialogKind::HostConfirmation,
            Dialog::Error { .. } => DialogKind::Error,
        }
    }
}

/// Which address of a peer to connect to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Short machine name (MagicDNS)
    #[default]
    Short,
    /// Fully qualified domain
    Full,
    /// First overlay IP
    Ip,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Short => "short",
            AddressKind::Full => "full",
            AddressKind::Ip => "ip",
        }
    }
}

impl FromStr for AddressKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" | "domain" => Ok(AddressKind::Short),
            "full" => Ok(AddressKind::Full),
            "ip" => Ok(AddressKind::Ip),
            other => Err(ConfigError::Invalid(format!(
                "unknown address kind {:?} (expected short, full or ip)",
                other
            ))),
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
