//! Core error types for ts-term

use std::path::PathBuf;
use thiserror::Error;

/// Errors writing to either channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// No socket exists for this channel
    #[error("Channel not connected")]
    NotConnected,

    /// The socket's writer has gone away
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Session-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Backend is waiting for a host-trust decision
    #[error("Host confirmation pending")]
    HostTrustPending,

    /// Session channel is not open
    #[error("Session channel is not open")]
    NotOpen,

    /// Underlying channel failure
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
