//! tt-core: Core abstractions and configuration for ts-term
//!
//! This crate provides the error taxonomy, channel and dialog identifiers,
//! the peer directory and the client configuration shared by the runtime
//! and the CLI.

pub mod config;
pub mod error;
pub mod peers;
pub mod types;

pub use error::{ChannelError, ConfigError, SessionError};
pub use peers::PeerDirectory;
pub use types::{AddressKind, ChannelKind, ChannelState, Dialog, DialogKind};
