//! tt-protocol: Wire protocol for ts-term
//!
//! Both the control channel and the session channel exchange exactly one
//! [`Envelope`] per WebSocket text frame. The envelope carries a closed
//! [`MessageType`] tag and an opaque text payload; [`Message`] is the typed
//! view of an envelope, validated at decode time.

pub mod codec;
pub mod error;
pub mod message;
pub mod payload;

pub use codec::{decode, encode, Envelope};
pub use error::ProtocolError;
pub use message::{Message, MessageType};
pub use payload::{HostAction, PeerInfo, SessionTarget, TerminalGeometry};
