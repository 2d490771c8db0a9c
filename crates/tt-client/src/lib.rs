//! tt-client: Session orchestration for ts-term
//!
//! Turns two sequential WebSocket connections into one interactive terminal
//! session. The [`ControlChannel`] discovers peers and relays configuration;
//! the [`SessionChannel`] carries keystrokes, output and geometry once a
//! target is chosen. [`Client`] owns both managers and processes every
//! socket, keyboard, UI and timer event from a single inbox, in order.

pub mod client;
pub mod control;
pub mod debounce;
pub mod directory;
pub mod keys;
pub mod output;
pub mod session;
pub mod shell;
pub mod socket;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Client, ClientEvent, ClientExit, ClientSender};
pub use control::{ControlChannel, LifecycleNotice, SubmitRoute, MACHINE_ANNOUNCEMENT};
pub use debounce::Debouncer;
pub use directory::fetch_peers;
pub use keys::key_to_input;
pub use output::{OutputWriter, TerminalSurface, LINE_TERMINATOR};
pub use session::{SessionChannel, SessionSignal};
pub use shell::{KeyDisposition, UiAction, UiShell};
pub use socket::{Dialer, OutboundFrame, SocketEvent, SocketHandle, SocketNotice, WsDialer};
