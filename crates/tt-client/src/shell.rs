//! Host shell abstraction
//!
//! The shell owns the modal surfaces (connection form, progress indicator,
//! host confirmation, error dialog). The channel managers only ask it to
//! show or dismiss them; what the user decides comes back as a [`UiAction`].

use crossterm::event::KeyEvent;
use tt_core::{Dialog, DialogKind, PeerDirectory};
use tt_protocol::{HostAction, SessionTarget};

/// A decision made through one of the modal surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Connection form submitted
    SubmitConfig(SessionTarget),
    /// Host confirmation answered
    HostDecision(HostAction),
    /// Error dialog: try again
    RetryAfterError,
    /// Error dialog: give up
    CancelAfterError,
}

/// What the shell did with a key event or a paste
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Not for the shell; forward to the session
    PassThrough,
    /// Used by an active modal surface
    Consumed,
    /// Used, and completed a decision
    Action(UiAction),
}

/// Modal surfaces owned by the host shell
pub trait UiShell {
    /// Show a surface, replacing any earlier contents of the same kind
    fn show(&mut self, dialog: Dialog);

    /// Dismiss a surface; no-op if it is not showing
    fn dismiss(&mut self, kind: DialogKind);

    /// Make a new peer snapshot available to the connection form
    fn publish_peers(&mut self, peers: &PeerDirectory);

    /// Offer a key event to the active surface
    fn handle_key(&mut self, _key: &KeyEvent) -> KeyDisposition {
        KeyDisposition::PassThrough
    }

    /// Offer pasted text to the active surface
    fn handle_paste(&mut self, _text: &str) -> KeyDisposition {
        KeyDisposition::PassThrough
    }
}
