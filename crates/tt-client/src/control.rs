//! Control channel manager
//!
//! First-phase connection to the serving host's `/ts` endpoint. It delivers
//! the peer snapshot, announces the machine that will host the session
//! endpoint, and relays the user's `ssh-config` until a session channel
//! exists.

use std::time::Duration;

use tt_core::{ChannelError, ChannelKind, ChannelState, Dialog, DialogKind, PeerDirectory};
use tt_protocol::{Message, SessionTarget};

use crate::client::ClientSender;
use crate::output::{OutputWriter, TerminalSurface};
use crate::session::SessionChannel;
use crate::shell::UiShell;
use crate::socket::{Dialer, SocketEvent, SocketHandle};

/// Prefix of the `info` text announcing the session host
///
/// The full text reads `Tailscale machine <host> at <addresses>`.
pub const MACHINE_ANNOUNCEMENT: &str = "Tailscale machine";

/// Where a submitted configuration went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRoute {
    /// Sent on the control channel; the session channel should be opened
    /// after `connect_in`
    Deferred { connect_in: Duration },
    /// Sent on the live session channel
    Session,
}

/// Session lifecycle echoed back to the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleNotice {
    Opened,
    Errored,
}

/// Owns the control socket and everything learned through it
pub struct ControlChannel {
    url: String,
    state: ChannelState,
    socket: Option<SocketHandle>,
    generation: u64,
    peers: Option<PeerDirectory>,
    session_host: Option<String>,
    session_connect_delay: Duration,
}

impl ControlChannel {
    pub fn new(url: impl Into<String>, session_connect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            state: ChannelState::Idle,
            socket: None,
            generation: 0,
            peers: None,
            session_host: None,
            session_connect_delay,
        }
    }

    /// Open the control socket
    pub fn connect<D: Dialer>(&mut self, dialer: &mut D, events: ClientSender) {
        if let Some(old) = self.socket.take() {
            old.close();
        }

        self.generation += 1;
        tracing::info!("Opening control channel to {}", self.url);
        self.socket = Some(dialer.dial(ChannelKind::Control, &self.url, self.generation, events));
        self.state = ChannelState::Connecting;
    }

    /// React to an event from a control socket
    pub fn handle_event<T, U>(
        &mut self,
        generation: u64,
        event: SocketEvent,
        writer: &mut OutputWriter<T>,
        ui: &mut U,
    ) where
        T: TerminalSurface,
        U: UiShell,
    {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Ignoring event from superseded control socket"
            );
            return;
        }

        match event {
            SocketEvent::Opened => {
                tracing::info!("Control channel open");
                self.state = ChannelState::Open;
                writer.write_status("Control channel open.");
            }

            SocketEvent::Text(text) => self.handle_text(&text, writer, ui),

            SocketEvent::Error(reason) => {
                tracing::warn!("Control channel error: {}", reason);
                self.state = ChannelState::Errored;
                ui.dismiss(DialogKind::InProgress);
                writer.write_status("Control channel error.");
            }

            SocketEvent::Closed { reason } => {
                tracing::info!(?reason, "Control channel closed");
                self.state = ChannelState::Closed;
                self.socket = None;
                ui.dismiss(DialogKind::InProgress);
                ui.dismiss(DialogKind::ConnectionSetup);
                writer.write_status(&closed_status("Control", reason.as_deref()));
            }
        }
    }

    fn handle_text<T, U>(&mut self, text: &str, writer: &mut OutputWriter<T>, ui: &mut U)
    where
        T: TerminalSurface,
        U: UiShell,
    {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) if e.is_forward_compatible() => {
                tracing::debug!("Dropping control message: {}", e);
                return;
            }
            Err(e) => {
                tracing::warn!("Malformed control envelope: {}", e);
                return;
            }
        };

        tracing::debug!(message_type = %message.message_type(), "Control message");

        match message {
            Message::Info(info) => match announced_host(&info) {
                Some(host) => {
                    tracing::info!("Session host announced: {}", host);
                    self.session_host = Some(host.to_string());
                }
                None => writer.write_status(&info),
            },

            Message::Peers(peers) => {
                let directory = PeerDirectory::from_snapshot(peers);
                tracing::info!("Received {} peers", directory.len());
                ui.publish_peers(&directory);
                ui.show(Dialog::ConnectionSetup);
                self.peers = Some(directory);
            }

            other => {
                tracing::debug!(
                    message_type = %other.message_type(),
                    "Ignoring message not handled on the control channel"
                );
            }
        }
    }

    /// Relay a session target to the backend
    ///
    /// Goes to the session channel when one is live, so a resubmission after
    /// a failed attempt reaches the backend that is actually serving it.
    pub fn submit_config(
        &self,
        target: &SessionTarget,
        session: &SessionChannel,
    ) -> Result<SubmitRoute, ChannelError> {
        let wire = Message::SshConfig(target.clone()).encode();

        if session.is_live() {
            tracing::info!("Submitting session config on the session channel");
            session.send_wire(wire)?;
            return Ok(SubmitRoute::Session);
        }

        let socket = self.socket.as_ref().ok_or(ChannelError::NotConnected)?;
        tracing::info!("Submitting session config on the control channel");
        socket.send(wire)?;

        Ok(SubmitRoute::Deferred {
            connect_in: self.session_connect_delay,
        })
    }

    /// Echo a session lifecycle change to the backend
    ///
    /// Best effort; a failure is only logged.
    pub fn notify(&self, notice: LifecycleNotice) {
        let message = match notice {
            LifecycleNotice::Opened => Message::SessionOpened,
            LifecycleNotice::Errored => Message::SessionErrored,
        };

        let Some(socket) = &self.socket else {
            tracing::debug!(?notice, "No control socket to notify");
            return;
        };

        if let Err(e) = socket.send(message.encode()) {
            tracing::debug!(?notice, "Failed to notify control channel: {}", e);
        }
    }

    /// Close the socket, whatever its state
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            tracing::debug!("Closing control channel");
            socket.close();
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn peers(&self) -> Option<&PeerDirectory> {
        self.peers.as_ref()
    }

    /// Host announced for the session endpoint, if any yet
    pub fn session_host(&self) -> Option<&str> {
        self.session_host.as_deref()
    }
}

/// Host named by an announcement, e.g. `"lab"` from
/// `"Tailscale machine lab at 100.64.0.2 fd7a::2"`
fn announced_host(info: &str) -> Option<&str> {
    info.strip_prefix(MACHINE_ANNOUNCEMENT)?
        .split_whitespace()
        .next()
}

pub(crate) fn closed_status(channel: &str, reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} channel closed. {}", channel, reason),
        None => format!("{} channel closed.", channel),
    }
}
