//! Session channel manager
//!
//! Second-phase connection to the session endpoint announced on the control
//! channel. Carries keystrokes out and terminal output, host-trust prompts and
//! authentication results in.

use tt_core::{ChannelError, ChannelKind, ChannelState, Dialog, DialogKind, SessionError};
use tt_protocol::{HostAction, Message, TerminalGeometry};

use crate::client::ClientSender;
use crate::control::{closed_status, ControlChannel, LifecycleNotice};
use crate::output::{OutputWriter, TerminalSurface};
use crate::shell::UiShell;
use crate::socket::{Dialer, SocketEvent, SocketHandle};

/// Something the client loop needs to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The backend is waiting for a host-trust answer
    HostDecisionRequested,
    /// The backend confirmed the session; host trust is no longer pending
    Established,
    /// The session socket closed
    Ended,
}

/// Owns the session socket
pub struct SessionChannel {
    url: Option<String>,
    state: ChannelState,
    socket: Option<SocketHandle>,
    generation: u64,
    host_trust_pending: bool,
}

impl SessionChannel {
    pub fn new() -> Self {
        Self {
            url: None,
            state: ChannelState::Idle,
            socket: None,
            generation: 0,
            host_trust_pending: false,
        }
    }

    /// Open a socket to the session endpoint, superseding any earlier one
    pub fn open<D: Dialer>(&mut self, url: &str, dialer: &mut D, events: ClientSender) {
        if let Some(old) = self.socket.take() {
            tracing::debug!(generation = old.generation(), "Superseding session socket");
            old.close();
        }

        self.generation += 1;
        self.host_trust_pending = false;
        tracing::info!("Opening session channel to {}", url);
        self.socket = Some(dialer.dial(ChannelKind::Session, url, self.generation, events));
        self.url = Some(url.to_string());
        self.state = ChannelState::Connecting;
    }

    /// React to an event from a session socket
    pub fn handle_event<T, U>(
        &mut self,
        generation: u64,
        event: SocketEvent,
        control: &ControlChannel,
        writer: &mut OutputWriter<T>,
        ui: &mut U,
    ) -> Option<SessionSignal>
    where
        T: TerminalSurface,
        U: UiShell,
    {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Ignoring event from superseded session socket"
            );
            return None;
        }

        match event {
            SocketEvent::Opened => {
                tracing::info!("Session channel open");
                self.state = ChannelState::Open;
                ui.dismiss(DialogKind::InProgress);
                control.notify(LifecycleNotice::Opened);
                writer.write_status("Session channel open.");
                None
            }

            SocketEvent::Text(text) => {
                ui.dismiss(DialogKind::InProgress);
                self.handle_text(&text, writer, ui)
            }

            SocketEvent::Error(reason) => {
                tracing::warn!("Session channel error: {}", reason);
                self.state = ChannelState::Errored;
                ui.dismiss(DialogKind::InProgress);
                control.notify(LifecycleNotice::Errored);
                writer.write_status("Session channel error.");
                None
            }

            SocketEvent::Closed { reason } => {
                tracing::info!(?reason, "Session channel closed");
                self.state = ChannelState::Closed;
                self.socket = None;
                self.host_trust_pending = false;
                ui.dismiss(DialogKind::InProgress);
                ui.dismiss(DialogKind::Error);
                writer.write_status(&closed_status("Session", reason.as_deref()));
                Some(SessionSignal::Ended)
            }
        }
    }

    fn handle_text<T, U>(
        &mut self,
        text: &str,
        writer: &mut OutputWriter<T>,
        ui: &mut U,
    ) -> Option<SessionSignal>
    where
        T: TerminalSurface,
        U: UiShell,
    {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) if e.is_forward_compatible() => {
                tracing::debug!("Dropping session message: {}", e);
                return None;
            }
            Err(e) => {
                tracing::warn!("Malformed session envelope: {}", e);
                return None;
            }
        };

        match message {
            Message::Output(data) => {
                tracing::trace!(len = data.len(), "Session output");
                writer.write(&data);
                None
            }

            Message::Info(info) => {
                writer.write_status(&info);
                None
            }

            Message::SshError(detail) => {
                tracing::warn!("Backend reported SSH error: {:?}", detail);
                ui.show(Dialog::Error { detail });
                None
            }

            Message::SshHost(host) => {
                tracing::info!("Backend asks to confirm host {}", host);
                self.host_trust_pending = true;
                ui.show(Dialog::HostConfirmation { host });
                Some(SessionSignal::HostDecisionRequested)
            }

            Message::SshSuccess => {
                tracing::info!("SSH session established");
                self.host_trust_pending = false;
                ui.dismiss(DialogKind::HostConfirmation);
                ui.dismiss(DialogKind::Error);
                ui.dismiss(DialogKind::ConnectionSetup);
                self.sync_geometry(writer.surface().geometry());
                Some(SessionSignal::Established)
            }

            Message::Error(detail) => {
                writer.write_status(&format!("Error: {}", detail));
                None
            }

            other => {
                tracing::debug!(
                    message_type = %other.message_type(),
                    "Ignoring message not handled on the session channel"
                );
                None
            }
        }
    }

    /// Forward keystrokes verbatim
    pub fn send_input(&self, data: &str) -> Result<(), SessionError> {
        if self.host_trust_pending {
            return Err(SessionError::HostTrustPending);
        }
        if self.state != ChannelState::Open {
            return Err(SessionError::NotOpen);
        }

        self.send_wire(Message::Input(data.to_string()).encode())?;
        Ok(())
    }

    /// Answer a host-trust prompt
    pub fn answer_host(&mut self, action: HostAction) -> Result<(), ChannelError> {
        self.host_trust_pending = false;
        tracing::info!("Answering host confirmation: {}", action.as_str());
        self.send_wire(Message::SshHostAction(action).encode())
    }

    /// Report the terminal geometry
    ///
    /// Returns `false` without sending anything when there is no live socket.
    pub fn sync_geometry(&self, geometry: TerminalGeometry) -> bool {
        if !self.is_live() {
            tracing::debug!("No session channel; skipping size sync");
            return false;
        }

        match self.send_wire(Message::Size(geometry).encode()) {
            Ok(()) => {
                tracing::debug!(rows = geometry.rows, cols = geometry.cols, "Sent size");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to send size: {}", e);
                false
            }
        }
    }

    /// Tell the backend the user gave up after an error
    ///
    /// Returns `false` if there is no session socket to carry it.
    pub fn report_abandoned(&self) -> bool {
        match &self.socket {
            Some(socket) => socket.send(Message::SessionErrored.encode()).is_ok(),
            None => false,
        }
    }

    pub(crate) fn send_wire(&self, wire: String) -> Result<(), ChannelError> {
        let socket = self.socket.as_ref().ok_or(ChannelError::NotConnected)?;
        socket.send(wire)
    }

    /// Close the socket, whatever its state
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            tracing::debug!("Closing session channel");
            socket.close();
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Connecting or open
    pub fn is_live(&self) -> bool {
        self.socket.is_some() && self.state.is_live()
    }

    pub fn is_awaiting_host_decision(&self) -> bool {
        self.host_trust_pending
    }
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}
