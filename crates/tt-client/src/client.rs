//! Client event loop
//!
//! Everything the client reacts to (socket events, keys, resizes, dialog
//! decisions) arrives on one inbox and is handled in arrival order on a
//! single task. Timers (deferred session connect, resize debounce, host-trust
//! timeout) are plain deadlines checked by the same loop, so no handler ever
//! runs concurrently with another.

use std::future::Future;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use tt_core::config::ClientConfig;
use tt_core::{ChannelKind, ChannelState, Dialog, DialogKind};
use tt_protocol::{HostAction, SessionTarget};

use crate::control::{ControlChannel, LifecycleNotice, SubmitRoute};
use crate::debounce::Debouncer;
use crate::keys::key_to_input;
use crate::output::{OutputWriter, TerminalSurface};
use crate::session::{SessionChannel, SessionSignal};
use crate::shell::{KeyDisposition, UiAction, UiShell};
use crate::socket::{Dialer, SocketNotice};

const WELCOME_BANNER: &str = "Welcome to \x1B[1;3;32mts-term\x1B[0m \r\n";

/// Input to the client loop
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Something happened on one of the sockets
    Socket(SocketNotice),
    /// Key pressed in the terminal
    Key(KeyEvent),
    /// Text pasted into the terminal
    Paste(String),
    /// Terminal resized
    Resize { rows: u16, cols: u16 },
    /// Decision made through a dialog outside the key path
    Ui(UiAction),
}

/// Sending half of the client inbox
pub type ClientSender = mpsc::UnboundedSender<ClientEvent>;

/// Why the client loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    /// The user detached
    Detached,
    /// The session channel closed
    SessionEnded,
    /// The control channel closed before any session was started
    ControlEnded,
}

/// Orchestrates the control and session channels for one terminal
pub struct Client<D, T, U> {
    config: ClientConfig,
    dialer: D,
    writer: OutputWriter<T>,
    ui: U,
    control: ControlChannel,
    session: SessionChannel,
    events_tx: ClientSender,
    events_rx: mpsc::UnboundedReceiver<ClientEvent>,
    deferred_connect: Option<Instant>,
    resize: Debouncer<(u16, u16)>,
    host_trust_deadline: Option<Instant>,
    exit: Option<ClientExit>,
}

impl<D, T, U> Client<D, T, U>
where
    D: Dialer,
    T: TerminalSurface,
    U: UiShell,
{
    pub fn new(config: ClientConfig, dialer: D, surface: T, ui: U) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let control = ControlChannel::new(config.control_url(), config.session_connect_delay);
        let resize = Debouncer::new(config.resize_debounce);

        Self {
            config,
            dialer,
            writer: OutputWriter::new(surface),
            ui,
            control,
            session: SessionChannel::new(),
            events_tx,
            events_rx,
            deferred_connect: None,
            resize,
            host_trust_deadline: None,
            exit: None,
        }
    }

    /// Handle for feeding events into the loop
    pub fn sender(&self) -> ClientSender {
        self.events_tx.clone()
    }

    /// Greet the user and open the control channel
    pub fn start(&mut self) {
        self.writer.write(WELCOME_BANNER);
        self.control.connect(&mut self.dialer, self.events_tx.clone());
    }

    /// Run until detached (via `cancel`) or until the channels end
    ///
    /// Both sockets are closed before returning.
    pub async fn run(&mut self, cancel: CancellationToken) -> ClientExit {
        if self.control.state() == ChannelState::Idle {
            self.start();
        }

        let exit = loop {
            if let Some(exit) = self.exit {
                break exit;
            }

            let deadline = self.next_deadline();

            tokio::select! {
                _ = cancel.cancelled() => break ClientExit::Detached,

                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break ClientExit::Detached,
                },

                _ = sleep_until(deadline) => self.on_timers(Instant::now()),
            }
        };

        tracing::info!(?exit, "Client loop finished");
        self.shutdown();
        exit
    }

    /// Handle one inbox event
    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Socket(notice) => self.handle_socket(notice),
            ClientEvent::Key(key) => self.handle_key(key),
            ClientEvent::Paste(text) => self.handle_paste(&text),
            ClientEvent::Resize { rows, cols } => {
                tracing::trace!(rows, cols, "Terminal resized");
                self.resize.push((rows, cols), Instant::now());
            }
            ClientEvent::Ui(action) => self.handle_ui(action),
        }
    }

    fn handle_socket(&mut self, notice: SocketNotice) {
        let SocketNotice {
            kind,
            generation,
            event,
        } = notice;

        match kind {
            ChannelKind::Control => {
                self.control
                    .handle_event(generation, event, &mut self.writer, &mut self.ui);
                self.check_control_ended();
            }
            ChannelKind::Session => {
                let signal = self.session.handle_event(
                    generation,
                    event,
                    &self.control,
                    &mut self.writer,
                    &mut self.ui,
                );
                if let Some(signal) = signal {
                    self.handle_session_signal(signal);
                }
            }
        }
    }

    fn handle_session_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::HostDecisionRequested => {
                self.host_trust_deadline = self
                    .config
                    .host_trust_timeout
                    .map(|timeout| Instant::now() + timeout);
            }
            SessionSignal::Established => self.host_trust_deadline = None,
            SessionSignal::Ended => {
                self.host_trust_deadline = None;
                self.resize.cancel();
                self.exit = Some(ClientExit::SessionEnded);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.ui.handle_key(&key) {
            KeyDisposition::PassThrough => {
                if let Some(input) = key_to_input(&key) {
                    self.forward_input(&input);
                }
            }
            KeyDisposition::Consumed => {}
            KeyDisposition::Action(action) => self.handle_ui(action),
        }
    }

    fn handle_paste(&mut self, text: &str) {
        match self.ui.handle_paste(text) {
            KeyDisposition::PassThrough => self.forward_input(text),
            KeyDisposition::Consumed => {}
            KeyDisposition::Action(action) => self.handle_ui(action),
        }
    }

    fn forward_input(&mut self, input: &str) {
        if let Err(e) = self.session.send_input(input) {
            tracing::debug!("Dropping input: {}", e);
        }
    }

    fn handle_ui(&mut self, action: UiAction) {
        match action {
            UiAction::SubmitConfig(target) => self.submit_config(&target),

            UiAction::HostDecision(action) => {
                self.host_trust_deadline = None;
                self.ui.dismiss(DialogKind::HostConfirmation);
                self.ui.show(Dialog::InProgress);
                if let Err(e) = self.session.answer_host(action) {
                    tracing::warn!("Failed to answer host confirmation: {}", e);
                    self.ui.dismiss(DialogKind::InProgress);
                    self.writer
                        .write_status(&format!("Failed to answer host confirmation: {}", e));
                }
            }

            UiAction::RetryAfterError => {
                self.ui.dismiss(DialogKind::Error);
                self.ui.show(Dialog::ConnectionSetup);
            }

            UiAction::CancelAfterError => {
                self.ui.dismiss(DialogKind::Error);
                if !self.session.report_abandoned() {
                    self.control.notify(LifecycleNotice::Errored);
                }
                self.writer.write_status("Session channel error.");
            }
        }
    }

    fn submit_config(&mut self, target: &SessionTarget) {
        tracing::info!(
            "Connecting to {}:{} as {}",
            target.address,
            target.port,
            target.username
        );
        self.ui.show(Dialog::InProgress);

        match self.control.submit_config(target, &self.session) {
            Ok(SubmitRoute::Deferred { connect_in }) => {
                // A newer submission replaces any pending connect
                self.deferred_connect = Some(Instant::now() + connect_in);
            }
            Ok(SubmitRoute::Session) => {}
            Err(e) => {
                tracing::warn!("Failed to submit session config: {}", e);
                self.ui.dismiss(DialogKind::InProgress);
                self.writer
                    .write_status(&format!("Failed to submit connection settings: {}", e));
            }
        }
    }

    /// Fire every timer that is due at `now`
    pub fn on_timers(&mut self, now: Instant) {
        if self.deferred_connect.is_some_and(|at| at <= now) {
            self.deferred_connect = None;
            self.open_session();
        }

        if let Some((rows, cols)) = self.resize.take_due(now) {
            let mut geometry = self.writer.surface().geometry();
            geometry.rows = rows;
            geometry.cols = cols;
            self.session.sync_geometry(geometry);
        }

        if self.host_trust_deadline.is_some_and(|at| at <= now) {
            self.host_trust_deadline = None;
            self.host_trust_timed_out();
        }
    }

    fn open_session(&mut self) {
        let url = self
            .control
            .session_host()
            .map(|host| self.config.session_url(host));

        match url {
            Some(url) => self
                .session
                .open(&url, &mut self.dialer, self.events_tx.clone()),
            None => {
                tracing::warn!("Deferred connect fired before any session host was announced");
                self.ui.dismiss(DialogKind::InProgress);
                self.writer
                    .write_status("No session host announced by the server.");
                self.check_control_ended();
            }
        }
    }

    fn host_trust_timed_out(&mut self) {
        if !self.session.is_awaiting_host_decision() {
            return;
        }

        tracing::warn!("Host confirmation timed out; rejecting host");
        self.ui.dismiss(DialogKind::HostConfirmation);
        if let Err(e) = self.session.answer_host(HostAction::No) {
            tracing::debug!("Failed to reject host: {}", e);
        }
        self.writer.write_status("Host confirmation timed out.");
    }

    fn check_control_ended(&mut self) {
        if self.control.state() == ChannelState::Closed
            && self.session.state() == ChannelState::Idle
            && self.deferred_connect.is_none()
        {
            self.exit = Some(ClientExit::ControlEnded);
        }
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.deferred_connect,
            self.resize.deadline(),
            self.host_trust_deadline,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Close both sockets, whatever their state
    pub fn shutdown(&mut self) {
        self.deferred_connect = None;
        self.resize.cancel();
        self.session.close();
        self.control.close();
    }

    pub fn exit(&self) -> Option<ClientExit> {
        self.exit
    }

    pub fn control(&self) -> &ControlChannel {
        &self.control
    }

    pub fn session(&self) -> &SessionChannel {
        &self.session
    }

    pub fn writer(&self) -> &OutputWriter<T> {
        &self.writer
    }

    pub fn surface_mut(&mut self) -> &mut T {
        self.writer.surface_mut()
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }
}

fn sleep_until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}
