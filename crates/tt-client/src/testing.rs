//! Test doubles for the client's collaborators

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tt_core::{ChannelKind, Dialog, DialogKind, PeerDirectory};
use tt_protocol::TerminalGeometry;

use crate::client::{ClientEvent, ClientSender};
use crate::output::TerminalSurface;
use crate::shell::{KeyDisposition, UiShell};
use crate::socket::{Dialer, OutboundFrame, SocketHandle};

/// A recording dialer plus a sender whose receiver has already been dropped
pub(crate) fn harness() -> (RecordingDialer, ClientSender) {
    let (tx, _rx) = mpsc::unbounded_channel::<ClientEvent>();
    (RecordingDialer::default(), tx)
}

#[derive(Default)]
struct DialLog {
    dials: Vec<(ChannelKind, String)>,
    outbound: Vec<mpsc::UnboundedReceiver<OutboundFrame>>,
}

/// Dialer that never connects and records what was sent to each socket
#[derive(Clone, Default)]
pub(crate) struct RecordingDialer {
    log: Arc<Mutex<DialLog>>,
}

impl RecordingDialer {
    pub(crate) fn dialed(&self) -> Vec<(ChannelKind, String)> {
        self.log.lock().unwrap().dials.clone()
    }

    /// Frames queued so far on the `index`th dialed socket
    pub(crate) fn drain(&self, index: usize) -> Vec<OutboundFrame> {
        let mut log = self.log.lock().unwrap();
        let rx = &mut log.outbound[index];

        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

impl Dialer for RecordingDialer {
    fn dial(
        &mut self,
        kind: ChannelKind,
        url: &str,
        generation: u64,
        _events: ClientSender,
    ) -> SocketHandle {
        let (handle, rx) = SocketHandle::pair(generation);
        let mut log = self.log.lock().unwrap();
        log.dials.push((kind, url.to_string()));
        log.outbound.push(rx);
        handle
    }
}

/// Terminal surface that keeps everything written to it
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    written: String,
    geometry: TerminalGeometry,
}

impl RecordingSurface {
    pub(crate) fn with_geometry(geometry: TerminalGeometry) -> Self {
        Self {
            written: String::new(),
            geometry,
        }
    }

    pub(crate) fn text(&self) -> String {
        self.written.clone()
    }
}

impl TerminalSurface for RecordingSurface {
    fn write(&mut self, text: &str) {
        self.written.push_str(text);
    }

    fn geometry(&self) -> TerminalGeometry {
        self.geometry
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCall {
    Show(Dialog),
    Dismiss(DialogKind),
}

/// Shell that records every call and tracks which surfaces are showing
///
/// Pastes made while the connection form is showing are kept in `pasted`.
#[derive(Debug, Default)]
pub(crate) struct RecordingShell {
    pub(crate) log: Vec<ShellCall>,
    pub(crate) published: Vec<Vec<String>>,
    pub(crate) pasted: Vec<String>,
    open: Vec<Dialog>,
}

impl RecordingShell {
    pub(crate) fn showing(&self) -> Vec<DialogKind> {
        self.open.iter().map(Dialog::kind).collect()
    }

    pub(crate) fn is_showing(&self, kind: DialogKind) -> bool {
        self.open.iter().any(|d| d.kind() == kind)
    }

    pub(crate) fn dismissed(&self, kind: DialogKind) -> bool {
        self.log.contains(&ShellCall::Dismiss(kind))
    }

    pub(crate) fn last_shown(&self) -> Option<&Dialog> {
        self.log.iter().rev().find_map(|call| match call {
            ShellCall::Show(dialog) => Some(dialog),
            ShellCall::Dismiss(_) => None,
        })
    }
}

impl UiShell for RecordingShell {
    fn show(&mut self, dialog: Dialog) {
        self.open.retain(|d| d.kind() != dialog.kind());
        self.open.push(dialog.clone());
        self.log.push(ShellCall::Show(dialog));
    }

    fn dismiss(&mut self, kind: DialogKind) {
        self.open.retain(|d| d.kind() != kind);
        self.log.push(ShellCall::Dismiss(kind));
    }

    fn publish_peers(&mut self, peers: &PeerDirectory) {
        self.published
            .push(peers.short_names().into_iter().map(String::from).collect());
    }

    fn handle_paste(&mut self, text: &str) -> KeyDisposition {
        if !self.is_showing(DialogKind::ConnectionSetup) {
            return KeyDisposition::PassThrough;
        }
        self.pasted.push(text.to_string());
        KeyDisposition::Consumed
    }
}
