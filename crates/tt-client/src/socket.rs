//! WebSocket plumbing
//!
//! A [`Dialer`] opens a socket and hands back a [`SocketHandle`] for writing.
//! Everything the socket observes (open, text frames, errors, close) arrives
//! later as a [`SocketNotice`] in the client's inbox, tagged with the channel
//! and the socket generation so that a superseded socket can be ignored.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::connect_async;

use tt_core::{ChannelError, ChannelKind};

use crate::client::{ClientEvent, ClientSender};

/// Something a socket observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed
    Opened,
    /// One inbound text frame
    Text(String),
    /// Transport failure; a `Closed` always follows
    Error(String),
    /// Socket closed, with the peer's close reason if it gave one
    Closed { reason: Option<String> },
}

/// A socket event tagged with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketNotice {
    pub kind: ChannelKind,
    pub generation: u64,
    pub event: SocketEvent,
}

/// Frame queued for a socket's writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close,
}

/// Write side of one socket
///
/// Dropping every handle closes the socket.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    generation: u64,
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl SocketHandle {
    /// Create a handle plus the receiver its writer drains
    pub fn pair(generation: u64) -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { generation, tx }, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue one text frame
    pub fn send(&self, text: String) -> Result<(), ChannelError> {
        self.tx
            .send(OutboundFrame::Text(text))
            .map_err(|_| ChannelError::SendFailed("socket writer has stopped".into()))
    }

    /// Ask the socket to close; harmless if it already has
    pub fn close(&self) {
        let _ = self.tx.send(OutboundFrame::Close);
    }
}

/// Opens sockets
pub trait Dialer {
    /// Start connecting to `url`. Events are delivered to `events`.
    fn dial(
        &mut self,
        kind: ChannelKind,
        url: &str,
        generation: u64,
        events: ClientSender,
    ) -> SocketHandle;
}

/// Dialer backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDialer;

impl Dialer for WsDialer {
    fn dial(
        &mut self,
        kind: ChannelKind,
        url: &str,
        generation: u64,
        events: ClientSender,
    ) -> SocketHandle {
        let (handle, outbound) = SocketHandle::pair(generation);
        tokio::spawn(run_socket(kind, url.to_string(), generation, outbound, events));
        handle
    }
}

async fn run_socket(
    kind: ChannelKind,
    url: String,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    events: ClientSender,
) {
    let notify = |event: SocketEvent| {
        let _ = events.send(ClientEvent::Socket(SocketNotice {
            kind,
            generation,
            event,
        }));
    };

    tracing::debug!(channel = %kind, generation, "Connecting to {}", url);

    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::warn!(channel = %kind, "Failed to connect to {}: {}", url, e);
            notify(SocketEvent::Error(e.to_string()));
            notify(SocketEvent::Closed { reason: None });
            return;
        }
    };

    notify(SocketEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    let reason = loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(OutboundFrame::Text(text)) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        tracing::warn!(channel = %kind, "WebSocket send failed: {}", e);
                        notify(SocketEvent::Error(e.to_string()));
                        break None;
                    }
                }
                Some(OutboundFrame::Close) | None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    let _ = sink.close().await;
                    break None;
                }
            },

            msg = stream.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => notify(SocketEvent::Text(text)),
                Some(Ok(WsMessage::Binary(bytes))) => {
                    notify(SocketEvent::Text(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty());
                }
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(channel = %kind, "WebSocket read failed: {}", e);
                    notify(SocketEvent::Error(e.to_string()));
                    break None;
                }
                None => break None,
            },
        }
    };

    tracing::debug!(channel = %kind, generation, ?reason, "Socket closed");
    notify(SocketEvent::Closed { reason });
}
