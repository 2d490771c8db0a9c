//! One-shot peer listing
//!
//! Opens only the control channel, waits for the `peers` snapshot and closes.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use tt_core::PeerDirectory;
use tt_protocol::Message;

/// Fetch the peer directory from a control endpoint
pub async fn fetch_peers(url: &str, timeout: Duration) -> Result<PeerDirectory> {
    tokio::time::timeout(timeout, fetch(url))
        .await
        .map_err(|_| anyhow!("Timed out after {:?} waiting for peers from {}", timeout, url))?
}

async fn fetch(url: &str) -> Result<PeerDirectory> {
    let (mut ws, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to connect to {}", url))?;

    tracing::debug!("Connected to {}, waiting for peers", url);

    while let Some(frame) = ws.next().await {
        let text = match frame.context("Control channel read failed")? {
            WsMessage::Text(text) => text,
            WsMessage::Close(frame) => {
                let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                bail!("Control channel closed before sending peers. {}", reason);
            }
            _ => continue,
        };

        match Message::decode(&text) {
            Ok(Message::Peers(peers)) => {
                let _ = ws.send(WsMessage::Close(None)).await;
                return Ok(PeerDirectory::from_snapshot(peers));
            }
            Ok(other) => {
                tracing::debug!(message_type = %other.message_type(), "Skipping message");
            }
            Err(e) => tracing::debug!("Skipping undecodable frame: {}", e),
        }
    }

    bail!("Control channel ended before sending peers")
}
