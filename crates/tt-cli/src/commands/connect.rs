//! Connect command implementation
//!
//! Attaches the local terminal to a ts-term session: raw mode on, keys and
//! resizes forwarded into the client loop, output written straight to stdout.

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyModifiers,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::ExecutableCommand;
use tokio_util::sync::CancellationToken;

use crate::console::{ConsoleSurface, FormDefaults, PromptShell};
use crate::output::{print_info, print_success, print_warning};
use tt_client::{Client, ClientEvent, ClientExit, ClientSender, WsDialer};
use tt_core::config::ClientConfig;

/// Poll interval of the blocking terminal reader
const INPUT_POLL: Duration = Duration::from_millis(10);

/// Restores the terminal even if the session bails out early
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let _ = std::io::stdout().execute(EnableBracketedPaste);
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = std::io::stdout().execute(DisableBracketedPaste);
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("Failed to restore terminal: {}", e);
        }
    }
}

/// Ctrl+] detaches
fn is_detach(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(']')
}

/// Execute the connect command - open the control channel and attach
pub async fn connect_command(config: ClientConfig, machine: Option<String>) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    print_info(&format!(
        "Connecting to {} (press Ctrl+] to detach)",
        config.control_url()
    ));

    let defaults = FormDefaults {
        port: config.default_port,
        username: config.default_username.clone(),
        address_kind: config.address_kind,
        machine,
    };

    let guard = RawModeGuard::enable()?;

    let shell = PromptShell::new(std::io::stdout(), defaults);
    let mut client = Client::new(config, WsDialer, ConsoleSurface::stdout(), shell);
    let cancel = CancellationToken::new();

    let reader = spawn_input_reader(client.sender(), cancel.clone());
    spawn_signal_handler(cancel.clone());

    let exit = client.run(cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = reader.await {
        tracing::warn!("Terminal reader failed: {}", e);
    }
    drop(guard);

    println!();
    match exit {
        ClientExit::Detached => print_success("Detached from session"),
        ClientExit::SessionEnded => print_success("Session ended"),
        ClientExit::ControlEnded => {
            print_warning("Control channel closed before a session was started")
        }
    }

    Ok(())
}

/// Forward terminal events into the client loop until cancelled
fn spawn_input_reader(
    events: ClientSender,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !cancel.is_cancelled() {
            match event::poll(INPUT_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!("Terminal poll failed: {}", e);
                    break;
                }
            }

            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Terminal read failed: {}", e);
                    break;
                }
            };

            let forwarded = match event {
                Event::Key(key) if is_detach(&key) => {
                    tracing::info!("Detach requested");
                    cancel.cancel();
                    break;
                }
                Event::Key(key) => ClientEvent::Key(key),
                Event::Paste(text) => ClientEvent::Paste(text),
                Event::Resize(cols, rows) => ClientEvent::Resize { rows, cols },
                _ => continue,
            };

            if events.send(forwarded).is_err() {
                break;
            }
        }
    })
}

/// Detach on SIGINT/SIGTERM delivered from outside the terminal
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, detaching"),
            _ = terminate => tracing::info!("Received SIGTERM, detaching"),
            _ = cancel.cancelled() => return,
        }

        cancel.cancel();
    });
}
