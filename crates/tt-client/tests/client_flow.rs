//! End-to-end client scenarios driven through a scripted dialer
//!
//! No real sockets: the test plays the server by injecting socket events into
//! the client and inspecting the frames it queued on each socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio::time::Instant;

use tt_client::{
    Client, ClientEvent, ClientExit, ClientSender, Dialer, KeyDisposition, OutboundFrame,
    SocketEvent, SocketHandle, SocketNotice, TerminalSurface, UiAction, UiShell,
};
use tt_core::config::ClientConfig;
use tt_core::{ChannelKind, ChannelState, Dialog, DialogKind, PeerDirectory};
use tt_protocol::{encode, HostAction, Message, MessageType, SessionTarget, TerminalGeometry};

#[derive(Default)]
struct Sockets {
    urls: Vec<(ChannelKind, String)>,
    outbound: Vec<mpsc::UnboundedReceiver<OutboundFrame>>,
}

#[derive(Clone, Default)]
struct ScriptedDialer(Arc<Mutex<Sockets>>);

impl ScriptedDialer {
    fn urls(&self) -> Vec<(ChannelKind, String)> {
        self.0.lock().unwrap().urls.clone()
    }

    /// Decoded text frames queued on socket `index`
    fn sent(&self, index: usize) -> Vec<Message> {
        let mut sockets = self.0.lock().unwrap();
        let mut messages = Vec::new();
        while let Ok(frame) = sockets.outbound[index].try_recv() {
            if let OutboundFrame::Text(text) = frame {
                messages.push(Message::decode(&text).unwrap());
            }
        }
        messages
    }
}

impl Dialer for ScriptedDialer {
    fn dial(&mut self, kind: ChannelKind, url: &str, generation: u64, _events: ClientSender) -> SocketHandle {
        let (handle, rx) = SocketHandle::pair(generation);
        let mut sockets = self.0.lock().unwrap();
        sockets.urls.push((kind, url.to_string()));
        sockets.outbound.push(rx);
        handle
    }
}

#[derive(Default)]
struct Screen(String);

impl TerminalSurface for Screen {
    fn write(&mut self, text: &str) {
        self.0.push_str(text);
    }

    fn geometry(&self) -> TerminalGeometry {
        TerminalGeometry::new(40, 132, 1056, 800)
    }
}

/// Shell answering host confirmation with `y`/`n` keys
///
/// Pastes while the connection form is open are kept as form input.
#[derive(Default)]
struct Dialogs {
    open: Vec<DialogKind>,
    peers: Vec<String>,
    form_input: String,
}

impl UiShell for Dialogs {
    fn show(&mut self, dialog: Dialog) {
        self.open.retain(|k| *k != dialog.kind());
        self.open.push(dialog.kind());
    }

    fn dismiss(&mut self, kind: DialogKind) {
        self.open.retain(|k| *k != kind);
    }

    fn publish_peers(&mut self, peers: &PeerDirectory) {
        self.peers = peers.iter().map(|p| p.label()).collect();
    }

    fn handle_key(&mut self, key: &KeyEvent) -> KeyDisposition {
        if !self.open.contains(&DialogKind::HostConfirmation) {
            return KeyDisposition::PassThrough;
        }
        match key.code {
            KeyCode::Char('y') => KeyDisposition::Action(UiAction::HostDecision(HostAction::Yes)),
            KeyCode::Char('n') => KeyDisposition::Action(UiAction::HostDecision(HostAction::No)),
            _ => KeyDisposition::Consumed,
        }
    }

    fn handle_paste(&mut self, text: &str) -> KeyDisposition {
        if !self.open.contains(&DialogKind::ConnectionSetup) {
            return KeyDisposition::PassThrough;
        }
        self.form_input.push_str(text);
        KeyDisposition::Consumed
    }
}

type TestClient = Client<ScriptedDialer, Screen, Dialogs>;

fn new_client() -> (TestClient, ScriptedDialer) {
    let config = ClientConfig {
        server: "localhost:3000".into(),
        ..Default::default()
    };
    let dialer = ScriptedDialer::default();
    let mut client = Client::new(config, dialer.clone(), Screen::default(), Dialogs::default());
    client.start();
    (client, dialer)
}

fn inject(client: &mut TestClient, kind: ChannelKind, event: SocketEvent) {
    client.handle_event(ClientEvent::Socket(SocketNotice {
        kind,
        generation: 1,
        event,
    }));
}

fn server_says(client: &mut TestClient, kind: ChannelKind, message_type: MessageType, data: &str) {
    inject(client, kind, SocketEvent::Text(encode(message_type, data)));
}

fn key(c: char) -> ClientEvent {
    ClientEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

const PEERS: &str = r#"[
    {"shortDomain":"web","domain":"web.tail1234.ts.net.","ips":["100.64.0.3","fd7a:115c::3"]},
    {"shortDomain":"lab","domain":"lab.tail1234.ts.net.","ips":["100.64.0.2"]}
]"#;

#[tokio::test(start_paused = true)]
async fn test_two_phase_connect() {
    let (mut client, dialer) = new_client();

    assert_eq!(
        dialer.urls(),
        vec![(ChannelKind::Control, "ws://localhost:3000/ts".to_string())]
    );

    inject(&mut client, ChannelKind::Control, SocketEvent::Opened);
    server_says(
        &mut client,
        ChannelKind::Control,
        MessageType::Info,
        "Tailscale machine ts-term-9c1d at 100.64.0.9 fd7a:115c::9",
    );
    server_says(&mut client, ChannelKind::Control, MessageType::Peers, PEERS);

    assert_eq!(client.ui().peers, vec!["lab [100.64.0.2]", "web [100.64.0.3]"]);
    assert_eq!(client.ui().open, vec![DialogKind::ConnectionSetup]);

    let target = SessionTarget::new("lab", 22, "alice", "s3cret:with:colons");
    client.handle_event(ClientEvent::Ui(UiAction::SubmitConfig(target.clone())));

    assert_eq!(dialer.sent(0), vec![Message::SshConfig(target)]);
    assert!(client.ui().open.contains(&DialogKind::InProgress));

    // Nothing is dialed until the provisioning delay has passed
    client.on_timers(Instant::now());
    assert_eq!(dialer.urls().len(), 1);

    tokio::time::advance(Duration::from_millis(1000)).await;
    client.on_timers(Instant::now());
    assert_eq!(
        dialer.urls()[1],
        (ChannelKind::Session, "ws://ts-term-9c1d".to_string())
    );

    // Keystrokes before the session opens go nowhere
    client.handle_event(key('q'));

    inject(&mut client, ChannelKind::Session, SocketEvent::Opened);
    assert_eq!(dialer.sent(0), vec![Message::SessionOpened]);
    assert!(!client.ui().open.contains(&DialogKind::InProgress));

    server_says(&mut client, ChannelKind::Session, MessageType::SshSuccess, "");
    server_says(&mut client, ChannelKind::Session, MessageType::Output, "alice@lab:~$ ");
    client.handle_event(key('l'));
    client.handle_event(key('s'));

    assert_eq!(
        dialer.sent(1),
        vec![
            Message::Size(TerminalGeometry::new(40, 132, 1056, 800)),
            Message::Input("l".into()),
            Message::Input("s".into()),
        ]
    );

    inject(
        &mut client,
        ChannelKind::Session,
        SocketEvent::Closed {
            reason: Some("session ended".into()),
        },
    );
    assert_eq!(client.exit(), Some(ClientExit::SessionEnded));

    let screen = &client.writer().surface().0;
    assert!(screen.starts_with("Welcome to \x1B[1;3;32mts-term\x1B[0m \r\n"));
    assert!(screen.ends_with("alice@lab:~$ \r\nSession channel closed. session ended\r\n"));
}

#[tokio::test(start_paused = true)]
async fn test_host_confirmation_gates_input() {
    let (mut client, dialer) = new_client();
    inject(&mut client, ChannelKind::Control, SocketEvent::Opened);
    server_says(
        &mut client,
        ChannelKind::Control,
        MessageType::Info,
        "Tailscale machine ts-term-9c1d at 100.64.0.9",
    );
    client.handle_event(ClientEvent::Ui(UiAction::SubmitConfig(SessionTarget::new(
        "web", 2222, "bob", "pw",
    ))));
    tokio::time::advance(Duration::from_secs(1)).await;
    client.on_timers(Instant::now());
    inject(&mut client, ChannelKind::Session, SocketEvent::Opened);

    server_says(
        &mut client,
        ChannelKind::Session,
        MessageType::SshHost,
        "web.tail1234.ts.net:2222 ssh-ed25519 SHA256:3f...",
    );
    assert!(client.session().is_awaiting_host_decision());
    assert_eq!(client.ui().open, vec![DialogKind::HostConfirmation]);

    // Keys are swallowed by the confirmation until it is answered
    client.handle_event(key('x'));
    assert!(dialer.sent(1).is_empty());

    client.handle_event(key('y'));
    assert_eq!(dialer.sent(1), vec![Message::SshHostAction(HostAction::Yes)]);
    assert_eq!(client.ui().open, vec![DialogKind::InProgress]);

    server_says(&mut client, ChannelKind::Session, MessageType::SshSuccess, "");
    assert!(client.ui().open.is_empty());
    client.handle_event(key('x'));

    assert_eq!(
        dialer.sent(1),
        vec![
            Message::Size(TerminalGeometry::new(40, 132, 1056, 800)),
            Message::Input("x".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_error_retry_cycle() {
    let (mut client, dialer) = new_client();
    inject(&mut client, ChannelKind::Control, SocketEvent::Opened);
    server_says(
        &mut client,
        ChannelKind::Control,
        MessageType::Info,
        "Tailscale machine ts-term-9c1d at 100.64.0.9",
    );
    client.handle_event(ClientEvent::Ui(UiAction::SubmitConfig(SessionTarget::new(
        "lab", 22, "alice", "wrong",
    ))));
    tokio::time::advance(Duration::from_secs(1)).await;
    client.on_timers(Instant::now());
    inject(&mut client, ChannelKind::Session, SocketEvent::Opened);
    dialer.sent(0);

    server_says(&mut client, ChannelKind::Session, MessageType::SshError, "");
    assert_eq!(client.ui().open, vec![DialogKind::Error]);
    assert_eq!(client.session().state(), ChannelState::Open);

    client.handle_event(ClientEvent::Ui(UiAction::RetryAfterError));
    assert_eq!(client.ui().open, vec![DialogKind::ConnectionSetup]);

    let corrected = SessionTarget::new("lab", 22, "alice", "right");
    client.handle_event(ClientEvent::Ui(UiAction::SubmitConfig(corrected.clone())));

    assert!(dialer.sent(0).is_empty());
    assert_eq!(dialer.sent(1), vec![Message::SshConfig(corrected)]);
    assert_eq!(dialer.urls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_paste_during_retry_form_is_not_sent_as_input() {
    let (mut client, dialer) = new_client();
    inject(&mut client, ChannelKind::Control, SocketEvent::Opened);
    server_says(
        &mut client,
        ChannelKind::Control,
        MessageType::Info,
        "Tailscale machine ts-term-9c1d at 100.64.0.9",
    );
    client.handle_event(ClientEvent::Ui(UiAction::SubmitConfig(SessionTarget::new(
        "lab", 22, "alice", "wrong",
    ))));
    tokio::time::advance(Duration::from_secs(1)).await;
    client.on_timers(Instant::now());
    inject(&mut client, ChannelKind::Session, SocketEvent::Opened);
    server_says(&mut client, ChannelKind::Session, MessageType::SshError, "");
    client.handle_event(ClientEvent::Ui(UiAction::RetryAfterError));
    assert_eq!(client.ui().open, vec![DialogKind::ConnectionSetup]);
    assert_eq!(client.session().state(), ChannelState::Open);

    client.handle_event(ClientEvent::Paste("s3cretPassw0rd".into()));

    assert!(dialer.sent(1).is_empty());
    assert_eq!(client.ui().form_input, "s3cretPassw0rd");

    // Once the form is gone, pastes reach the remote shell again
    let corrected = SessionTarget::new("lab", 22, "alice", "s3cretPassw0rd");
    client.handle_event(ClientEvent::Ui(UiAction::SubmitConfig(corrected.clone())));
    server_says(&mut client, ChannelKind::Session, MessageType::SshSuccess, "");
    client.handle_event(ClientEvent::Paste("uptime\r".into()));

    assert_eq!(
        dialer.sent(1),
        vec![
            Message::SshConfig(corrected),
            Message::Size(TerminalGeometry::new(40, 132, 1056, 800)),
            Message::Input("uptime\r".into()),
        ]
    );
}

#[test]
fn test_control_failure_before_peers() {
    let (mut client, _dialer) = new_client();

    inject(&mut client, ChannelKind::Control, SocketEvent::Error("connection refused".into()));
    inject(&mut client, ChannelKind::Control, SocketEvent::Closed { reason: None });

    assert_eq!(client.control().state(), ChannelState::Closed);
    assert_eq!(client.exit(), Some(ClientExit::ControlEnded));
    assert!(client
        .writer()
        .surface()
        .0
        .ends_with("Control channel error.\r\nControl channel closed.\r\n"));
}
