//! Prompt-based dialogs
//!
//! Renders the client's modal surfaces as line prompts on the console. Only
//! one prompt is active at a time; while it is, key events go to the prompt
//! instead of the remote shell.

use std::io::Write;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use tt_client::{KeyDisposition, UiAction, UiShell};
use tt_core::{AddressKind, Dialog, DialogKind, PeerDirectory};
use tt_protocol::{HostAction, SessionTarget};

/// Values pre-filled in the connection form
#[derive(Debug, Clone)]
pub struct FormDefaults {
    pub port: u16,
    pub username: String,
    pub address_kind: AddressKind,
    /// Machine to select without asking, if it is among the peers
    pub machine: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Machine,
    Port,
    Username,
    Password,
}

#[derive(Debug)]
struct SetupForm {
    step: Step,
    line: String,
    address: String,
    port: u16,
    username: String,
}

#[derive(Debug)]
enum Prompt {
    Setup(SetupForm),
    Progress,
    HostConfirmation,
    Error,
}

impl Prompt {
    fn kind(&self) -> DialogKind {
        match self {
            Prompt::Setup(_) => DialogKind::ConnectionSetup,
            Prompt::Progress => DialogKind::InProgress,
            Prompt::HostConfirmation => DialogKind::HostConfirmation,
            Prompt::Error => DialogKind::Error,
        }
    }
}

/// Console implementation of the client's dialogs
pub struct PromptShell<W> {
    out: W,
    defaults: FormDefaults,
    peers: PeerDirectory,
    active: Option<Prompt>,
}

impl<W: Write> PromptShell<W> {
    pub fn new(out: W, defaults: FormDefaults) -> Self {
        Self {
            out,
            defaults,
            peers: PeerDirectory::default(),
            active: None,
        }
    }

    /// Kind of the prompt currently taking keys
    pub fn active(&self) -> Option<DialogKind> {
        self.active.as_ref().map(Prompt::kind)
    }

    pub fn address_kind(&self) -> AddressKind {
        self.defaults.address_kind
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write prompt: {}", e);
        }
    }

    fn start_setup(&mut self) {
        let preselected = self
            .defaults
            .machine
            .as_deref()
            .and_then(|m| self.peers.position(m))
            .and_then(|i| self.peers.address(i, self.defaults.address_kind))
            .map(str::to_string);

        let mut form = SetupForm {
            step: Step::Machine,
            line: String::new(),
            address: String::new(),
            port: self.defaults.port,
            username: self.defaults.username.clone(),
        };

        match preselected {
            Some(address) => {
                self.emit(&format!("\r\nConnecting to {}\r\n", address));
                form.address = address;
                form.step = Step::Port;
            }
            None => self.render_machines(),
        }

        let step = form.step;
        self.active = Some(Prompt::Setup(form));
        self.render_step(step);
    }

    fn render_machines(&mut self) {
        let mut text = String::from("\r\n");
        if self.peers.is_empty() {
            text.push_str("No peers reported; enter an address.\r\n");
        } else {
            text.push_str(&format!(
                "Machines (addresses: {}, Tab to change):\r\n",
                self.defaults.address_kind
            ));
            for (i, peer) in self.peers.iter().enumerate() {
                text.push_str(&format!("  {}) {}\r\n", i + 1, peer.label()));
            }
        }
        self.emit(&text);
    }

    fn render_step(&mut self, step: Step) {
        let prompt = match step {
            Step::Machine => "Machine: ".to_string(),
            Step::Port => format!("Port [{}]: ", self.defaults.port),
            Step::Username if self.defaults.username.is_empty() => "Username: ".to_string(),
            Step::Username => format!("Username [{}]: ", self.defaults.username),
            Step::Password => "Password: ".to_string(),
        };
        self.emit(&prompt);
    }

    fn cycle_address_kind(&mut self) {
        self.defaults.address_kind = match self.defaults.address_kind {
            AddressKind::Short => AddressKind::Full,
            AddressKind::Full => AddressKind::Ip,
            AddressKind::Ip => AddressKind::Short,
        };
        self.render_machines();
    }

    /// Resolve the machine field to an address
    fn machine_address(&self, input: &str) -> Option<String> {
        let kind = self.defaults.address_kind;

        if let Ok(n) = input.parse::<usize>() {
            if (1..=self.peers.len()).contains(&n) {
                return self.peers.address(n - 1, kind).map(str::to_string);
            }
        }

        if let Some(i) = self.peers.position(input) {
            return self.peers.address(i, kind).map(str::to_string);
        }

        // The wire form is colon-delimited, so a typed address cannot carry one
        if input.is_empty() || input.contains(':') {
            return None;
        }

        Some(input.to_string())
    }

    fn handle_setup_key(&mut self, key: &KeyEvent) -> KeyDisposition {
        let Some(Prompt::Setup(form)) = self.active.as_mut() else {
            return KeyDisposition::PassThrough;
        };
        let step = form.step;

        match key.code {
            KeyCode::Enter => return self.commit_step(),
            KeyCode::Tab if step == Step::Machine && !self.peers.is_empty() => {
                self.cycle_address_kind();
                let line = form_line(&self.active);
                self.emit(&format!("Machine: {}", line));
            }
            KeyCode::Backspace => {
                if form.line.pop().is_some() && step != Step::Password {
                    self.emit("\x08 \x08");
                }
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                form.line.push(c);
                if step != Step::Password {
                    self.emit(&c.to_string());
                }
            }
            _ => {}
        }

        KeyDisposition::Consumed
    }

    /// Append pasted text to the form line
    ///
    /// Only the first line is taken; submitting still needs Enter.
    fn paste_into_setup(&mut self, text: &str) {
        let Some(Prompt::Setup(form)) = self.active.as_mut() else {
            return;
        };

        let pasted: String = text
            .split(['\r', '\n'])
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_control())
            .collect();
        form.line.push_str(&pasted);

        if form.step != Step::Password {
            self.emit(&pasted);
        }
    }

    fn commit_step(&mut self) -> KeyDisposition {
        let Some(Prompt::Setup(form)) = self.active.as_mut() else {
            return KeyDisposition::PassThrough;
        };
        let input = std::mem::take(&mut form.line);
        let value = input.trim().to_string();
        let step = form.step;
        self.emit("\r\n");

        let next = match step {
            Step::Machine => match self.machine_address(&value) {
                Some(address) => {
                    set_form(&mut self.active, |f| f.address = address);
                    Step::Port
                }
                None => {
                    self.emit("Pick a number from the list or type an address.\r\n");
                    Step::Machine
                }
            },
            Step::Port if value.is_empty() => Step::Username,
            Step::Port => match value.parse::<u16>() {
                Ok(port) if port != 0 => {
                    set_form(&mut self.active, |f| f.port = port);
                    Step::Username
                }
                _ => {
                    self.emit(&format!("Invalid port {:?}.\r\n", value));
                    Step::Port
                }
            },
            Step::Username if value.is_empty() && self.defaults.username.is_empty() => {
                Step::Username
            }
            Step::Username => {
                if !value.is_empty() {
                    set_form(&mut self.active, |f| f.username = value);
                }
                Step::Password
            }
            Step::Password => {
                let Some(Prompt::Setup(form)) = self.active.take() else {
                    return KeyDisposition::Consumed;
                };
                let target = SessionTarget::new(form.address, form.port, form.username, input);
                return KeyDisposition::Action(UiAction::SubmitConfig(target));
            }
        };

        set_form(&mut self.active, |f| f.step = next);
        self.render_step(next);
        KeyDisposition::Consumed
    }

    fn answer_host(&mut self, key: &KeyEvent) -> KeyDisposition {
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => HostAction::Yes,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter | KeyCode::Esc => {
                HostAction::No
            }
            _ => return KeyDisposition::Consumed,
        };

        self.emit(&format!("{}\r\n", action.as_str()));
        self.active = None;
        KeyDisposition::Action(UiAction::HostDecision(action))
    }

    fn answer_error(&mut self, key: &KeyEvent) -> KeyDisposition {
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => UiAction::RetryAfterError,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => UiAction::CancelAfterError,
            _ => return KeyDisposition::Consumed,
        };

        self.emit("\r\n");
        self.active = None;
        KeyDisposition::Action(action)
    }
}

fn set_form(active: &mut Option<Prompt>, update: impl FnOnce(&mut SetupForm)) {
    if let Some(Prompt::Setup(form)) = active {
        update(form);
    }
}

fn form_line(active: &Option<Prompt>) -> String {
    match active {
        Some(Prompt::Setup(form)) => form.line.clone(),
        _ => String::new(),
    }
}

impl<W: Write> UiShell for PromptShell<W> {
    fn show(&mut self, dialog: Dialog) {
        tracing::debug!(kind = ?dialog.kind(), "Showing dialog");

        match dialog {
            Dialog::ConnectionSetup => self.start_setup(),
            Dialog::InProgress => {
                self.emit("\r\nConnecting...\r\n");
                self.active = Some(Prompt::Progress);
            }
            Dialog::HostConfirmation { host } => {
                self.emit(&format!(
                    "\r\nThe authenticity of host {} can't be established.\r\nTrust it and continue? [y/N] ",
                    host
                ));
                self.active = Some(Prompt::HostConfirmation);
            }
            Dialog::Error { detail } => {
                let detail = detail.trim();
                if detail.is_empty() {
                    self.emit("\r\nSSH connection failed.\r\n");
                } else {
                    self.emit(&format!("\r\nSSH connection failed: {}\r\n", detail));
                }
                self.emit("Retry? [Y/n] ");
                self.active = Some(Prompt::Error);
            }
        }
    }

    fn dismiss(&mut self, kind: DialogKind) {
        if self.active() == Some(kind) {
            tracing::debug!(?kind, "Dismissing dialog");
            self.active = None;
        }
    }

    fn publish_peers(&mut self, peers: &PeerDirectory) {
        self.peers = peers.clone();
    }

    fn handle_key(&mut self, key: &KeyEvent) -> KeyDisposition {
        let Some(kind) = self.active() else {
            return KeyDisposition::PassThrough;
        };
        if key.kind == KeyEventKind::Release {
            return KeyDisposition::Consumed;
        }

        match kind {
            DialogKind::ConnectionSetup => self.handle_setup_key(key),
            DialogKind::InProgress => KeyDisposition::Consumed,
            DialogKind::HostConfirmation => self.answer_host(key),
            DialogKind::Error => self.answer_error(key),
        }
    }

    fn handle_paste(&mut self, text: &str) -> KeyDisposition {
        match self.active() {
            None => KeyDisposition::PassThrough,
            Some(DialogKind::ConnectionSetup) => {
                self.paste_into_setup(text);
                KeyDisposition::Consumed
            }
            Some(_) => KeyDisposition::Consumed,
        }
    }
}
