//! Payload types carried inside envelopes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// One reachable machine on the overlay network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    /// First label of the machine's DNS name (e.g., "lab-server")
    pub short_domain: String,
    /// Full DNS name (e.g., "lab-server.tail1234.ts.net")
    pub domain: String,
    /// Overlay IP addresses, preferred first
    #[serde(default)]
    pub ips: Vec<String>,
}

impl PeerInfo {
    /// Display label for selection lists: `"<short> [<first ip>]"`
    pub fn label(&self) -> String {
        match self.ips.first() {
            Some(ip) => format!("{} [{}]", self.short_domain, ip),
            None => self.short_domain.clone(),
        }
    }
}

/// Terminal geometry sent with `size`
///
/// `x`/`y` are the pixel width and height of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalGeometry {
    /// Number of rows
    pub rows: u16,
    /// Number of columns
    pub cols: u16,
    /// Pixel width
    #[serde(default)]
    pub x: u16,
    /// Pixel height
    #[serde(default)]
    pub y: u16,
}

impl TerminalGeometry {
    /// Create a new geometry
    pub fn new(rows: u16, cols: u16, x: u16, y: u16) -> Self {
        Self { rows, cols, x, y }
    }
}

impl Default for TerminalGeometry {
    fn default() -> Self {
        Self::new(24, 80, 0, 0)
    }
}

/// Answer to a host-identity confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// Trust the host and continue
    Yes,
    /// Reject the host
    No,
}

impl HostAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostAction::Yes => "yes",
            HostAction::No => "no",
        }
    }
}

impl FromStr for HostAction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(HostAction::Yes),
            "no" => Ok(HostAction::No),
            other => Err(ProtocolError::InvalidPayload {
                kind: "ssh-host-action",
                reason: format!("expected \"yes\" or \"no\", got {:?}", other),
            }),
        }
    }
}

/// Where to open the remote shell, and as whom
///
/// Built from user input at submission time and consumed when sent.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SessionTarget {
    /// Create a new target
    pub fn new(
        address: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Wire form: `username:password:address:port`
    pub fn to_wire(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.username, self.password, self.address, self.port
        )
    }
}

impl FromStr for SessionTarget {
    type Err = ProtocolError;

    /// Parse the wire form.
    ///
    /// The username ends at the first colon and the port follows the last
    /// one; the address is the field before the port. Whatever remains is the
    /// password, so passwords may contain colons but addresses may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ProtocolError::InvalidPayload {
            kind: "ssh-config",
            reason: reason.to_string(),
        };

        let (username, rest) = s
            .split_once(':')
            .ok_or_else(|| invalid("missing password field"))?;
        let (rest, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port field"))?;
        let (password, address) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing address field"))?;

        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(&format!("bad port {:?}: {}", port, e)))?;

        Ok(Self::new(address, port, username, password))
    }
}

impl fmt::Debug for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTarget")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_target_wire_form() {
        let target = SessionTarget::new("lab-server", 22, "alice", "hunter2");
        assert_eq!(target.to_wire(), "alice:hunter2:lab-server:22");
    }

    #[test]
    fn test_session_target_password_with_colons() {
        let target = SessionTarget::new("100.64.0.7", 2200, "bob", "a:b:c");
        let parsed: SessionTarget = target.to_wire().parse().unwrap();
        assert_eq!(parsed, target);
    }

    #[test]
    fn test_session_target_rejects_bad_port() {
        let err = "alice:pw:host:ssh".parse::<SessionTarget>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { kind: "ssh-config", .. }));

        assert!("alice".parse::<SessionTarget>().is_err());
        assert!("alice:pw:22".parse::<SessionTarget>().is_err());
    }

    #[test]
    fn test_session_target_debug_redacts_password() {
        let target = SessionTarget::new("lab", 22, "alice", "hunter2");
        let debug = format!("{:?}", target);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_peer_label() {
        let peer = PeerInfo {
            short_domain: "lab".into(),
            domain: "lab.tail1.ts.net".into(),
            ips: vec!["100.64.0.2".into(), "fd7a::2".into()],
        };
        assert_eq!(peer.label(), "lab [100.64.0.2]");
    }

    #[test]
    fn test_geometry_default() {
        let geometry = TerminalGeometry::default();
        assert_eq!(geometry.rows, 24);
        assert_eq!(geometry.cols, 80);
    }

    #[test]
    fn test_host_action_parse() {
        assert_eq!("yes".parse::<HostAction>().unwrap(), HostAction::Yes);
        assert_eq!("no".parse::<HostAction>().unwrap(), HostAction::No);
        assert!("maybe".parse::<HostAction>().is_err());
    }
}
