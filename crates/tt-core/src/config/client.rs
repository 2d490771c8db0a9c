//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::{duration_millis, option_duration_secs};
use crate::error::ConfigError;
use crate::types::AddressKind;

/// Configuration for the ts-term client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host (and optional port) serving the control endpoint.
    ///
    /// An `http://` or `https://` prefix is accepted; `https` implies a
    /// secure channel just like a page loaded over TLS.
    pub server: String,

    /// Use `wss` for both channels
    pub secure: bool,

    /// Delay between relaying `ssh-config` and opening the session channel.
    /// Gives the backend time to provision the session endpoint.
    #[serde(rename = "session_connect_delay_ms", with = "duration_millis")]
    pub session_connect_delay: Duration,

    /// Quiet period before a terminal resize is reported
    #[serde(rename = "resize_debounce_ms", with = "duration_millis")]
    pub resize_debounce: Duration,

    /// How long to wait for a host-trust decision before answering `no`.
    /// Unset means wait forever.
    #[serde(
        rename = "host_trust_timeout_secs",
        with = "option_duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub host_trust_timeout: Option<Duration>,

    /// SSH port offered in the connection form
    pub default_port: u16,

    /// Username offered in the connection form
    pub default_username: String,

    /// Which peer address the connection form fills in
    pub address_kind: AddressKind,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "localhost:3000".to_string(),
            secure: false,
            session_connect_delay: Duration::from_millis(1000),
            resize_debounce: Duration::from_millis(500),
            host_trust_timeout: None,
            default_port: 22,
            default_username: whoami::username(),
            address_kind: AddressKind::default(),
        }
    }
}

impl ClientConfig {
    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host();
        if host.is_empty() {
            return Err(ConfigError::Invalid("server must not be empty".into()));
        }
        if host.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "server must be a host[:port], got {:?}",
                self.server
            )));
        }
        if self.default_port == 0 {
            return Err(ConfigError::Invalid("default_port must not be 0".into()));
        }
        Ok(())
    }

    /// Whether channels use a secure transport
    pub fn is_secure(&self) -> bool {
        self.secure || self.server.starts_with("https://")
    }

    /// WebSocket scheme mirroring the transport security
    pub fn scheme(&self) -> &'static str {
        if self.is_secure() {
            "wss"
        } else {
            "ws"
        }
    }

    /// Server host without any scheme prefix or trailing slash
    pub fn host(&self) -> &str {
        self.server
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }

    /// Well-known control endpoint on the serving host
    pub fn control_url(&self) -> String {
        format!("{}://{}/ts", self.scheme(), self.host())
    }

    /// Session endpoint for a host announced on the control channel
    pub fn session_url(&self, host: &str) -> String {
        format!("{}://{}", self.scheme(), host)
    }
}
