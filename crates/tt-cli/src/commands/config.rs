//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use tt_core::config::{self, ClientConfig};

/// Load the effective configuration
///
/// An explicit path must exist and parse. The default path is optional; a
/// broken default file is reported and replaced by defaults.
pub fn resolve_config(config_path: Option<&PathBuf>) -> Result<ClientConfig> {
    let config: ClientConfig = match config_path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                config::load_config(&default_path).unwrap_or_else(|e| {
                    tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                    print_warning(&format!("Ignoring invalid config {:?}: {}", default_path, e));
                    ClientConfig::default()
                })
            } else {
                ClientConfig::default()
            }
        }
    };

    Ok(config)
}

fn config_file(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Show the effective configuration and where it came from
pub fn config_show(config_path: Option<&PathBuf>) -> Result<()> {
    let path = config_file(config_path);

    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Showing built-in defaults; run 'ts-term config init' to create one");
    }
    println!();

    let config = resolve_config(config_path)?;
    let content = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", content);

    Ok(())
}

/// Print the configuration file path
pub fn config_path(config_path: Option<&PathBuf>) -> Result<()> {
    println!("{}", config_file(config_path).display());
    Ok(())
}

/// Write a commented default configuration
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = config_file(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    write_default_config(&path)?;
    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}

fn write_default_config(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
        }
    }

    std::fs::write(path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Generate default configuration content
fn generate_default_config() -> String {
    r#"# ts-term configuration

# Host (and optional port) serving the ts-term web endpoint.
# An https:// prefix implies secure WebSockets.
server = "localhost:3000"

# Use wss:// for both the control and the session channel
secure = false

# Delay between relaying the connection settings and opening the session
# channel, giving the server time to start the session endpoint
session_connect_delay_ms = 1000

# Quiet period before a terminal resize is reported
resize_debounce_ms = 500

# Reject an unconfirmed host after this many seconds (unset waits forever)
# host_trust_timeout_secs = 60

# Defaults offered in the connection form
default_port = 22
# default_username = "alice"

# Which peer address the form fills in: "short", "full" or "ip"
address_kind = "short"
"#
    .to_string()
}
