//! Peers command implementation

use std::time::Duration;

use anyhow::Result;

use crate::output::{format_peers, print_error, print_info};
use tt_client::fetch_peers;
use tt_core::config::ClientConfig;

/// List the peers the server can reach
pub async fn peers_command(config: &ClientConfig, timeout: Duration) -> Result<()> {
    let url = config.control_url();
    print_info(&format!("Fetching peers from {}...", url));

    let peers = match fetch_peers(&url, timeout).await {
        Ok(peers) => peers,
        Err(e) => {
            print_error(&format!("Failed to fetch peers: {:#}", e));
            return Err(e);
        }
    };

    println!("{}", format_peers(&peers, config.address_kind));
    Ok(())
}
