//! CLI command implementations

mod config;
mod connect;
mod peers;

pub use config::{config_init, config_path, config_show, resolve_config};
pub use connect::connect_command;
pub use peers::peers_command;
