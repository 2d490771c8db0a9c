//! ts-term CLI
//!
//! Provides the `ts-term` binary: an interactive terminal attached to a
//! session brokered by a ts-term server, plus peer listing and configuration
//! helpers.

pub mod commands;
pub mod console;
pub mod output;
