//! Output formatting utilities for the CLI
//!
//! Peer tables and colored status messages for the non-interactive commands.

use tabled::{settings::Style, Table, Tabled};

use tt_core::{AddressKind, PeerDirectory};

/// Format a peer directory as an ASCII table
///
/// The `CONNECT AS` column shows the address the connection form would fill
/// in for `kind`.
pub fn format_peers(peers: &PeerDirectory, kind: AddressKind) -> String {
    if peers.is_empty() {
        return "No peers found".to_string();
    }

    #[derive(Tabled)]
    struct PeerRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "MACHINE")]
        machine: String,
        #[tabled(rename = "DOMAIN")]
        domain: String,
        #[tabled(rename = "ADDRESSES")]
        addresses: String,
        #[tabled(rename = "CONNECT AS")]
        connect_as: String,
    }

    let rows: Vec<PeerRow> = peers
        .iter()
        .enumerate()
        .map(|(i, p)| PeerRow {
            index: i + 1,
            machine: p.short_domain.clone(),
            domain: p.domain.trim_end_matches('.').to_string(),
            addresses: if p.ips.is_empty() {
                "-".to_string()
            } else {
                p.ips.join(", ")
            },
            connect_as: peers.address(i, kind).unwrap_or("-").to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Goes to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_protocol::PeerInfo;

    #[test]
    fn test_format_empty() {
        let peers = PeerDirectory::default();
        assert_eq!(format_peers(&peers, AddressKind::Short), "No peers found");
    }

    #[test]
    fn test_format_peers_table() {
        let peers = PeerDirectory::from_snapshot(vec![
            PeerInfo {
                short_domain: "web".into(),
                domain: "web.tail1234.ts.net.".into(),
                ips: vec!["100.64.0.3".into(), "fd7a:115c::3".into()],
            },
            PeerInfo {
                short_domain: "lab".into(),
                domain: "lab.tail1234.ts.net.".into(),
                ips: vec![],
            },
        ]);

        let table = format_peers(&peers, AddressKind::Ip);

        assert!(table.contains("MACHINE"));
        assert!(table.contains("web.tail1234.ts.net"));
        assert!(table.contains("100.64.0.3, fd7a:115c::3"));
        // lab sorts first and has no IP, so it connects by name
        let lab_line = table.lines().find(|l| l.contains("lab.tail1234")).unwrap();
        assert!(lab_line.contains("│ 1 "));
        assert!(lab_line.contains("│ lab "));
    }
}
