//! Terminal surface backed by the process's own TTY

use std::io::{self, Write};

use tt_client::TerminalSurface;
use tt_protocol::TerminalGeometry;

/// Writes session output to stdout and reports the TTY's size
pub struct ConsoleSurface<W = io::Stdout> {
    out: W,
}

impl ConsoleSurface {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> TerminalSurface for ConsoleSurface<W> {
    fn write(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }

    fn geometry(&self) -> TerminalGeometry {
        current_geometry()
    }
}

/// Size of the controlling terminal
///
/// Pixel dimensions are 0 where the platform cannot report them.
pub fn current_geometry() -> TerminalGeometry {
    if let Ok(size) = crossterm::terminal::window_size() {
        return TerminalGeometry::new(size.rows, size.columns, size.width, size.height);
    }

    match crossterm::terminal::size() {
        Ok((cols, rows)) => TerminalGeometry::new(rows, cols, 0, 0),
        Err(e) => {
            tracing::debug!("Could not read terminal size: {}", e);
            TerminalGeometry::default()
        }
    }
}
