//! Output writer
//!
//! PTY output arrives in arbitrary chunks and a partial line (a shell prompt,
//! say) usually has no trailing terminator. The writer remembers whether the
//! last character it emitted ended a line so that synthetic status lines are
//! always started on a fresh line.

use tt_protocol::TerminalGeometry;

/// Line terminator used for every synthetic line
pub const LINE_TERMINATOR: &str = "\r\n";

/// The embedded terminal surface
pub trait TerminalSurface {
    /// Render text (including escape sequences) as-is
    fn write(&mut self, text: &str);

    /// Current rows/cols and pixel size of the surface
    fn geometry(&self) -> TerminalGeometry;
}

/// Writes to a terminal surface while tracking the newline cursor
#[derive(Debug)]
pub struct OutputWriter<T> {
    surface: T,
    on_newline: bool,
}

impl<T: TerminalSurface> OutputWriter<T> {
    pub fn new(surface: T) -> Self {
        Self {
            surface,
            on_newline: true,
        }
    }

    /// Pass raw output straight through
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        self.surface.write(text);
        self.on_newline = text.ends_with(LINE_TERMINATOR);
    }

    /// Write a synthetic status line
    ///
    /// Starts a new line first if the previous output left one unterminated.
    /// Trailing CR/LF in `text` is normalized to a single terminator.
    pub fn write_status(&mut self, text: &str) {
        let body = text.trim_end_matches(['\r', '\n']);

        let mut line = String::with_capacity(body.len() + 2 * LINE_TERMINATOR.len());
        if !self.on_newline {
            line.push_str(LINE_TERMINATOR);
        }
        line.push_str(body);
        line.push_str(LINE_TERMINATOR);

        self.surface.write(&line);
        self.on_newline = true;
    }

    /// Whether the last emitted character was a line terminator
    pub fn is_on_newline(&self) -> bool {
        self.on_newline
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut T {
        &mut self.surface
    }

    pub fn into_inner(self) -> T {
        self.surface
    }
}
