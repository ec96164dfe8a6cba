//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction so the chat
//! loop can be pointed at the terminal or at an in-memory buffer. The
//! default implementation uses ANSI escape codes for emphasis.

use std::io::{self, Stderr, Stdout, Write};

/// ANSI escape code for bold blue text (used for the banner rule).
const ANSI_BLUE: &str = "\x1b[1;34m";

/// ANSI escape code for bold green text (used for the reply label).
const ANSI_GREEN: &str = "\x1b[1;32m";

/// ANSI escape code for bold yellow text (used for the waiting indicator).
const ANSI_YELLOW: &str = "\x1b[1;33m";

/// ANSI escape code for bold red text (used for errors).
const ANSI_RED: &str = "\x1b[1;31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Shown after any turn that produced no reply.
pub const FAILURE_NOTICE: &str = "Sorry, I couldn't get a response. Please try again.";

const WAITING_TEXT: &str = "Gemini is thinking...";

/// Trait for rendering chat output.
pub trait Renderer {
    /// Print the welcome banner.
    fn print_banner(&mut self, text: &str);

    /// Print the model's reply to a turn.
    fn print_reply(&mut self, reply: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print the notice that a turn produced no reply.
    fn print_failure_notice(&mut self);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called before a request is sent.
    fn start_waiting(&mut self) {}

    /// Called when a request completes, successfully or not.
    fn finish_waiting(&mut self) {}
}

/// Plain text renderer with optional ANSI styling.
///
/// Replies and information go to `out`, errors to `err`.
pub struct PlainTextRenderer<O: Write = Stdout, E: Write = Stderr> {
    out: O,
    err: E,
    use_color: bool,
    waiting: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer on stdout/stderr with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout/stderr with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writers(io::stdout(), io::stderr(), use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> PlainTextRenderer<O, E> {
    /// Creates a renderer over arbitrary writers.
    pub fn with_writers(out: O, err: E, use_color: bool) -> Self {
        Self {
            out,
            err,
            use_color,
            waiting: false,
        }
    }

    /// Returns true if ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    /// Erases the waiting indicator if it is showing.
    fn clear_waiting(&mut self) {
        if self.waiting {
            let blank = " ".repeat(WAITING_TEXT.len() + 8);
            let _ = write!(self.out, "{blank}\r");
            let _ = self.out.flush();
            self.waiting = false;
        }
    }
}

impl<O: Write, E: Write> Renderer for PlainTextRenderer<O, E> {
    fn print_banner(&mut self, text: &str) {
        let rule = self.styled(ANSI_BLUE, &"=".repeat(50));
        let _ = writeln!(self.out, "\n{rule}\n{text}\n{rule}\n");
        let _ = self.out.flush();
    }

    fn print_reply(&mut self, reply: &str) {
        self.clear_waiting();
        let label = self.styled(ANSI_GREEN, "Gemini: ");
        let _ = writeln!(self.out, "{label}{reply}\n");
        let _ = self.out.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_waiting();
        let _ = self.out.flush();
        let message = self.styled(ANSI_RED, &format!("Error: {error}"));
        let _ = writeln!(self.err, "{message}");
        let _ = self.err.flush();
    }

    fn print_failure_notice(&mut self) {
        self.clear_waiting();
        let notice = self.styled(ANSI_RED, FAILURE_NOTICE);
        let _ = writeln!(self.out, "{notice}\n");
        let _ = self.out.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.clear_waiting();
        let _ = writeln!(self.out, "{info}");
        let _ = self.out.flush();
    }

    /// Shows a transient indicator that is erased with a carriage return,
    /// so it is only drawn when styling is on.
    fn start_waiting(&mut self) {
        if self.use_color {
            let text = self.styled(ANSI_YELLOW, WAITING_TEXT);
            let _ = write!(self.out, "{text}\r");
            let _ = self.out.flush();
            self.waiting = true;
        }
    }

    fn finish_waiting(&mut self) {
        self.clear_waiting();
    }
}
