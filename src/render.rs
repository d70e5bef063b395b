//! Console rendering for the chat client.
//!
//! This module provides the [`Renderer`] trait the responder and the conversation
//! loop write through, and [`TerminalRenderer`], which draws ANSI panels and
//! renders markdown with `termimad`.

use std::io::{self, Write};

use termimad::MadSkin;
use unicode_width::UnicodeWidthStr;

/// ANSI escape code to reset all styling.
pub const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (used for help).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for magenta text (used for model responses).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// Width of a rendered panel, borders included.
pub const PANEL_WIDTH: usize = 120;

/// Title prefix used for model output.
pub const CHATBOT_LABEL: &str = "🤖 Chatbot";

/// Header printed before each interactive entry.
pub const USER_LABEL: &str = "🤗 User: ";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - ANSI panels and formatted markdown on a terminal
/// - Plain text without styling (for piping/redirecting)
/// - Recording output in tests
pub trait Renderer: Send {
    /// Print the header that precedes interactive user input.
    fn print_user_prompt(&mut self);

    /// Called before the first fragment of a streamed response.
    fn print_stream_header(&mut self, model: &str);

    /// Print a fragment of streamed response text, immediately.
    fn print_text(&mut self, text: &str);

    /// Called after the last fragment of a streamed response.
    fn finish_stream(&mut self);

    /// Print a complete response as a markdown panel titled with the model.
    fn print_response(&mut self, model: &str, markdown: &str);

    /// Print a failed request as an error panel.
    fn print_error_panel(&mut self, message: &str);

    /// Print a help panel.
    fn print_help(&mut self, markdown: &str);

    /// Print a one-line error that does not warrant a panel.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Terminal renderer with optional ANSI styling.
///
/// Output goes to stdout, except one-line errors, which go to stderr.
pub struct TerminalRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
    width: usize,
    skin: MadSkin,
}

impl TerminalRenderer {
    /// Creates a new TerminalRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new TerminalRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), use_color)
    }

    /// Creates a renderer that writes to `out` instead of stdout.
    pub fn with_writer(out: Box<dyn Write + Send>, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            width: PANEL_WIDTH,
            skin: MadSkin::default_dark(),
        }
    }

    /// Flushes output to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        self.flush();
    }

    fn format_markdown(&self, markdown: &str) -> String {
        if self.use_color {
            let inner = self.width.saturating_sub(2).max(1);
            self.skin.text(markdown, Some(inner)).to_string()
        } else {
            markdown.to_string()
        }
    }

    fn panel(&self, title: &str, body: &str, color: &str) -> String {
        let color = if self.use_color { color } else { "" };
        let reset = if self.use_color { ANSI_RESET } else { "" };
        panel(title, body, self.width, color, reset)
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn print_user_prompt(&mut self) {
        let header = if self.use_color {
            format!("\n{ANSI_BOLD}{ANSI_MAGENTA}{USER_LABEL}{ANSI_RESET}\n")
        } else {
            format!("\n{USER_LABEL}\n")
        };
        self.write(&header);
    }

    fn print_stream_header(&mut self, model: &str) {
        let header = if self.use_color {
            format!("{ANSI_BOLD}{ANSI_MAGENTA}{CHATBOT_LABEL}: {model}:{ANSI_RESET}\n")
        } else {
            format!("{CHATBOT_LABEL}: {model}:\n")
        };
        self.write(&header);
    }

    fn print_text(&mut self, text: &str) {
        self.write(text);
    }

    fn finish_stream(&mut self) {
        self.write("\n");
    }

    fn print_response(&mut self, model: &str, markdown: &str) {
        let body = self.format_markdown(markdown);
        let panel = self.panel(&format!("{CHATBOT_LABEL}: {model}"), &body, ANSI_MAGENTA);
        self.write(&panel);
    }

    fn print_error_panel(&mut self, message: &str) {
        let panel = self.panel("Error", message, ANSI_RED);
        self.write(&panel);
    }

    fn print_help(&mut self, markdown: &str) {
        let body = self.format_markdown(markdown);
        let panel = self.panel("Help", &body, ANSI_YELLOW);
        self.write(&panel);
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.write(&format!("{info}\n"));
    }
}

/// Draw a panel `width` columns wide around `body`.
///
/// Only the left edge is drawn on body lines, so pre-styled text (which may
/// carry escape codes) never has to be measured.
fn panel(title: &str, body: &str, width: usize, color: &str, reset: &str) -> String {
    let head = format!("╭─ {title} ");
    let fill = width.saturating_sub(UnicodeWidthStr::width(head.as_str()));
    let mut out = format!("{color}{head}{}{reset}\n", "─".repeat(fill));
    for line in body.trim_end_matches('\n').lines() {
        out.push_str(&format!("{color}│{reset} {line}\n"));
    }
    out.push_str(&format!(
        "{color}╰{}{reset}\n",
        "─".repeat(width.saturating_sub(1))
    ));
    out
}
