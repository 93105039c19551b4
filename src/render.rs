use pulldown_cmark::{html, Parser};

use crate::models::message::{ChatMessage, Sender};
use crate::session::SessionView;

const DEFAULT_WIDTH: usize = 100;

/// Renders bot markdown for the terminal: markdown -> HTML -> wrapped text.
/// The intermediate HTML is consumed by html2text and never emitted, so
/// whatever markup the bot sends back cannot reach anything that would
/// interpret it.
pub fn render_markdown(text: &str, width: usize) -> String {
    let parser = Parser::new(text);
    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    html2text::from_read(html_out.as_bytes(), width)
}

/// Terminal-facing side of the client: prints transcript entries in receipt
/// order and carries the controller's status/alert lines. Printing appends,
/// so the newest entry is always the one in view.
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    width: usize,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        TerminalRenderer {
            width: DEFAULT_WIDTH,
        }
    }

    /// Formats one transcript entry. Bot entries flagged as markdown go
    /// through the render pipeline; everything else stays literal.
    pub fn format_entry(&self, message: &ChatMessage) -> String {
        let time = message.timestamp.format("%H:%M:%S");
        let body = if message.sender == Sender::Bot && message.markdown {
            render_markdown(&message.text, self.width).trim_end().to_string()
        } else {
            message.text.clone()
        };
        match message.sender {
            Sender::System => format!("[{}] -- {}", time, body),
            sender => format!("[{}] {}: {}", time, sender, body),
        }
    }

    pub fn print_entry(&self, message: &ChatMessage) {
        println!("{}", self.format_entry(message));
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        TerminalRenderer::new()
    }
}

impl SessionView for TerminalRenderer {
    fn status(&self, line: &str) {
        println!("[status] {}", line);
    }

    fn alert(&self, line: &str) {
        eprintln!("!! {}", line);
    }
}
