use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "You"),
            Sender::Bot => write!(f, "Bot"),
            Sender::System => write!(f, "System"),
        }
    }
}

/// One transcript entry. `markdown` marks text that came back from the bot
/// as markdown and should go through the render pipeline; user and system
/// entries are always literal.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub markdown: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            sender: Sender::User,
            text: text.into(),
            markdown: false,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>, markdown: bool) -> Self {
        ChatMessage {
            sender: Sender::Bot,
            text: text.into(),
            markdown,
            timestamp: Utc::now(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        ChatMessage {
            sender: Sender::System,
            text: text.into(),
            markdown: false,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only, ordered record of the conversation. Entries are never
/// reordered or removed; nothing is persisted across runs.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    pub fn append(&mut self, message: ChatMessage) -> &ChatMessage {
        self.entries.push(message);
        self.entries.last().unwrap()
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_preserves_append_order() {
        let mut transcript = Transcript::new();
        transcript.append(ChatMessage::user("hello"));
        transcript.append(ChatMessage::bot("hi there", true));
        transcript.append(ChatMessage::system("connection closed"));

        let senders: Vec<Sender> = transcript.entries().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::System]);
        assert_eq!(transcript.entries()[1].text, "hi there");
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn only_bot_entries_carry_markdown() {
        assert!(!ChatMessage::user("*hi*").markdown);
        assert!(!ChatMessage::system("*hi*").markdown);
        assert!(ChatMessage::bot("*hi*", true).markdown);
    }
}
