//! Conversation history kept for prompt composition.
//!
//! Only the most recent [`MAX_ENTRIES`] lines are kept. Nothing is persisted.

use std::collections::VecDeque;

/// Maximum number of history lines kept.
pub const MAX_ENTRIES: usize = 20;

/// Bounded list of `SPEAKER: text` lines, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    entries: VecDeque<String>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, evicting the oldest ones past the cap.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        while self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
        }
    }

    /// Record one completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.push(format!("USER: {}", user));
        self.push(format!("ASSISTANT: {}", assistant));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// All entries joined with newlines.
    pub fn formatted(&self) -> String {
        self.iter().collect::<Vec<_>>().join("\n")
    }
}
