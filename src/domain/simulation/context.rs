//! History windowing for model requests.
//!
//! Only the most recent trainee turns are sent to the model so prompt size
//! stays bounded however long a session runs. A turn is one trainee message
//! plus any persona replies that follow it.

use crate::ports::ChatMessage;

use super::session_state::{Message, Speaker};

/// Default number of trainee turns kept in the window.
pub const DEFAULT_WINDOW_TURNS: usize = 10;

/// Result of windowing a history.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedHistory {
    /// Messages to send, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Messages left out of the window.
    pub truncated_count: usize,
}

impl WindowedHistory {
    /// Returns true if any messages were dropped.
    pub fn was_truncated(&self) -> bool {
        self.truncated_count > 0
    }
}

/// Keeps the last N trainee turns of a conversation.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    max_turns: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_TURNS)
    }
}

impl HistoryWindow {
    /// Creates a window over the last `max_turns` trainee turns (at least one).
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
        }
    }

    /// Returns the configured turn count.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Builds the windowed model history.
    ///
    /// Persona lines that precede the first kept trainee message are dropped
    /// so the window always opens on the trainee.
    pub fn build(&self, history: &[Message]) -> WindowedHistory {
        let start = history
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, m)| m.sender == Speaker::Trainee)
            .nth(self.max_turns - 1)
            .map(|(idx, _)| idx)
            .unwrap_or_else(|| {
                history
                    .iter()
                    .position(|m| m.sender == Speaker::Trainee)
                    .unwrap_or(history.len())
            });

        let messages = history[start..]
            .iter()
            .map(|m| match m.sender {
                Speaker::Trainee => ChatMessage::user(m.text.clone()),
                Speaker::Persona => ChatMessage::assistant(m.text.clone()),
            })
            .collect();

        WindowedHistory {
            messages,
            truncated_count: start,
        }
    }
}
