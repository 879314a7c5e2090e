//! Conversation history management
//!
//! Keeps a sliding window of the most recent exchanges for the prompt.

use std::collections::VecDeque;

use crate::core::Message;

/// Sliding window over the chat history of one session.
///
/// The window is measured in exchanges (one user question plus one
/// assistant answer), so it holds at most `2 * window` messages.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Message history
    messages: VecDeque<Message>,
    /// Number of exchanges kept
    window: usize,
}

impl Conversation {
    /// Create a new conversation keeping the last `window` exchanges
    pub fn new(window: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(window * 2 + 1),
            window,
        }
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    /// Add a message and evict the oldest past the window
    fn add_message(&mut self, message: Message) {
        self.messages.push_back(message);

        while self.messages.len() > self.capacity() {
            self.messages.pop_front();
        }
    }

    /// Record a resolved question and its answer as one exchange
    pub fn add_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.add_user(question);
        self.add_assistant(answer);
    }

    /// Maximum number of messages retained
    pub fn capacity(&self) -> usize {
        self.window * 2
    }

    /// Window size in exchanges
    pub fn window(&self) -> usize {
        self.window
    }

    /// Messages in the window, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Snapshot of the window, oldest first
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Get the last user message
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_user())
    }

    /// Get the last assistant message
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| !m.is_user())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(1)
    }
}
