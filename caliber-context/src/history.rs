//! Conversation Context and Per-Sender History (spec.md §3), grounded on
//! `BufferedChatCompletionContext`'s fixed-size buffer usage in
//! `src/guard/agent.py` (`self.context`, `self.agent_history[sender]`)
//! and structurally on this crate's `ContextWindow` naming conventions.

use std::collections::{HashSet, VecDeque};

/// A bounded FIFO of the most recent message records, plus the initial
/// message (first ever observed, never evicted) and a de-duplication
/// set (`Guard.context_set`).
#[derive(Debug, Clone)]
pub struct ConversationContext {
    capacity: usize,
    initial_message: Option<String>,
    recent: VecDeque<String>,
    seen: HashSet<String>,
}

impl ConversationContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            initial_message: None,
            recent: VecDeque::with_capacity(capacity),
            seen: HashSet::new(),
        }
    }

    /// True if this is the very first message this context has seen.
    pub fn is_empty(&self) -> bool {
        self.initial_message.is_none()
    }

    /// Append a message. If this is the first message ever observed, it
    /// is additionally recorded as the initial message (spec.md §4.6
    /// step 3: "if this is the first-ever message, record it as the
    /// initial message").
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.seen.insert(message.clone());
        if self.initial_message.is_none() {
            self.initial_message = Some(message.clone());
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(message);
    }

    pub fn initial_message(&self) -> Option<&str> {
        self.initial_message.as_deref()
    }

    pub fn recent_messages(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(|s| s.as_str())
    }

    pub fn has_seen(&self, message: &str) -> bool {
        self.seen.contains(message)
    }

    /// Build the combined observation text used by C3/C6
    /// (`"Initial User Request: " + initial + "; Current Conversation: " + recent`).
    pub fn observation(&self) -> String {
        let initial = self.initial_message.as_deref().unwrap_or("");
        let recent: Vec<&str> = self.recent_messages().collect();
        format!(
            "Initial User Request: {initial}; Current Conversation: {recent:?}"
        )
    }
}

/// Per-sender windowed history plus threat level, created lazily on
/// first observation of a participant (spec.md §3 "Per-Sender History").
#[derive(Debug, Clone)]
pub struct SenderHistory {
    capacity: usize,
    messages: VecDeque<String>,
}

impl SenderHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message.into());
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|s| s.as_str())
    }

    pub fn as_observation_text(&self) -> String {
        format!("{:?}", self.messages().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_becomes_the_initial_message() {
        let mut ctx = ConversationContext::new(5);
        assert!(ctx.is_empty());
        ctx.push("hello");
        assert_eq!(ctx.initial_message(), Some("hello"));
        ctx.push("world");
        // initial message is never evicted or overwritten
        assert_eq!(ctx.initial_message(), Some("hello"));
    }

    #[test]
    fn recent_buffer_evicts_oldest_beyond_capacity() {
        let mut ctx = ConversationContext::new(2);
        ctx.push("a");
        ctx.push("b");
        ctx.push("c");
        let recent: Vec<&str> = ctx.recent_messages().collect();
        assert_eq!(recent, vec!["b", "c"]);
        // but the true initial message is still "a"
        assert_eq!(ctx.initial_message(), Some("a"));
    }

    #[test]
    fn seen_set_tracks_every_pushed_message_even_if_evicted() {
        let mut ctx = ConversationContext::new(1);
        ctx.push("a");
        ctx.push("b");
        assert!(ctx.has_seen("a"));
        assert!(ctx.has_seen("b"));
        assert!(!ctx.has_seen("c"));
    }

    #[test]
    fn sender_history_is_bounded_fifo() {
        let mut hist = SenderHistory::new(5);
        for i in 0..7 {
            hist.push(format!("msg-{i}"));
        }
        assert_eq!(hist.messages().count(), 5);
        let first: Vec<&str> = hist.messages().collect();
        assert_eq!(first[0], "msg-2");
    }
}
