//! User-facing conversation log
//!
//! Separate from `tracing` output: these are the lines a chat UI shows.

use std::collections::VecDeque;
use std::fmt;

use visage_core::EmotionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    User,
    Bot,
    System,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn user(text: &str) -> Self {
        LogEntry {
            kind: LogKind::User,
            text: format!("You: {text}"),
        }
    }

    pub fn bot(emotion: &EmotionId, reply: &str) -> Self {
        LogEntry {
            kind: LogKind::Bot,
            text: format!("Bot [{emotion}]: {reply}"),
        }
    }

    /// Message relayed from the backend
    pub fn info(msg: &str) -> Self {
        LogEntry {
            kind: LogKind::System,
            text: format!("System: {msg}"),
        }
    }

    /// Engine status line
    pub fn status(text: impl Into<String>) -> Self {
        LogEntry {
            kind: LogKind::System,
            text: text.into(),
        }
    }

    pub fn audio_error(reason: &str) -> Self {
        LogEntry {
            kind: LogKind::Error,
            text: format!("Audio error: {reason}"),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Bounded log; oldest lines drop first
#[derive(Debug, Clone)]
pub struct UserLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    dropped: u64,
}

impl UserLog {
    pub fn new(capacity: usize) -> Self {
        UserLog {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        tracing::debug!(kind = ?entry.kind, text = %entry.text, "user log");
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// True if any retained line matches exactly
    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e.text == text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lines evicted by the capacity bound
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
