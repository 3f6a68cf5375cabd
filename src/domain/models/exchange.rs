use serde::{Deserialize, Serialize};

/// Phase of the conversation. `Idle` is the only phase that accepts input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Thinking,
    Streaming,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Thinking => "thinking",
            Phase::Streaming => "streaming",
        }
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, Phase::Idle)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one submit-to-commit cycle. Results carrying a stale id are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExchangeId(u64);

impl ExchangeId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The single in-flight exchange.
///
/// While streaming, `full_reply_text` is always set and `revealed_prefix_length`
/// never exceeds its length in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    id: ExchangeId,
    phase: Phase,
    revealed_prefix_length: usize,
    full_reply_text: Option<String>,
}

impl PendingExchange {
    pub fn thinking(id: ExchangeId) -> Self {
        Self {
            id,
            phase: Phase::Thinking,
            revealed_prefix_length: 0,
            full_reply_text: None,
        }
    }

    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn revealed_prefix_length(&self) -> usize {
        self.revealed_prefix_length
    }

    pub fn full_reply_text(&self) -> Option<&str> {
        self.full_reply_text.as_deref()
    }

    /// Move to `Streaming` with the formatted reply as the reveal target.
    pub fn start_streaming(&mut self, reply: impl Into<String>) {
        self.full_reply_text = Some(reply.into());
        self.revealed_prefix_length = 0;
        self.phase = Phase::Streaming;
    }

    /// Record reveal progress, clamped to the reply length.
    pub fn set_revealed(&mut self, count: usize) {
        let len = self
            .full_reply_text
            .as_deref()
            .map(|t| t.chars().count())
            .unwrap_or(0);
        self.revealed_prefix_length = count.min(len);
    }

    /// The part of the reply shown so far.
    pub fn revealed_text(&self) -> &str {
        match self.full_reply_text.as_deref() {
            Some(text) => char_prefix(text, self.revealed_prefix_length),
            None => "",
        }
    }
}

/// First `count` characters of `text`, cut on a char boundary.
pub fn char_prefix(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
