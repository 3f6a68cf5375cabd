use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::application::CompletionGateway;
use crate::domain::GatewayResult;

/// How long the offline gateway pretends to think.
pub const DEFAULT_THINKING_DELAY: Duration = Duration::from_secs(2);

/// Demo replies used when no model is available.
pub const CANNED_REPLIES: [&str; 5] = [
    "Hello! Can you tell me your name and a bit about your business and what you're looking to build? I'll send you a summary by email after.",
    "Welcome to the Voiceflow AI agent on Webflow! You can build an experience like this to replace complex forms.",
    "That's interesting! Could you tell me more about your specific requirements?",
    "I understand. Let me suggest a few options that might work better for your needs.",
    "Great! I've noted down your preferences. Is there anything else you'd like to add?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Random,
    /// Replies in order, wrapping around.
    Rotation,
}

/// Offline [`CompletionGateway`]: ignores the prompt and answers with a
/// canned reply after a fixed delay. Never fails.
pub struct CannedGateway {
    replies: Vec<String>,
    delay: Duration,
    selection: Selection,
    next: AtomicUsize,
}

impl CannedGateway {
    pub fn new() -> Self {
        Self::with_replies(CANNED_REPLIES.iter().map(|r| r.to_string()).collect())
    }

    /// An empty list falls back to [`CANNED_REPLIES`].
    pub fn with_replies(replies: Vec<String>) -> Self {
        let replies = if replies.is_empty() {
            CANNED_REPLIES.iter().map(|r| r.to_string()).collect()
        } else {
            replies
        };
        Self {
            replies,
            delay: DEFAULT_THINKING_DELAY,
            selection: Selection::Random,
            next: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    fn pick(&self) -> &str {
        let index = match self.selection {
            Selection::Random => rand::thread_rng().gen_range(0..self.replies.len()),
            Selection::Rotation => self.next.fetch_add(1, Ordering::Relaxed) % self.replies.len(),
        };
        &self.replies[index]
    }
}

impl Default for CannedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionGateway for CannedGateway {
    async fn complete(&self, _prompt: &str) -> GatewayResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.pick();
        debug!("Canned reply selected ({} chars)", reply.chars().count());
        Ok(reply.to_string())
    }

    fn name(&self) -> &str {
        "canned"
    }
}
