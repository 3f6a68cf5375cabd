use tracing::debug;

use crate::domain::{
    format_reply, ExchangeId, FailureKind, GatewayResult, PendingExchange, Phase, RenderState,
    Turn,
};

/// First assistant turn shown before the user has said anything.
pub const GREETING: &str = "Great! I'll be here whenever you're ready to chat. Just let me know!";

/// Assistant turn committed when a completion call fails, whatever the cause.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't come up with a response just now. Please try again.";

/// Why a submission did not start an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Nothing left after trimming.
    EmptyPrompt,
    /// An exchange is already in flight.
    Busy(Phase),
    /// Enter pressed together with Shift.
    ModifiedEnter,
}

/// A prompt the caller must hand to the completion gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPrompt {
    pub id: ExchangeId,
    pub prompt: String,
}

/// What the caller has to do after a gateway result was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyAction {
    /// Start revealing this (already formatted) text.
    Reveal(String),
    /// The fallback turn was committed and the machine is idle again.
    Failed(FailureKind),
    /// Stale or unexpected result, nothing changed.
    Discarded,
}

/// Turn-taking state machine: `Idle → Thinking → Streaming → Idle`, or
/// `Thinking → Idle` when the gateway fails.
///
/// Holds the transcript, the input buffer and at most one
/// [`PendingExchange`]. It performs no I/O and owns no timer; the caller
/// forwards gateway results and reveal events to it. See
/// [`super::ChatSession`] for the async driver.
#[derive(Debug, Clone)]
pub struct Conversation {
    transcript: Vec<Turn>,
    pending: Option<PendingExchange>,
    input: String,
    last_exchange: ExchangeId,
}

impl Conversation {
    /// A conversation whose transcript starts with [`GREETING`].
    pub fn new() -> Self {
        Self::with_transcript(vec![Turn::assistant(GREETING)])
    }

    pub fn with_transcript(transcript: Vec<Turn>) -> Self {
        Self {
            transcript,
            pending: None,
            input: String::new(),
            last_exchange: ExchangeId::new(0),
        }
    }

    pub fn phase(&self) -> Phase {
        self.pending
            .as_ref()
            .map(PendingExchange::phase)
            .unwrap_or(Phase::Idle)
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == Phase::Idle
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn latest_turn(&self) -> Option<&Turn> {
        self.transcript.last()
    }

    pub fn pending(&self) -> Option<&PendingExchange> {
        self.pending.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input buffer. Ignored unless idle, like a disabled text box.
    pub fn set_input(&mut self, text: impl Into<String>) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.input = text.into();
        true
    }

    /// Enter on the input field: submits the buffer unless Shift is held.
    pub fn press_enter(&mut self, shift: bool) -> Result<OutboundPrompt, IgnoreReason> {
        if shift {
            return Err(IgnoreReason::ModifiedEnter);
        }
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Start an exchange for `text`.
    ///
    /// The user turn keeps `text` as typed; the returned prompt is trimmed.
    pub fn submit(&mut self, text: &str) -> Result<OutboundPrompt, IgnoreReason> {
        let phase = self.phase();
        if !phase.accepts_input() {
            debug!("Ignoring submit while {}", phase);
            return Err(IgnoreReason::Busy(phase));
        }

        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(IgnoreReason::EmptyPrompt);
        }

        self.transcript.push(Turn::user(text));
        self.input.clear();

        let id = self.last_exchange.next();
        self.last_exchange = id;
        self.pending = Some(PendingExchange::thinking(id));
        debug!("Exchange {} thinking", id);

        Ok(OutboundPrompt {
            id,
            prompt: prompt.to_string(),
        })
    }

    /// Apply the gateway's answer for exchange `id`.
    pub fn on_gateway_result(&mut self, id: ExchangeId, result: GatewayResult) -> ReplyAction {
        let Some(pending) = self.pending.as_mut() else {
            debug!("Dropping result for {}: no exchange in flight", id);
            return ReplyAction::Discarded;
        };
        if pending.id() != id || pending.phase() != Phase::Thinking {
            debug!("Dropping stale result for {}", id);
            return ReplyAction::Discarded;
        }

        match result {
            Ok(raw) => {
                let formatted = format_reply(&raw);
                pending.start_streaming(formatted.clone());
                debug!(
                    "Exchange {} streaming {} chars",
                    id,
                    formatted.chars().count()
                );
                ReplyAction::Reveal(formatted)
            }
            Err(err) => {
                self.pending = None;
                self.transcript
                    .push(Turn::assistant(FALLBACK_MESSAGE));
                debug!("Exchange {} failed ({}), fallback committed", id, err.kind());
                ReplyAction::Failed(err.kind())
            }
        }
    }

    /// Record how many characters of the reply are visible.
    pub fn on_reveal_progress(&mut self, revealed: usize) {
        if let Some(pending) = self.pending.as_mut() {
            if pending.phase() == Phase::Streaming {
                pending.set_revealed(revealed);
            }
        }
    }

    /// Commit the fully revealed reply and return to idle.
    ///
    /// Returns the committed turn, or `None` if nothing was streaming.
    pub fn on_reveal_complete(&mut self) -> Option<&Turn> {
        if self.phase() != Phase::Streaming {
            return None;
        }
        let pending = self.pending.take()?;
        let text = pending.full_reply_text().unwrap_or_default().to_string();
        debug!("Exchange {} committed", pending.id());

        self.transcript.push(Turn::assistant(text));
        self.transcript.last()
    }

    /// Drop the in-flight exchange without committing anything.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Exchange {} dropped at teardown", pending.id());
        }
    }

    pub fn render(&self) -> RenderState {
        let phase = self.phase();
        RenderState {
            latest_turn: self.latest_turn().cloned(),
            thinking: phase == Phase::Thinking,
            streaming: phase == Phase::Streaming,
            revealed: self
                .pending
                .as_ref()
                .map(|p| p.revealed_text().to_string())
                .unwrap_or_default(),
            input: self.input.clone(),
            input_enabled: phase.accepts_input(),
            turn_count: self.transcript.len(),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
