use serde::Serialize;

use super::{Phase, Turn};

/// What a presentation layer needs to draw the widget.
///
/// Only the latest committed turn is exposed, plus the thinking and
/// streaming overlays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderState {
    pub latest_turn: Option<Turn>,
    pub thinking: bool,
    pub streaming: bool,
    pub revealed: String,
    pub input: String,
    pub input_enabled: bool,
    pub turn_count: usize,
}

impl RenderState {
    pub fn phase(&self) -> Phase {
        if self.streaming {
            Phase::Streaming
        } else if self.thinking {
            Phase::Thinking
        } else {
            Phase::Idle
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == Phase::Idle
    }
}
