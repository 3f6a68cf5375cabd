use std::io::{self, Write};

use crate::domain::{RenderState, Speaker};

/// Draws [`RenderState`] updates as a plain text stream.
///
/// Snapshots may be coalesced by the watch channel, so the renderer works
/// from differences: characters of the reveal not yet printed, and turns
/// committed since the last call.
pub struct TerminalRenderer {
    printed: usize,
    label_shown: bool,
    thinking_shown: bool,
    seen_turns: usize,
}

impl TerminalRenderer {
    /// Start from `initial` without printing anything for it.
    pub fn new(initial: &RenderState) -> Self {
        Self {
            printed: 0,
            label_shown: false,
            thinking_shown: initial.thinking,
            seen_turns: initial.turn_count,
        }
    }

    /// Print the latest turn as a labelled line.
    pub fn greet<W: Write>(&self, state: &RenderState, out: &mut W) -> io::Result<()> {
        if let Some(turn) = &state.latest_turn {
            writeln!(out, "{}: {}", label(turn.speaker()), turn.text())?;
        }
        out.flush()
    }

    pub fn render<W: Write>(&mut self, state: &RenderState, out: &mut W) -> io::Result<()> {
        if state.thinking && !self.thinking_shown {
            writeln!(out, "Thinking...")?;
            self.thinking_shown = true;
        }

        if state.streaming {
            self.show_label(out)?;
            let fresh: String = state.revealed.chars().skip(self.printed).collect();
            self.printed += fresh.chars().count();
            write!(out, "{fresh}")?;
        }

        if state.turn_count > self.seen_turns {
            self.seen_turns = state.turn_count;
            if let Some(turn) = state.latest_turn.as_ref().filter(|t| !t.is_user()) {
                self.show_label(out)?;
                let rest: String = turn.text().chars().skip(self.printed).collect();
                writeln!(out, "{rest}")?;
                self.printed = 0;
                self.label_shown = false;
            }
        }

        if state.is_idle() {
            self.thinking_shown = false;
        }

        out.flush()
    }

    fn show_label<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.label_shown {
            write!(out, "{}: ", label(Speaker::Assistant))?;
            self.label_shown = true;
        }
        Ok(())
    }
}

fn label(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "You",
        Speaker::Assistant => "Assistant",
    }
}
