use std::io::{self, Write};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::application::{IgnoreReason, SubmitOutcome};
use crate::connector::api::terminal::TerminalRenderer;

use super::super::Container;

const QUIT_COMMAND: &str = "/quit";

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Interactive loop: each stdin line is a submit, replies are typed out.
    ///
    /// `/quit` leaves at once and drops a reply in flight; end of input
    /// waits for the current exchange to finish first.
    pub async fn chat(&self) -> Result<String> {
        let session = self.container.start_session();
        let mut render = session.subscribe();
        let initial = render.borrow_and_update().clone();
        let mut renderer = TerminalRenderer::new(&initial);
        let mut stdout = io::stdout();
        renderer.greet(&initial, &mut stdout)?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut exchanges = 0usize;
        let mut drain = true;

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    None => break,
                    Some(line) if line.trim() == QUIT_COMMAND => {
                        drain = false;
                        break;
                    }
                    Some(line) => match session.submit(line).await? {
                        SubmitOutcome::Accepted(id) => {
                            debug!("Submitted exchange {}", id);
                            exchanges += 1;
                        }
                        SubmitOutcome::Ignored(IgnoreReason::Busy(_)) => {
                            writeln!(stdout, "(still replying, message not sent)")?;
                        }
                        SubmitOutcome::Ignored(_) => {}
                    },
                },
                changed = render.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = render.borrow_and_update().clone();
                    renderer.render(&state, &mut stdout)?;
                }
            }
        }

        if drain {
            let state = session.wait_idle().await?;
            renderer.render(&state, &mut stdout)?;
        }
        session.shutdown().await;

        Ok(format!("Session ended after {exchanges} exchange(s)."))
    }
}
