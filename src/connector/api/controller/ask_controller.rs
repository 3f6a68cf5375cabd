use std::io;

use anyhow::Result;
use tracing::debug;

use crate::application::SubmitOutcome;
use crate::connector::api::terminal::TerminalRenderer;
use crate::domain::DomainError;

use super::super::Container;

pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Run a single exchange and type the reply out to stdout.
    pub async fn ask(&self, prompt: String) -> Result<String> {
        debug!(
            "Asking via {} ({}ms per character)",
            self.container.gateway().name(),
            self.container.reveal_period().as_millis()
        );
        let session = self.container.start_session();
        let mut render = session.subscribe();
        let initial = render.borrow_and_update().clone();
        let mut renderer = TerminalRenderer::new(&initial);

        if let SubmitOutcome::Ignored(reason) = session.submit(prompt).await? {
            session.shutdown().await;
            return Err(DomainError::invalid_input(format!("prompt not sent: {reason:?}")).into());
        }

        let mut stdout = io::stdout();
        loop {
            let state = render.borrow_and_update().clone();
            renderer.render(&state, &mut stdout)?;
            if state.is_idle() {
                break;
            }
            render.changed().await?;
        }

        session.shutdown().await;
        Ok(String::new())
    }
}
