use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::application::{ChatSession, ChatSessionHandle, CompletionGateway, SessionOptions};
use crate::connector::adapter::{CannedGateway, HttpGateway, OpenAiCompatClient, ProviderGateway};
use crate::domain::DomainError;

pub struct ContainerConfig {
    /// Root URL of a running chat server. When set, exchanges go through
    /// `POST /api/chat` instead of calling the provider in-process.
    pub endpoint: Option<String>,
    /// Answer with canned replies; no network at all.
    pub offline: bool,
    /// Delay between revealed characters.
    pub reveal_period: Duration,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            offline: false,
            reveal_period: crate::application::DEFAULT_REVEAL_PERIOD,
        }
    }
}

pub struct Container {
    gateway: Arc<dyn CompletionGateway>,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let gateway: Arc<dyn CompletionGateway> = match (&config.endpoint, config.offline) {
            (Some(_), true) => {
                return Err(DomainError::configuration(
                    "--endpoint and --offline cannot be combined",
                )
                .into());
            }
            (Some(endpoint), false) => {
                let gateway = HttpGateway::new(endpoint.as_str());
                debug!("Using chat endpoint at {}", gateway.url());
                Arc::new(gateway)
            }
            (None, true) => {
                debug!("Using canned offline replies");
                Arc::new(CannedGateway::new())
            }
            (None, false) => {
                let client = OpenAiCompatClient::from_env();
                debug!("Using provider at {}", client.url());
                Arc::new(ProviderGateway::new(Arc::new(client)))
            }
        };

        Ok(Self { gateway, config })
    }

    pub fn gateway(&self) -> Arc<dyn CompletionGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::default().with_reveal_period(self.config.reveal_period)
    }

    pub fn start_session(&self) -> ChatSessionHandle {
        ChatSession::spawn(self.gateway(), self.session_options())
    }

    pub fn reveal_period(&self) -> Duration {
        self.config.reveal_period
    }
}
