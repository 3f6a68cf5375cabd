use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::application::{ChatClient, CompletionGateway};
use crate::domain::GatewayResult;

/// Persona preamble sent with every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Answer questions clearly and \
concisely in 1–2 sentences. Be direct and avoid unnecessary elaboration.";

/// Upper bound on the length of a reply, in tokens.
pub const MAX_OUTPUT_TOKENS: u32 = 500;

/// A [`CompletionGateway`] that talks to the upstream provider directly,
/// with the fixed preamble and output limit.
///
/// Also backs the `POST /api/chat` route, so both paths share one failure
/// taxonomy and one log line per failure.
pub struct ProviderGateway {
    client: Arc<dyn ChatClient>,
}

impl ProviderGateway {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionGateway for ProviderGateway {
    async fn complete(&self, prompt: &str) -> GatewayResult {
        debug!(
            "Requesting completion from {} ({} chars)",
            self.client.model(),
            prompt.chars().count()
        );

        let result = self
            .client
            .complete(SYSTEM_PROMPT, prompt, MAX_OUTPUT_TOKENS)
            .await;

        if let Err(e) = &result {
            error!(kind = %e.kind(), "Error generating response: {}", e.message());
        }
        result
    }

    fn name(&self) -> &str {
        "provider"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::GatewayError;

    struct Recording {
        seen: Mutex<Vec<(String, String, u32)>>,
        reply: Result<String, GatewayError>,
    }

    #[async_trait]
    impl ChatClient for Recording {
        async fn complete(
            &self,
            system: &str,
            user: &str,
            max_tokens: u32,
        ) -> Result<String, GatewayError> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string(), max_tokens));
            self.reply.clone()
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn passes_fixed_preamble_and_limit() {
        let client = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            reply: Ok("  raw reply  ".into()),
        });
        let gateway = ProviderGateway::new(client.clone());

        let reply = gateway.complete("What is Rust?").await.unwrap();

        assert_eq!(reply, "  raw reply  ", "gateway must not format");
        let seen = client.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[(
                SYSTEM_PROMPT.to_string(),
                "What is Rust?".to_string(),
                MAX_OUTPUT_TOKENS
            )]
        );
    }

    #[tokio::test]
    async fn failures_pass_through_unchanged() {
        let client = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            reply: Err(GatewayError::upstream("quota exceeded")),
        });
        let gateway = ProviderGateway::new(client.clone());

        let err = gateway.complete("hi").await.unwrap_err();

        assert!(err.is_upstream());
        assert_eq!(client.seen.lock().unwrap().len(), 1, "no retry");
    }
}
