use async_trait::async_trait;

use crate::domain::GatewayError;

/// An interface for sending a prompt to an upstream model provider.
///
/// Implementors own the wire format of their provider and classify failures
/// into [`crate::domain::FailureKind`]s.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a `system` preamble followed by a `user` prompt and return the
    /// assistant's raw response text.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, GatewayError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
