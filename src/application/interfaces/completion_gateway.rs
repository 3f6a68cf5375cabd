use async_trait::async_trait;

use crate::domain::GatewayResult;

/// Turns one prompt into one reply.
///
/// Exactly one outbound call per invocation: no retry, no caching. Callers
/// only pass prompts that are non-empty after trimming; implementations do
/// not re-check. Every failure is logged by the implementation before it is
/// returned.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> GatewayResult;

    /// Short label for logs, e.g. `"http"` or `"canned"`.
    fn name(&self) -> &str;
}
