use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::CompletionGateway;
use crate::domain::{GatewayError, GatewayResult};

pub const CHAT_PATH: &str = "/api/chat";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// `200` body of `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `500` body of `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub error: String,
}

/// A [`CompletionGateway`] that calls a chat endpoint over HTTP.
///
/// This is what the widget uses in the browser-like setup: the upstream
/// provider sits behind the server and only `{message}` / `{response}`
/// crosses the wire.
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpGateway {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), CHAT_PATH);
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, prompt: &str) -> GatewayResult {
        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest {
                message: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("chat endpoint unreachable: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::network(format!("reading chat response failed: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ChatErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(GatewayError::upstream(format!(
                "chat endpoint returned {status}: {detail}"
            )));
        }

        serde_json::from_slice::<ChatResponse>(&body)
            .map(|r| r.response)
            .map_err(|e| GatewayError::malformed(format!("unexpected chat response body: {e}")))
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, prompt: &str) -> GatewayResult {
        debug!("POST {}", self.url);
        let result = self.call(prompt).await;
        if let Err(e) = &result {
            warn!(kind = %e.kind(), "Chat request failed: {}", e.message());
        }
        result
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::FailureKind;

    #[tokio::test]
    async fn posts_message_and_reads_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({"message": "Hello"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "Hi there!"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = HttpGateway::new(server.uri());

        assert_eq!(gateway.complete("Hello").await.unwrap(), "Hi there!");
    }

    #[tokio::test]
    async fn server_error_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "Failed to generate response"})),
            )
            .mount(&server)
            .await;

        let err = HttpGateway::new(server.uri())
            .complete("Hello")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::UpstreamError);
        assert!(err.message().contains("Failed to generate response"));
    }

    #[tokio::test]
    async fn success_without_response_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = HttpGateway::new(server.uri())
            .complete("Hello")
            .await
            .unwrap_err();

        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let err = HttpGateway::new(format!("http://{addr}"))
            .complete("Hello")
            .await
            .unwrap_err();

        assert!(err.is_network());
    }
}
