use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::ChatClient;
use crate::domain::GatewayError;

/// Default target: Groq's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ApiMessage<'a>; 2],
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for OpenAI-compatible chat completion APIs (Groq by default).
///
/// Implements [`ChatClient`]; the chat route and the in-process gateway stay
/// decoupled from transport and serialization details.
///
/// Configured from the environment:
///
/// | Variable                 | Default                        | Purpose             |
/// |--------------------------|--------------------------------|---------------------|
/// | `CHAT_PROVIDER_BASE_URL` | `https://api.groq.com/openai`  | Any compatible API  |
/// | `CHAT_MODEL`             | `llama3-70b-8192`              | Model identifier    |
/// | `GROQ_API_KEY`           | `""` (empty)                   | Bearer token        |
///
/// Only the connection phase has a timeout. Once connected the call waits for
/// the provider to answer or fail.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiCompatClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), COMPLETIONS_PATH);
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            url,
        }
    }

    pub fn from_env() -> Self {
        let base = std::env::var("CHAT_PROVIDER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let key = std::env::var("GROQ_API_KEY").unwrap_or_default();
        if key.is_empty() {
            warn!("GROQ_API_KEY is not set; the provider will likely reject requests");
        }
        Self::new(key, model, base)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatClient for OpenAiCompatClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, GatewayError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens,
            messages: [
                ApiMessage {
                    role: "system",
                    content: system,
                },
                ApiMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("provider request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!("Provider error body: {body}");
            return Err(GatewayError::upstream(format!(
                "provider returned {status}"
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::malformed(format!("failed to parse provider response: {e}")))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::malformed("provider response has no message content"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::FailureKind;

    #[test]
    fn url_joins_base_and_path() {
        let client = OpenAiCompatClient::new("", "m", "http://localhost:8080/");
        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 500,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi!"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::new("secret", "test-model", server.uri());
        let reply = client.complete("be brief", "hello", 500).await.unwrap();

        assert_eq!(reply, "Hi!");
    }

    #[tokio::test]
    async fn provider_rejection_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::new("bad", "m", server.uri());
        let err = client.complete("s", "u", 10).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::UpstreamError);
    }

    #[tokio::test]
    async fn unexpected_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::new("", "m", server.uri());
        let err = client.complete("s", "u", 10).await.unwrap_err();

        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = OpenAiCompatClient::new("", "m", format!("http://{addr}"));
        let err = client.complete("s", "u", 10).await.unwrap_err();

        assert!(err.is_network());
    }
}
