use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::CompletionGateway;
use crate::connector::adapter::{ChatErrorResponse, ChatRequest, ChatResponse, CHAT_PATH};

/// Error text returned to clients for every failure.
pub const GENERATION_FAILED: &str = "Failed to generate response";

#[derive(Clone)]
struct RouteState {
    gateway: Arc<dyn CompletionGateway>,
}

/// Build the app: a single `POST /api/chat` route backed by `gateway`.
pub fn chat_router(gateway: Arc<dyn CompletionGateway>) -> Router {
    Router::new()
        .route(CHAT_PATH, post(chat))
        .with_state(RouteState { gateway })
}

/// Serve [`chat_router`] on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    gateway: Arc<dyn CompletionGateway>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!("Chat endpoint listening on http://{}{}", addr, CHAT_PATH);

    axum::serve(listener, chat_router(gateway))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn chat(
    State(state): State<RouteState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            error!(%request_id, "Error generating response: {}", rejection.body_text());
            return generation_failed();
        }
    };

    match state.gateway.complete(&request.message).await {
        Ok(response) => {
            info!(%request_id, "Generated {} chars", response.chars().count());
            (StatusCode::OK, Json(ChatResponse { response })).into_response()
        }
        Err(e) => {
            error!(%request_id, kind = %e.kind(), "Error generating response: {}", e.message());
            generation_failed()
        }
    }
}

fn generation_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ChatErrorResponse {
            error: GENERATION_FAILED.to_string(),
        }),
    )
        .into_response()
}
