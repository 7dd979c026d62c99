//! HTTP API endpoint handlers.
//!
//! Platform failures are embedded in a 200 JSON body; only malformed input gets a 400.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{info, warn};

use crate::{
    adapters::http::{
        dto::{ApiResponse, ChatRequest},
        state::AppState,
    },
    domain::{ChatRef, DomainError},
};

const MISSING_USERNAME: &str = "Missing 'username'";
const INVALID_CHAT_ID: &str = "Invalid chat ID format";

type Reply = (StatusCode, Json<ApiResponse>);

fn bad_request(message: &str) -> Reply {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

/// Runs on the shared runtime as its own task, so a dropped connection does not cancel a run.
async fn run_to_completion<T, F>(fut: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, DomainError>> + Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| DomainError::TgGateway(format!("run aborted: {}", e)))?
}

fn reference_from(body: Result<Json<ChatRequest>, JsonRejection>) -> Option<String> {
    match body {
        Ok(Json(req)) => req.reference(),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable request body");
            None
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Approve everything pending in the configured default chat.
pub async fn run_default(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let result = match state.default_chat.clone() {
        None => "CHAT_ID is not configured".to_string(),
        Some(chat) => {
            info!(chat = %chat, "approval run triggered for default chat");
            let approval = Arc::clone(&state.approval);
            match run_to_completion(async move { approval.run_for_chat(&chat).await }).await {
                Ok(summary) => summary.to_string(),
                Err(e) => {
                    warn!(error = %e, "approval run failed");
                    e.to_string()
                }
            }
        }
    };
    Json(ApiResponse::Done { result })
}

/// Join a chat by invite link or handle.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Reply {
    let Some(reference) = reference_from(body) else {
        return bad_request(MISSING_USERNAME);
    };
    info!(reference = %reference, "join triggered");

    let join = Arc::clone(&state.join);
    let response = match run_to_completion(async move { join.join(&reference).await }).await {
        Ok(chat) => ApiResponse::Joined {
            title: chat.title,
            id: chat.id,
        },
        Err(e) => {
            warn!(error = %e, "join failed");
            ApiResponse::error(e.to_string())
        }
    };
    (StatusCode::OK, Json(response))
}

/// Approve everything pending in the referenced chat.
pub async fn accept(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Reply {
    let Some(reference) = reference_from(body) else {
        return bad_request(MISSING_USERNAME);
    };
    let chat = match ChatRef::parse(&reference) {
        Ok(chat) => chat,
        Err(e) => {
            warn!(error = %e, "rejected chat reference");
            return bad_request(INVALID_CHAT_ID);
        }
    };
    info!(chat = %chat, "approval run triggered");

    let approval = Arc::clone(&state.approval);
    let response =
        match run_to_completion(async move { approval.run_for_reference(&chat).await }).await {
            Ok(summary) => ApiResponse::Success {
                approved: summary.approved,
                skipped: summary.skipped,
            },
            Err(e) => {
                warn!(error = %e, "approval run failed");
                ApiResponse::error(e.to_string())
            }
        };
    (StatusCode::OK, Json(response))
}
