//! HTTP API
//!
//! Routes:
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | POST | `/api/tutor` | `{ messages, mode? }` | `{ message, usage?, backend }` |
//! | POST | `/api/fallback-tutor` | `{ messages, mode? }` | `{ message, backend }` |
//! | POST | `/api/sessions` | `{ mode? }` | session snapshot |
//! | GET | `/api/sessions/:id` | | session snapshot |
//! | POST | `/api/sessions/:id/messages` | `{ content }` | `{ message, usage?, backend }` |
//! | DELETE | `/api/sessions/:id` | | 204 |
//! | POST | `/api/sessions/:id/mode` | `{ mode }` | `{ mode, greeting? }` |
//! | GET | `/health` | | `{ status }` |
//!
//! JSON extractor rejections are mapped to a 400 with the JSON error body.

use crate::error::Error;
use crate::router::{self, TutorRouter};
use crate::session::{SessionRegistry, SessionSnapshot, TurnReply};
use crate::types::{ConversationMessage, Mode};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Backend name reported by the fallback-only route.
const FALLBACK_BACKEND: &str = "canned";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<TutorRouter>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Sessions idle for longer than `session_ttl` are evicted.
    pub fn new(router: TutorRouter, session_ttl: Duration) -> Self {
        let sessions = SessionRegistry::with_ttl(router.escalation(), session_ttl);
        Self {
            router: Arc::new(router),
            sessions: Arc::new(sessions),
        }
    }
}

/// Build the API router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tutor", post(tutor))
        .route("/api/fallback-tutor", post(fallback_tutor))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id/mode", post(switch_mode))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ============================================
// Errors
// ============================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("busy: {0}")]
    Busy(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Busy(detail) => (
                StatusCode::CONFLICT,
                "SESSION_BUSY",
                format!("Session {detail} is still answering the previous message"),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::SessionNotFound(id) => ApiError::NotFound(format!("session {id}")),
            Error::NotFound(what) => ApiError::NotFound(what),
            Error::SessionBusy(id) => ApiError::Busy(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// ============================================
// Requests
// ============================================

#[derive(Debug, Deserialize)]
struct TutorRequest {
    messages: Option<Value>,
    mode: Option<Mode>,
}

impl TutorRequest {
    /// Validated conversation and mode.
    fn into_parts(self) -> Result<(Vec<ConversationMessage>, Mode), ApiError> {
        let messages = match self.messages {
            Some(messages @ Value::Array(_)) => messages,
            _ => return Err(ApiError::BadRequest("Messages array is required.".to_string())),
        };
        let messages: Vec<ConversationMessage> = serde_json::from_value(messages)
            .map_err(|e| ApiError::BadRequest(format!("Invalid message: {e}")))?;
        router::validate(&messages)?;
        Ok((messages, self.mode.unwrap_or_default()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    mode: Option<Mode>,
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct SwitchModeRequest {
    mode: Mode,
}

// ============================================
// Handlers
// ============================================

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn tutor(
    State(state): State<AppState>,
    payload: Result<Json<TutorRequest>, JsonRejection>,
) -> ApiResult<TurnReply> {
    let Json(request) = payload?;
    let (messages, mode) = request.into_parts()?;
    let outcome = state.router.route(&messages, mode).await?;
    Ok(Json(TurnReply {
        message: outcome.message,
        usage: outcome.usage,
        backend: outcome.backend,
    }))
}

async fn fallback_tutor(
    State(state): State<AppState>,
    payload: Result<Json<TutorRequest>, JsonRejection>,
) -> ApiResult<TurnReply> {
    let Json(request) = payload?;
    let (messages, mode) = request.into_parts()?;
    let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
    let reply = state.router.engine().respond(last);
    Ok(Json(TurnReply {
        message: ConversationMessage::assistant(reply).with_mode(mode),
        usage: None,
        backend: FALLBACK_BACKEND.to_string(),
    }))
}

/// An empty body opens a session in the default mode.
async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        Json::<CreateSessionRequest>::from_bytes(&body)?.0
    };
    let mode = request.mode.unwrap_or_default();
    let snapshot = state.sessions.create(mode);
    tracing::info!(session = %snapshot.id, mode = %mode, "Created session");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionSnapshot> {
    Ok(Json(state.sessions.snapshot(&id).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(&id)?;
    tracing::info!(session = %id, "Deleted session");
    Ok(StatusCode::NO_CONTENT)
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<TurnReply> {
    let Json(request) = payload?;

    let mut session = state.sessions.acquire(&id)?;
    let reply = session.submit(&state.router, &request.content).await?;
    Ok(Json(reply))
}

#[derive(Debug, Serialize)]
struct ModeSwitch {
    mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    greeting: Option<ConversationMessage>,
}

async fn switch_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SwitchModeRequest>, JsonRejection>,
) -> ApiResult<ModeSwitch> {
    let Json(SwitchModeRequest { mode }) = payload?;

    let mut session = state.sessions.acquire(&id)?;
    let greeting = session.switch_mode(mode);
    Ok(Json(ModeSwitch { mode, greeting }))
}
