//! REST endpoints: session creation, message handling, progress, transcript
//! and document download.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::AppState;
use crate::error::{DatabaseError, Error};
use crate::flow::FlowOutcome;
use crate::session::{ChatEntry, Sender, Session, SessionState};

const GREETING: &str = "Hello! I am your Resume Assistant. ";
const DONE_REPLY: &str =
    "All required information collected. Type GENERATE RESUME to download your resume.";
const ALREADY_DONE_REPLY: &str =
    "Information already collected. Type GENERATE RESUME to get the document or NEW to start over.";

/// Build the Axum router with every API route.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/api/health", get(health))
        .route("/api/session", post(create_session))
        .route("/api/resume", post(post_message))
        .route("/api/session/{id}/progress", get(get_progress))
        .route("/api/session/{id}/messages", get(get_messages))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

fn session_not_found() -> Response {
    error_json(StatusCode::NOT_FOUND, "Session not found")
}

// ── Health ──────────────────────────────────────────────────────────────

async fn banner() -> &'static str {
    "Resume assistant API is running"
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Ok",
        "uptime": uptime_secs(state.started_at),
    }))
}

fn uptime_secs(started_at: Instant) -> f64 {
    started_at.elapsed().as_secs_f64()
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn create_session(State(state): State<AppState>) -> Response {
    let session = Session::new(state.engine.registry().len());
    let initial_message = format!("{GREETING}{}", state.engine.first_prompt());

    let created: Result<(), DatabaseError> = async {
        state.store.insert_session(&session).await?;
        state
            .store
            .add_message(session.session_id, Sender::Ai, &initial_message)
            .await
    }
    .await;

    match created {
        Ok(()) => {
            info!(session_id = %session.session_id, "Session created");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "sessionId": session.session_id,
                    "initialMessage": initial_message,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create session");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        }
    }
}

async fn get_progress(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(session_id) = Uuid::parse_str(&id) else {
        return session_not_found();
    };

    match state.store.get_session(session_id).await {
        Ok(Some(session)) => Json(state.engine.progress(&session)).into_response(),
        Ok(None) => session_not_found(),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to load session");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load session")
        }
    }
}

async fn get_messages(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(session_id) = Uuid::parse_str(&id) else {
        return session_not_found();
    };

    let loaded: Result<Option<Vec<ChatEntry>>, DatabaseError> = async {
        match state.store.get_session(session_id).await? {
            Some(_) => state.store.list_messages(session_id).await.map(Some),
            None => Ok(None),
        }
    }
    .await;

    match loaded {
        Ok(Some(messages)) => Json(messages).into_response(),
        Ok(None) => session_not_found(),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to load transcript");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load transcript")
        }
    }
}

// ── Messages ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest {
    session_id: Option<String>,
    message: Option<String>,
}

/// What the user asked for with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Generate,
    StartOver,
    Answer,
}

impl Command {
    /// `NEW` only restarts a finished interview. While questions remain it
    /// is an ordinary answer.
    fn parse(message: &str, finished: bool) -> Self {
        let trimmed = message.trim();
        if trimmed.eq_ignore_ascii_case("GENERATE RESUME") {
            Self::Generate
        } else if finished && trimmed.eq_ignore_ascii_case("NEW") {
            Self::StartOver
        } else {
            Self::Answer
        }
    }
}

async fn post_message(
    State(state): State<AppState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Malformed message body");
            return error_json(StatusCode::BAD_REQUEST, "sessionId and message are required");
        }
    };
    let session_id = req.session_id.filter(|s| !s.is_empty());
    let message = req.message.filter(|s| !s.is_empty());
    let (Some(session_id), Some(message)) = (session_id, message) else {
        return error_json(StatusCode::BAD_REQUEST, "sessionId and message are required");
    };
    let Ok(session_id) = Uuid::parse_str(session_id.trim()) else {
        return session_not_found();
    };

    let _guard = state.locks.acquire(session_id).await;

    match handle_message(&state, session_id, &message).await {
        Ok(Some(response)) => response,
        Ok(None) => session_not_found(),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to handle message");
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process message or generate resume",
            )
        }
    }
}

/// Load → process → save for one message. `None` when the session is unknown.
async fn handle_message(
    state: &AppState,
    session_id: Uuid,
    message: &str,
) -> Result<Option<Response>, Error> {
    let Some(mut session) = state.store.get_session(session_id).await? else {
        return Ok(None);
    };
    state
        .store
        .add_message(session_id, Sender::User, message)
        .await?;

    let total = state.engine.registry().len();
    let finished = session.progress.phase().is_terminal();
    let reply = match Command::parse(message, finished) {
        Command::Generate => {
            session.state = SessionState::ReadyToGenerate;
            state.store.save_session(&session).await?;
            state
                .store
                .save_resume(session_id, &session.resume_data)
                .await?;

            let doc = state.renderer.render(&session.resume_data)?;
            info!(session_id = %session_id, bytes = doc.bytes.len(), "Resume generated");
            let disposition = format!(
                "attachment; filename=\"resume_{session_id}.{}\"",
                doc.file_extension
            );
            return Ok(Some(
                (
                    [
                        (header::CONTENT_TYPE, doc.content_type.to_string()),
                        (header::CONTENT_DISPOSITION, disposition),
                    ],
                    doc.bytes,
                )
                    .into_response(),
            ));
        }
        Command::StartOver => {
            session.reset(total);
            info!(session_id = %session_id, "Session restarted");
            state.engine.first_prompt().to_string()
        }
        Command::Answer if finished => ALREADY_DONE_REPLY.to_string(),
        Command::Answer => match state.engine.process_answer(&mut session, message).await {
            FlowOutcome::Retry { error, prompt } => format!("{error} Please try again. {prompt}"),
            FlowOutcome::Next { prompt } => prompt,
            FlowOutcome::Done => DONE_REPLY.to_string(),
        },
    };

    state.store.save_session(&session).await?;
    state
        .store
        .add_message(session_id, Sender::Ai, &reply)
        .await?;

    let progress = state.engine.progress(&session);
    Ok(Some(
        Json(serde_json::json!({
            "sessionId": session_id,
            "aiResponse": reply,
            "resumeData": session.resume_data,
            "progress": progress,
        }))
        .into_response(),
    ))
}
