//! services/api/src/web/modes.rs
//!
//! Axum handlers for the learning-mode features: typed questions over the
//! session's documents, chat-style bullet summaries and mode explanations.

use crate::error::port_error_response;
use crate::web::{
    form::FormData,
    protocol::{
        AskResponse, ChatModeResponse, DocumentBulletsInfo, ModeResultInfo,
        ProcessModeResponse, ProcessModeWithVisionResponse, SessionStatusResponse,
        VisionModeResultInfo,
    },
    state::AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use insighthub_core::{assistant::DEFAULT_SUMMARY_ITEMS, UploadedFile};
use std::sync::Arc;
use tracing::info;

/// Treats blank optional fields as absent.
fn optional<'a>(form: &'a FormData, name: &str) -> Option<&'a str> {
    form.text(name).map(str::trim).filter(|v| !v.is_empty())
}

/// Inspect a session and the documents it holds.
#[utoipa::path(
    get,
    path = "/modes/session/{session_id}/status",
    params(("session_id" = String, Path, description = "Session id.")),
    responses((status = 200, description = "Session status", body = SessionStatusResponse))
)]
pub async fn session_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    Json(SessionStatusResponse::from(
        app_state.assistant.session_status(&session_id),
    ))
}

/// Explain every document of a session in a learning mode.
#[utoipa::path(
    post,
    path = "/modes/process-mode",
    request_body(content_type = "multipart/form-data", description = "`mode` (student, teacher, exam, revision, practical) and `session_id`."),
    responses(
        (status = 200, description = "Per-document explanations", body = ProcessModeResponse),
        (status = 400, description = "Unsupported mode or no documents in session")
    )
)]
pub async fn process_mode_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = FormData::read(multipart).await?;
    let mode = form.required("mode")?;
    let session_id = form.required("session_id")?;

    let (mode, results) = app_state
        .assistant
        .process_mode(session_id, mode)
        .await
        .map_err(port_error_response)?;
    info!("Processed {} document(s) in {} mode.", results.len(), mode);
    Ok(Json(ProcessModeResponse {
        mode: mode.as_str().to_string(),
        session_id: session_id.to_string(),
        results: results.into_iter().map(ModeResultInfo::from).collect(),
    }))
}

/// Explain uploaded files in a learning mode and analyse their embedded images.
///
/// The files are processed directly and are not added to the session.
#[utoipa::path(
    post,
    path = "/modes/process-mode-with-vision",
    request_body(content_type = "multipart/form-data", description = "`mode`, `session_id` and one or more `files`."),
    responses(
        (status = 200, description = "Per-file explanations and image analyses", body = ProcessModeWithVisionResponse),
        (status = 400, description = "Unsupported mode, missing or empty files")
    )
)]
pub async fn process_mode_with_vision_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut form = FormData::read(multipart).await?;
    let mode = form.required("mode")?.to_string();
    let session_id = form.required("session_id")?.to_string();
    let files: Vec<UploadedFile> = form
        .take_files("files")
        .into_iter()
        .map(|f| UploadedFile {
            filename: if f.filename.trim().is_empty() {
                "uploaded".to_string()
            } else {
                f.filename
            },
            content: f.content,
        })
        .collect();

    let (mode, results) = app_state
        .assistant
        .process_mode_with_vision(&session_id, &mode, files)
        .await
        .map_err(port_error_response)?;
    Ok(Json(ProcessModeWithVisionResponse {
        mode: mode.as_str().to_string(),
        session_id,
        results: results.into_iter().map(VisionModeResultInfo::from).collect(),
    }))
}

/// Answer a typed question from the best-matching document pages.
#[utoipa::path(
    post,
    path = "/modes/ask",
    request_body(content_type = "multipart/form-data", description = "`session_id`, `question`, optional `doc_id` and `mode`."),
    responses(
        (status = 200, description = "Answer with ranked hits", body = AskResponse),
        (status = 400, description = "Missing fields or no documents in session")
    )
)]
pub async fn ask_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = FormData::read(multipart).await?;
    let session_id = form.required("session_id")?;
    let question = form.required("question")?;

    let result = app_state
        .assistant
        .ask_question(
            session_id,
            question,
            optional(&form, "doc_id"),
            optional(&form, "mode"),
        )
        .await
        .map_err(port_error_response)?;
    Ok(Json(AskResponse::from(result)))
}

/// Bullet summaries of the session's documents, built without a model.
#[utoipa::path(
    post,
    path = "/modes/chat-mode",
    request_body(content_type = "multipart/form-data", description = "`session_id`, optional `doc_id` and `max_items` (default 6)."),
    responses(
        (status = 200, description = "Bullets per document", body = ChatModeResponse),
        (status = 400, description = "Missing session or no documents")
    )
)]
pub async fn chat_mode_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = FormData::read(multipart).await?;
    let session_id = form.required("session_id")?;
    let max_items = match optional(&form, "max_items") {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid max_items: '{}'", raw),
            )
        })?,
        None => DEFAULT_SUMMARY_ITEMS,
    };

    let summaries = app_state
        .assistant
        .chat_summary(session_id, optional(&form, "doc_id"), max_items)
        .map_err(port_error_response)?;
    Ok(Json(ChatModeResponse {
        session_id: session_id.to_string(),
        summaries: summaries.into_iter().map(DocumentBulletsInfo::from).collect(),
    }))
}
