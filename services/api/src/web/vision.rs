//! services/api/src/web/vision.rs
//!
//! Axum handlers for the Vision Tutor: document upload and listing, session
//! deletion and screenshot questions.

use crate::error::port_error_response;
use crate::web::{
    form::FormData,
    protocol::{DeleteSessionResponse, DocumentsResponse, VisionAskResponse},
    state::AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use insighthub_core::UploadedFile;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

fn require_session_id(session_id: &str) -> Result<(), (StatusCode, String)> {
    if session_id.trim().is_empty() {
        Err((StatusCode::BAD_REQUEST, "Missing session_id".to_string()))
    } else {
        Ok(())
    }
}

/// Verify the Vision Tutor backend is reachable.
#[utoipa::path(
    get,
    path = "/vision/test",
    responses((status = 200, description = "Backend is reachable"))
)]
pub async fn vision_test_handler() -> impl IntoResponse {
    Json(json!({ "message": "Vision Tutor backend — connected", "status": "ok" }))
}

/// Upload one or more documents into a session.
///
/// Each file is split into pages (PDF), slides (PPTX) or chunks (DOCX) and
/// stored in memory for the session.
#[utoipa::path(
    post,
    path = "/vision/session/{session_id}/documents",
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts (PDF/PPTX/DOCX/JPG/PNG)."),
    params(("session_id" = String, Path, description = "Caller-chosen session id.")),
    responses(
        (status = 200, description = "Documents stored", body = DocumentsResponse),
        (status = 400, description = "Missing files, empty file or unsupported type")
    )
)]
pub async fn upload_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_session_id(&session_id)?;
    let mut form = FormData::read(multipart).await?;
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

    let documents = app_state
        .assistant
        .upload_documents(&session_id, files)
        .await
        .map_err(|e| {
            error!("Upload to session {} failed: {}", session_id, e);
            port_error_response(e)
        })?;
    info!("Uploaded {} document(s) to session {}.", documents.len(), session_id);
    Ok(Json(DocumentsResponse::new(&session_id, documents)))
}

/// List the documents stored in a session.
#[utoipa::path(
    get,
    path = "/vision/session/{session_id}/documents",
    params(("session_id" = String, Path, description = "Session id.")),
    responses((status = 200, description = "Documents in the session", body = DocumentsResponse))
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_session_id(&session_id)?;
    let documents = app_state
        .assistant
        .list_documents(&session_id)
        .map_err(port_error_response)?;
    Ok(Json(DocumentsResponse::new(&session_id, documents)))
}

/// Ask a question about a screenshot, grounded in the selected documents.
#[utoipa::path(
    post,
    path = "/vision/session/{session_id}/ask",
    request_body(content_type = "multipart/form-data", description = "`query`, one or more `selected_doc_ids`, and an `image` file."),
    params(("session_id" = String, Path, description = "Session id.")),
    responses(
        (status = 200, description = "Answer and matched pages", body = VisionAskResponse),
        (status = 400, description = "Missing query, image or document selection")
    )
)]
pub async fn vision_ask_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_session_id(&session_id)?;
    let mut form = FormData::read(multipart).await?;
    let query = form.required("query")?.to_string();
    let selected_doc_ids = form.texts("selected_doc_ids");
    let image = form
        .take_files("image")
        .into_iter()
        .next()
        .map(|f| f.content)
        .unwrap_or_default();

    let answer = app_state
        .assistant
        .ask_screenshot(&session_id, &query, &selected_doc_ids, &image)
        .await
        .map_err(port_error_response)?;
    Ok(Json(VisionAskResponse::from(answer)))
}

/// Delete a session and all of its stored documents.
#[utoipa::path(
    delete,
    path = "/vision/session/{session_id}",
    params(("session_id" = String, Path, description = "Session id.")),
    responses((status = 200, description = "Whether a session was removed", body = DeleteSessionResponse))
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_session_id(&session_id)?;
    let deleted = app_state
        .assistant
        .delete_session(&session_id)
        .map_err(port_error_response)?;
    Ok(Json(DeleteSessionResponse {
        session_id,
        deleted,
    }))
}
