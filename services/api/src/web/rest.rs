//! services/api/src/web/rest.rs
//!
//! Contains the service-level REST handlers and the master definition for the
//! OpenAPI specification.

use crate::web::{modes, protocol, vision};
use axum::response::{IntoResponse, Json};
use serde_json::json;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        health_handler,
        vision::vision_test_handler,
        vision::upload_documents_handler,
        vision::list_documents_handler,
        vision::vision_ask_handler,
        vision::delete_session_handler,
        modes::session_status_handler,
        modes::process_mode_handler,
        modes::process_mode_with_vision_handler,
        modes::ask_handler,
        modes::chat_mode_handler,
    ),
    components(
        schemas(
            protocol::DocumentInfo,
            protocol::DocumentsResponse,
            protocol::DeleteSessionResponse,
            protocol::SessionStatusResponse,
            protocol::MatchedPageInfo,
            protocol::VisionAskResponse,
            protocol::HitInfo,
            protocol::AskResponse,
            protocol::DocumentBulletsInfo,
            protocol::ChatModeResponse,
            protocol::PageInfo,
            protocol::ModeExplanationInfo,
            protocol::ModeResultInfo,
            protocol::ProcessModeResponse,
            protocol::VisionAnalysisInfo,
            protocol::VisionModeResultInfo,
            protocol::ProcessModeWithVisionResponse,
        )
    ),
    tags(
        (name = "InsightHub-AI API", description = "Document upload, screenshot tutoring and learning-mode endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Backend is running"))
)]
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "InsightHub-AI backend is running" }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
