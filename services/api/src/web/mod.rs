pub mod form;
pub mod modes;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod vision;

use crate::web::{rest::ApiDoc, state::AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the CORS layer from the configured origins.
fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);
    if state.config.allows_any_origin() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'.", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Assembles the complete application: Vision Tutor and learning-mode routes,
/// service endpoints and the Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    let vision_routes = Router::new()
        .route("/test", get(vision::vision_test_handler))
        .route(
            "/session/{session_id}/documents",
            post(vision::upload_documents_handler).get(vision::list_documents_handler),
        )
        .route("/session/{session_id}/ask", post(vision::vision_ask_handler))
        .route("/session/{session_id}", delete(vision::delete_session_handler));

    let mode_routes = Router::new()
        .route(
            "/session/{session_id}/status",
            get(modes::session_status_handler),
        )
        .route("/process-mode", post(modes::process_mode_handler))
        .route(
            "/process-mode-with-vision",
            post(modes::process_mode_with_vision_handler),
        )
        .route("/ask", post(modes::ask_handler))
        .route("/chat-mode", post(modes::chat_mode_handler));

    let cors = cors_layer(&state);
    let api_router = Router::new()
        .route("/", get(rest::root_handler))
        .route("/health", get(rest::health_handler))
        .nest("/vision", vision_routes)
        .nest("/modes", mode_routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
