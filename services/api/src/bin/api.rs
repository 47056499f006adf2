//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        FileExtractor, OllamaClient, OllamaTextAdapter, OllamaVisionAdapter,
        TesseractOcrAdapter,
    },
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use insighthub_core::{Assistant, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    if config.model_url.is_none() {
        warn!("OLLAMA_UNIFIED_URL is not set; model answers will use the local fallbacks.");
    }
    let ollama = OllamaClient::new(
        config.model_url.clone(),
        config.model_id.clone(),
        config.model_timeout,
    )?;
    info!("Using model '{}'.", ollama.model_id());

    let extractor = Arc::new(FileExtractor::new(config.docx_chunk_chars));
    let ocr = Arc::new(TesseractOcrAdapter::new(
        config.tesseract_cmd.clone(),
        config.ocr_timeout,
    ));
    let text_model = Arc::new(OllamaTextAdapter::new(ollama.clone()));
    let vision_model = Arc::new(OllamaVisionAdapter::new(ollama));

    // --- 3. Build the Shared AppState ---
    let store = Arc::new(SessionStore::new(config.session_ttl_secs));
    let assistant = Arc::new(Assistant::new(
        store,
        extractor,
        ocr,
        text_model,
        vision_model,
    ));
    let app_state = Arc::new(AppState {
        assistant,
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    let app = router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
