//! crates/insighthub_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of file parsers, OCR engines and model endpoints.

use crate::domain::{DocType, EmbeddedImage, Page};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// A required identifier or input was empty or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A session or requested documents do not exist.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The uploaded file is unsupported or could not be parsed.
    #[error("{0}")]
    Extraction(String),
    /// The downstream model was unreachable or returned unusable output.
    #[error("Model error: {0}")]
    Model(String),
    /// OCR failed or is not available on this host.
    #[error("OCR error: {0}")]
    Ocr(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Converts raw file bytes into a document type and its ordered pages.
    async fn extract(&self, filename: &str, content: &[u8]) -> PortResult<(DocType, Vec<Page>)>;

    /// Pulls embedded images worth analysing out of a document. Extractors
    /// that cannot see images return none.
    async fn extract_images(
        &self,
        _filename: &str,
        _content: &[u8],
    ) -> PortResult<Vec<EmbeddedImage>> {
        Ok(Vec::new())
    }
}

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Reads the visible text from an image.
    async fn image_to_text(&self, image: &[u8]) -> PortResult<String>;
}

#[async_trait]
pub trait TextModelService: Send + Sync {
    /// Sends a text-only prompt and returns the model's answer.
    async fn ask(&self, query: &str, system_hint: Option<&str>) -> PortResult<String>;

    /// Like `ask`, but caps the answer at `max_tokens`. Adapters without a
    /// length control fall back to `ask`.
    async fn ask_with_budget(
        &self,
        query: &str,
        system_hint: Option<&str>,
        _max_tokens: u32,
    ) -> PortResult<String> {
        self.ask(query, system_hint).await
    }

    /// The model identifier reported alongside generated content.
    fn model_id(&self) -> &str;
}

#[async_trait]
pub trait VisionModelService: Send + Sync {
    /// Asks a question about an image, optionally grounded by reference text.
    async fn ask(
        &self,
        query: &str,
        image: &[u8],
        context_text: Option<&str>,
    ) -> PortResult<String>;
}
