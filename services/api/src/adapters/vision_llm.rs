//! services/api/src/adapters/vision_llm.rs
//!
//! This module contains the adapter for the "Vision Tutor" multimodal model.
//! It implements the `VisionModelService` port from the `core` crate.

use crate::adapters::ollama::{GenerateOptions, OllamaClient};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use insighthub_core::ports::{PortError, PortResult, VisionModelService};

const SYSTEM_PROTOCOL: &str = "You are 'Vision Tutor' inside InsightHub-AI. You can understand what the user is viewing \
in a screenshot (document pages, slides, diagrams, tables). \
Explain everything in very clear, student-friendly language.\n\n\
Rules:\n\
1) If a diagram/table/graph is visible, explain it step-by-step.\n\
2) If reference text is provided, stay grounded to it.\n\
3) If something is not present in screenshot or reference text, say so clearly.\n\
4) Keep output clean and readable.\n";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VisionModelService` on top of an Ollama generate endpoint.
#[derive(Clone)]
pub struct OllamaVisionAdapter {
    client: OllamaClient,
}

impl OllamaVisionAdapter {
    /// Creates a new `OllamaVisionAdapter`.
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }

    /// Appends the matched document text to the user's question.
    fn build_prompt(query: &str, context_text: Option<&str>) -> String {
        let prompt = query.trim();
        match context_text.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!(
                "{prompt}\n\nREFERENCE TEXT (from selected documents):\n{context}"
            ),
            None => prompt.to_string(),
        }
    }
}

//=========================================================================================
// `VisionModelService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VisionModelService for OllamaVisionAdapter {
    async fn ask(
        &self,
        query: &str,
        image: &[u8],
        context_text: Option<&str>,
    ) -> PortResult<String> {
        if query.trim().is_empty() {
            return Err(PortError::Model("Missing query".to_string()));
        }
        if image.is_empty() {
            return Err(PortError::Model("Missing image bytes".to_string()));
        }
        let prompt = Self::build_prompt(query, context_text);
        let images = vec![STANDARD.encode(image)];
        self.client
            .generate(
                "vision model",
                &prompt,
                SYSTEM_PROTOCOL,
                Some(images),
                GenerateOptions::default(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn adapter(url: String) -> OllamaVisionAdapter {
        let client =
            OllamaClient::new(Some(url), "vl-model".to_string(), Duration::from_secs(5)).unwrap();
        OllamaVisionAdapter::new(client)
    }

    #[test]
    fn prompt_includes_reference_text_only_when_present() {
        assert_eq!(OllamaVisionAdapter::build_prompt(" q ", None), "q");
        assert_eq!(OllamaVisionAdapter::build_prompt("q", Some("  ")), "q");
        assert_eq!(
            OllamaVisionAdapter::build_prompt("q", Some("ctx")),
            "q\n\nREFERENCE TEXT (from selected documents):\nctx"
        );
    }

    #[tokio::test]
    async fn sends_base64_image_and_returns_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "model": "vl-model",
                "images": ["aGk="],
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"response": "A bar chart."}"#)
            .create_async()
            .await;

        let answer = adapter(server.url())
            .ask("what is shown", b"hi", None)
            .await
            .unwrap();
        assert_eq!(answer, "A bar chart.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let err = adapter("http://127.0.0.1:9".to_string())
            .ask("q", b"", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Model(m) if m == "Missing image bytes"));
    }

    #[tokio::test]
    async fn empty_response_is_a_model_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"done": true}"#)
            .create_async()
            .await;

        let err = adapter(server.url()).ask("q", b"img", None).await.unwrap_err();
        assert!(matches!(err, PortError::Model(m) if m == "Vision model returned an empty response"));
    }
}
