//! services/api/src/adapters/text_llm.rs
//!
//! This module contains the adapter for the text-only tutor model.
//! It implements the `TextModelService` port from the `core` crate.

use crate::adapters::ollama::{GenerateOptions, OllamaClient};
use async_trait::async_trait;
use insighthub_core::ports::{PortError, PortResult, TextModelService};
use tracing::debug;

const DEFAULT_SYSTEM: &str = "You are a concise, accurate tutor. Keep answers short and grounded to the provided question/context.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextModelService` on top of an Ollama generate endpoint.
#[derive(Clone)]
pub struct OllamaTextAdapter {
    client: OllamaClient,
}

impl OllamaTextAdapter {
    /// Creates a new `OllamaTextAdapter`.
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// `TextModelService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextModelService for OllamaTextAdapter {
    async fn ask(&self, query: &str, system_hint: Option<&str>) -> PortResult<String> {
        self.ask_with_budget(query, system_hint, GenerateOptions::default().max_tokens)
            .await
    }

    async fn ask_with_budget(
        &self,
        query: &str,
        system_hint: Option<&str>,
        max_tokens: u32,
    ) -> PortResult<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PortError::Model("Missing query".to_string()));
        }
        let system = system_hint.unwrap_or(DEFAULT_SYSTEM).trim();
        let options = GenerateOptions {
            max_tokens,
            ..GenerateOptions::default()
        };
        debug!("Sending {} chars to the text model.", query.len());
        self.client
            .generate("text model", query, system, None, options)
            .await
    }

    fn model_id(&self) -> &str {
        self.client.model_id()
    }
}
