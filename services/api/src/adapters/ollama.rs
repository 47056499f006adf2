//! services/api/src/adapters/ollama.rs
//!
//! Shared plumbing for the unified Ollama `/api/generate` endpoint used by
//! both the text and the vision adapters.

use insighthub_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub num_ctx: u32,
    pub max_tokens: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_k: 40,
            top_p: 0.9,
            num_ctx: 4096,
            max_tokens: 400,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

//=========================================================================================
// The Client
//=========================================================================================

/// A thin client for one Ollama-compatible generate endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: Option<String>,
    model_id: String,
}

impl OllamaClient {
    /// Creates a client. A missing `url` makes every call fail with a model error.
    pub fn new(url: Option<String>, model_id: String, timeout: Duration) -> PortResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url,
            model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Posts a generate request and returns the trimmed, non-empty answer.
    ///
    /// `label` names the model in error messages ("text model", "vision model").
    pub async fn generate(
        &self,
        label: &str,
        prompt: &str,
        system: &str,
        images: Option<Vec<String>>,
        options: GenerateOptions,
    ) -> PortResult<String> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| PortError::Model("Missing OLLAMA_UNIFIED_URL in environment".to_string()))?;

        let payload = GenerateRequest {
            model: &self.model_id,
            prompt,
            system,
            images,
            stream: false,
            options,
        };

        let resp = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Model(format!("Failed to reach {}: {}", label, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PortError::Model(format!("Failed to read {} response: {}", label, e)))?;
        if !status.is_success() {
            return Err(PortError::Model(format!(
                "{} returned {}: {}",
                capitalize(label),
                status.as_u16(),
                body
            )));
        }

        let data: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            PortError::Model(format!("{} returned invalid JSON: {}", capitalize(label), e))
        })?;

        let answer = data.response.unwrap_or_default().trim().to_string();
        if answer.is_empty() {
            return Err(PortError::Model(format!(
                "{} returned an empty response",
                capitalize(label)
            )));
        }
        Ok(answer)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
