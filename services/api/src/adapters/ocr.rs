//! services/api/src/adapters/ocr.rs
//!
//! This module contains the OCR adapter backed by the Tesseract CLI.
//! It implements the `OcrService` port from the `core` crate.

use async_trait::async_trait;
use insighthub_core::ports::{OcrService, PortError, PortResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::debug;

/// Runs `<command> stdin stdout`, piping the image in and reading text out.
///
/// A run that outlives `timeout` is abandoned; the child is killed on drop.
#[derive(Clone, Debug)]
pub struct TesseractOcrAdapter {
    command: String,
    timeout: Duration,
}

impl TesseractOcrAdapter {
    /// Creates a new `TesseractOcrAdapter` for the given executable.
    pub fn new(command: String, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

/// Writes the image, closes stdin and collects the child's output.
async fn run_to_completion(mut child: Child, image: &[u8]) -> PortResult<std::process::Output> {
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(image)
            .await
            .map_err(|e| PortError::Ocr(format!("Failed to send image to OCR: {}", e)))?;
    }
    child
        .wait_with_output()
        .await
        .map_err(|e| PortError::Ocr(format!("OCR process failed: {}", e)))
}

#[async_trait]
impl OcrService for TesseractOcrAdapter {
    async fn image_to_text(&self, image: &[u8]) -> PortResult<String> {
        if image.is_empty() {
            return Err(PortError::Ocr("Empty image".to_string()));
        }

        let child = Command::new(&self.command)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PortError::Ocr(format!("Failed to start '{}': {}", self.command, e))
            })?;

        let output = tokio::time::timeout(self.timeout, run_to_completion(child, image))
            .await
            .map_err(|_| {
                PortError::Ocr(format!(
                    "OCR timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })??;
        if !output.status.success() {
            return Err(PortError::Ocr(format!(
                "OCR exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("OCR produced {} chars.", text.len());
        Ok(text)
    }
}
