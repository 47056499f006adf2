//! services/api/src/web/form.rs
//!
//! Collects a `multipart/form-data` body into text fields and files.

use axum::{extract::Multipart, http::StatusCode};
use std::collections::HashMap;

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct FormFile {
    pub field: String,
    pub filename: String,
    pub content: Vec<u8>,
}

/// Every part of a multipart form, text fields keyed by name.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: Vec<FormFile>,
}

impl FormData {
    /// Reads the whole body. Parts with a filename are kept as files.
    pub async fn read(mut multipart: Multipart) -> Result<Self, (StatusCode, String)> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let data = field.bytes().await.map_err(|e| {
                        (
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file bytes: {}", e),
                        )
                    })?;
                    form.files.push(FormFile {
                        field: name,
                        filename,
                        content: data.to_vec(),
                    });
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        (
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read form field '{}': {}", name, e),
                        )
                    })?;
                    form.fields.entry(name).or_default().push(text);
                }
            }
        }
        Ok(form)
    }

    /// The first value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// The first value of a text field, or a 400 naming the missing field.
    pub fn required(&self, name: &str) -> Result<&str, (StatusCode, String)> {
        self.text(name)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Missing {}", name)))
    }

    /// Every value of a repeated text field.
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Removes and returns every file sent under `field`.
    pub fn take_files(&mut self, field: &str) -> Vec<FormFile> {
        let (matching, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        matching
    }
}
