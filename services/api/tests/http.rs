//! End-to-end tests of the HTTP surface, driving the router in-process.

use api_lib::{
    adapters::{
        FileExtractor, OllamaClient, OllamaTextAdapter, OllamaVisionAdapter,
        TesseractOcrAdapter,
    },
    config::Config,
    web::{router, state::AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use insighthub_core::{Assistant, SessionStore};
use serde_json::Value;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "insighthub-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn docx_with(paragraphs: &[&str]) -> Vec<u8> {
    let runs: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{runs}</w:body></w:document>"#
    );
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

fn app(model_url: Option<String>) -> Router {
    let config = Arc::new(Config::default());
    let ollama =
        OllamaClient::new(model_url, "tutor-model".to_string(), Duration::from_secs(5)).unwrap();
    let assistant = Assistant::new(
        Arc::new(SessionStore::new(config.session_ttl_secs)),
        Arc::new(FileExtractor::new(config.docx_chunk_chars)),
        Arc::new(TesseractOcrAdapter::new(
            "insighthub-test-missing-tesseract".to_string(),
            config.ocr_timeout,
        )),
        Arc::new(OllamaTextAdapter::new(ollama.clone())),
        Arc::new(OllamaVisionAdapter::new(ollama)),
    );
    router(Arc::new(AppState {
        assistant: Arc::new(assistant),
        config,
    }))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(method: Method, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn upload(app: &Router, session_id: &str, filename: &str, content: &[u8]) -> (StatusCode, Vec<u8>) {
    send(
        app,
        form(
            Method::POST,
            &format!("/vision/session/{session_id}/documents"),
            &[Part::File("files", filename, content)],
        ),
    )
    .await
}

#[tokio::test]
async fn root_and_health_respond() {
    let app = app(None);
    let (status, body) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send_json(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "InsightHub-AI backend is running");

    let (status, body) = send_json(&app, get("/vision/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn upload_list_and_delete_a_session() {
    let app = app(None);
    let (status, body) = upload(&app, "s1", "diagram.png", &[0x89, b'P', b'N', b'G']).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["session_id"], "s1");
    assert_eq!(body["documents"][0]["doc_id"], "s1:diagram.png");
    assert_eq!(body["documents"][0]["doc_type"], "image");
    assert_eq!(body["documents"][0]["page_count"], 1);

    let (status, body) = send_json(&app, get("/vision/session/s1/documents")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"].as_array().unwrap().len(), 1);

    let (status, body) = send_json(&app, get("/modes/session/s1/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_exists"], true);
    assert_eq!(body["document_count"], 1);

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri("/vision/session/s1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (_, body) = send_json(&app, get("/modes/session/s1/status")).await;
    assert_eq!(body["session_exists"], false);
    assert_eq!(body["message"], "No session found with this ID");
}

#[tokio::test]
async fn unsupported_and_missing_uploads_are_bad_requests() {
    let app = app(None);
    let (status, body) = upload(&app, "s1", "notes.txt", b"plain text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Unsupported file type: .txt");

    let (status, _) = send(
        &app,
        form(Method::POST, "/vision/session/s1/documents", &[Part::Text("note", "x")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn asking_without_documents_is_a_bad_request() {
    let app = app(None);
    let (status, _) = send(
        &app,
        form(
            Method::POST,
            "/modes/ask",
            &[Part::Text("session_id", "empty"), Part::Text("question", "what?")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        form(Method::POST, "/modes/ask", &[Part::Text("session_id", "empty")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Missing question");
}

#[tokio::test]
async fn question_falls_back_to_snippets_without_a_model() {
    let app = app(None);
    let docx = docx_with(&["Mitochondria produce energy for the cell."]);
    let (status, _) = upload(&app, "bio", "cells.docx", &docx).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &app,
        form(
            Method::POST,
            "/modes/ask",
            &[
                Part::Text("session_id", "bio"),
                Part::Text("question", "what do mitochondria produce"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "snippets-fallback");
    assert_eq!(body["hits"][0]["doc_id"], "bio:cells.docx");
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .starts_with("LLM unavailable; showing top snippets instead.\n[cells.docx p1]\n• Mitochondria produce energy for the cell"));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn question_is_answered_by_the_model_when_reachable() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"response": "They produce ATP."}"#)
        .create_async()
        .await;
    let app = app(Some(format!("{}/api/generate", server.url())));
    let docx = docx_with(&["Mitochondria produce energy for the cell."]);
    upload(&app, "bio", "cells.docx", &docx).await;

    let (status, body) = send_json(
        &app,
        form(
            Method::POST,
            "/modes/ask",
            &[
                Part::Text("session_id", "bio"),
                Part::Text("question", "what do mitochondria produce"),
                Part::Text("mode", "student"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "They produce ATP.");
    assert_eq!(body["source"], "documents");
    assert_eq!(body["mode"], "student");
    assert!(body.get("error").is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn chat_mode_summarizes_each_document() {
    let app = app(None);
    upload(&app, "s2", "blank.png", &[1, 2, 3]).await;
    let docx = docx_with(&["Cells divide. Energy flows! Why does it matter?"]);
    upload(&app, "s2", "cells.docx", &docx).await;

    let (status, body) = send_json(
        &app,
        form(
            Method::POST,
            "/modes/chat-mode",
            &[Part::Text("session_id", "s2"), Part::Text("max_items", "2")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summaries = body["summaries"].as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    let image = summaries
        .iter()
        .find(|s| s["doc_id"] == "s2:blank.png")
        .unwrap();
    assert_eq!(image["bullets"][0], "• no content available");
    let docx = summaries
        .iter()
        .find(|s| s["doc_id"] == "s2:cells.docx")
        .unwrap();
    assert_eq!(docx["bullets"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        form(
            Method::POST,
            "/modes/chat-mode",
            &[Part::Text("session_id", "s2"), Part::Text("max_items", "lots")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn process_mode_rejects_unknown_modes_and_falls_back_without_a_model() {
    let app = app(None);
    let docx = docx_with(&["Photosynthesis turns light into sugar."]);
    upload(&app, "s3", "plants.docx", &docx).await;

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/modes/process-mode",
            &[Part::Text("mode", "wizard"), Part::Text("session_id", "s3")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Unsupported mode");

    let (status, body) = send_json(
        &app,
        form(
            Method::POST,
            "/modes/process-mode",
            &[Part::Text("mode", " Exam "), Part::Text("session_id", "s3")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "exam");
    let result = &body["results"][0];
    assert_eq!(result["filename"], "plants.docx");
    assert_eq!(result["pages"][0]["text"], "Photosynthesis turns light into sugar.");
    assert_eq!(result["mode_explanation"]["source"], "fallback");
    assert_eq!(result["mode_explanation"]["model_id"], "tutor-model");
}

#[tokio::test]
async fn vision_mode_explains_uploaded_files_without_storing_them() {
    let app = app(None);
    let docx = docx_with(&["Rivers erode valleys over time."]);

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/modes/process-mode-with-vision",
            &[
                Part::Text("mode", "wizard"),
                Part::Text("session_id", "geo"),
                Part::File("files", "rivers.docx", &docx),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Unsupported mode");

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/modes/process-mode-with-vision",
            &[Part::Text("mode", "exam"), Part::Text("session_id", "geo")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "No files provided");

    let (status, body) = send_json(
        &app,
        form(
            Method::POST,
            "/modes/process-mode-with-vision",
            &[
                Part::Text("mode", "exam"),
                Part::Text("session_id", "geo"),
                Part::File("files", "rivers.docx", &docx),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "exam");
    assert_eq!(body["session_id"], "geo");
    let result = &body["results"][0];
    assert_eq!(result["filename"], "rivers.docx");
    assert_eq!(result["pages"][0]["text"], "Rivers erode valleys over time.");
    assert_eq!(result["mode_explanation"]["source"], "fallback");
    assert_eq!(result["has_images"], false);
    assert_eq!(result["vision_analyses"], serde_json::json!([]));

    let (_, body) = send_json(&app, get("/modes/session/geo/status")).await;
    assert_eq!(body["session_exists"], false);
}

#[tokio::test]
async fn screenshot_question_degrades_when_ocr_and_model_are_down() {
    let app = app(None);
    let docx = docx_with(&["Mitochondria produce energy for the cell."]);
    upload(&app, "s4", "cells.docx", &docx).await;

    let (status, body) = send_json(
        &app,
        form(
            Method::POST,
            "/vision/session/s4/ask",
            &[
                Part::Text("query", "explain this"),
                Part::Text("selected_doc_ids", "s4:cells.docx"),
                Part::File("image", "shot.png", &[1, 2, 3]),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["matched_pages"].as_array().unwrap().len(), 0);
    assert_eq!(body["selected_doc_ids"][0], "s4:cells.docx");

    let (status, body) = send(
        &app,
        form(
            Method::POST,
            "/vision/session/s4/ask",
            &[
                Part::Text("query", "explain this"),
                Part::Text("selected_doc_ids", "s4:missing.pdf"),
                Part::File("image", "shot.png", &[1, 2, 3]),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.is_empty());
}
