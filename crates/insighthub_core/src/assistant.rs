//! crates/insighthub_core/src/assistant.rs
//!
//! The application service behind every boundary operation. It owns the
//! session store and talks to the outside world only through the ports.
//!
//! Model and OCR failures never escape from here: each one is logged and
//! turned into a degraded answer tagged with its `AnswerSource`.

use crate::context::{
    select_question_context, select_screenshot_context, ScreenshotContext,
    SCREENSHOT_SNIPPET_CHARS, SCREENSHOT_TOP_K,
};
use crate::domain::{
    AnswerResult, AnswerSource, DocType, Document, DocumentBullets, DocumentSummary, Mode,
    ModeDocumentResult, ScreenshotAnswer, SessionStatus, VisionAnalysis,
    VisionModeDocumentResult,
};
use crate::modes::explain_document;
use crate::ports::{
    DocumentExtractor, OcrService, PortError, PortResult, TextModelService, VisionModelService,
};
use crate::session_store::SessionStore;
use crate::summarizer::{cited_bullets, to_bullets};
use std::sync::Arc;
use tracing::{info, warn};

/// Bullets returned when no page matched and the general model answered.
pub const LLM_FALLBACK_BULLETS: usize = 4;
/// Default bullets per document in the chat summary.
pub const DEFAULT_SUMMARY_ITEMS: usize = 6;
/// Bullets per cited page in a degraded answer.
pub const CITED_SNIPPET_BULLETS: usize = 3;

const GROUNDED_HINT: &str = "You are a helpful tutor. Stay grounded to the provided document snippets. \
    Answer concisely in 3-6 bullets or short paragraphs.";
const GENERAL_HINT: &str = "You are a helpful tutor. Respond in short, clear bullet points only.";
/// Leading pages handed to the vision model as context for embedded images.
pub const IMAGE_CONTEXT_PAGES: usize = 3;

const NO_MATCH_ANSWER: &str = "No document match and LLM unavailable.";

/// A file received from a client, before extraction.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

pub struct Assistant {
    store: Arc<SessionStore>,
    extractor: Arc<dyn DocumentExtractor>,
    ocr: Arc<dyn OcrService>,
    text_model: Arc<dyn TextModelService>,
    vision_model: Arc<dyn VisionModelService>,
}

fn require(value: &str, what: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        Err(PortError::InvalidArgument(format!("Missing {what}")))
    } else {
        Ok(())
    }
}

impl Assistant {
    pub fn new(
        store: Arc<SessionStore>,
        extractor: Arc<dyn DocumentExtractor>,
        ocr: Arc<dyn OcrService>,
        text_model: Arc<dyn TextModelService>,
        vision_model: Arc<dyn VisionModelService>,
    ) -> Self {
        Self {
            store,
            extractor,
            ocr,
            text_model,
            vision_model,
        }
    }

    /// Extracts every file and stores it under `"<session_id>:<filename>"`.
    pub async fn upload_documents(
        &self,
        session_id: &str,
        files: Vec<UploadedFile>,
    ) -> PortResult<Vec<DocumentSummary>> {
        require(session_id, "session_id")?;
        if files.is_empty() {
            return Err(PortError::InvalidArgument("No files uploaded".to_string()));
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            if file.content.is_empty() {
                return Err(PortError::InvalidArgument(format!(
                    "Empty file: {}",
                    file.filename
                )));
            }
            let (doc_type, pages) = self.extractor.extract(&file.filename, &file.content).await?;
            let doc_id = format!("{}:{}", session_id, file.filename);
            let doc = self
                .store
                .upsert_document(session_id, &doc_id, &file.filename, doc_type, pages)?;
            info!(
                "Stored '{}' ({}, {} pages) in session {}.",
                doc.filename,
                doc.doc_type,
                doc.pages.len(),
                session_id
            );
            uploaded.push(doc.summary());
        }
        Ok(uploaded)
    }

    pub fn list_documents(&self, session_id: &str) -> PortResult<Vec<DocumentSummary>> {
        require(session_id, "session_id")?;
        Ok(self
            .store
            .list_documents(session_id)
            .iter()
            .map(|d| d.summary())
            .collect())
    }

    pub fn get_documents(
        &self,
        session_id: &str,
        doc_ids: &[String],
    ) -> PortResult<Vec<Arc<Document>>> {
        require(session_id, "session_id")?;
        Ok(self.store.get_documents(session_id, doc_ids))
    }

    pub fn delete_session(&self, session_id: &str) -> PortResult<bool> {
        require(session_id, "session_id")?;
        let deleted = self.store.delete(session_id);
        if deleted {
            info!("Deleted session {}.", session_id);
        }
        Ok(deleted)
    }

    pub fn session_status(&self, session_id: &str) -> SessionStatus {
        self.store.status(session_id)
    }

    /// The documents to search: the one named by `doc_id` if it exists, else all.
    fn session_documents(
        &self,
        session_id: &str,
        doc_id: Option<&str>,
    ) -> PortResult<Vec<Arc<Document>>> {
        let session = self
            .store
            .get(session_id)
            .filter(|s| !s.documents.is_empty())
            .ok_or_else(|| {
                PortError::NotFound(
                    "No documents found in session. Please upload documents first.".to_string(),
                )
            })?;

        if let Some(doc) = doc_id.and_then(|id| session.documents.get(id)) {
            return Ok(vec![Arc::clone(doc)]);
        }
        let mut docs: Vec<Arc<Document>> = session.documents.into_values().collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.doc_id.cmp(&b.doc_id)));
        Ok(docs)
    }

    /// Answers a typed question from the best-matching pages.
    pub async fn ask_question(
        &self,
        session_id: &str,
        question: &str,
        doc_id: Option<&str>,
        mode: Option<&str>,
    ) -> PortResult<AnswerResult> {
        require(session_id, "session_id")?;
        require(question, "question")?;
        let documents = self.session_documents(session_id, doc_id)?;
        let question = question.trim();

        let ctx = select_question_context(question, &documents);
        let mut result = AnswerResult {
            session_id: session_id.to_string(),
            mode: mode.map(str::to_string),
            answer: String::new(),
            hits: Vec::new(),
            source: AnswerSource::Documents,
            error: None,
        };

        if ctx.is_empty() {
            match self.text_model.ask(question, Some(GENERAL_HINT)).await {
                Ok(answer) => {
                    result.answer = to_bullets(&answer, LLM_FALLBACK_BULLETS).join("\n");
                    result.source = AnswerSource::LlmFallback;
                }
                Err(e) => {
                    warn!("No document match and text model failed: {}", e);
                    result.answer = NO_MATCH_ANSWER.to_string();
                    result.source = AnswerSource::Unavailable;
                    result.error = Some(e.to_string());
                }
            }
            return Ok(result);
        }

        let prompt = format!(
            "Question: {question}\n\n\
             Use only the provided document snippets to answer clearly.\n\
             Context:\n{}",
            ctx.context_blob
        );
        match self.text_model.ask(&prompt, Some(GROUNDED_HINT)).await {
            Ok(answer) => result.answer = answer,
            Err(e) => {
                warn!("Text model failed; answering from snippets: {}", e);
                let groups = ctx
                    .hits
                    .iter()
                    .map(|h| cited_bullets(&h.citation(), &h.snippet, CITED_SNIPPET_BULLETS))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                result.answer =
                    format!("LLM unavailable; showing top snippets instead.\n{groups}");
                result.source = AnswerSource::SnippetsFallback;
                result.error = Some(e.to_string());
            }
        }
        result.hits = ctx.hits;
        Ok(result)
    }

    /// Answers a question about a screenshot, grounded by OCR-matched pages.
    pub async fn ask_screenshot(
        &self,
        session_id: &str,
        query: &str,
        selected_doc_ids: &[String],
        image: &[u8],
    ) -> PortResult<ScreenshotAnswer> {
        require(session_id, "session_id")?;
        require(query, "query")?;
        let selected: Vec<String> = selected_doc_ids
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();
        if selected.is_empty() {
            return Err(PortError::InvalidArgument(
                "Select at least one document".to_string(),
            ));
        }
        let documents = self.store.get_documents(session_id, &selected);
        if documents.is_empty() {
            return Err(PortError::NotFound(
                "Selected documents not found in this session. Upload documents first."
                    .to_string(),
            ));
        }
        if image.is_empty() {
            return Err(PortError::InvalidArgument(
                "Empty screenshot image".to_string(),
            ));
        }

        let ctx = match self.ocr.image_to_text(image).await {
            Ok(text) => select_screenshot_context(
                &text,
                &documents,
                SCREENSHOT_TOP_K,
                SCREENSHOT_SNIPPET_CHARS,
            ),
            Err(e) => {
                warn!("OCR unavailable, answering without document context: {}", e);
                ScreenshotContext::default()
            }
        };

        let (answer, source, error) = match self
            .vision_model
            .ask(query, image, ctx.context())
            .await
        {
            Ok(answer) => (answer, AnswerSource::Vision, None),
            Err(e) => {
                warn!("Vision model failed: {}", e);
                let answer = if ctx.matched_pages.is_empty() {
                    "Vision model unavailable and no matching document text was found."
                        .to_string()
                } else {
                    let groups = ctx
                        .matched_pages
                        .iter()
                        .map(|m| cited_bullets(&m.citation(), &m.snippet, CITED_SNIPPET_BULLETS))
                        .collect::<Vec<_>>()
                        .join("\n\n");
                    format!("Vision model unavailable; closest document passages:\n{groups}")
                };
                (answer, AnswerSource::Fallback, Some(e.to_string()))
            }
        };

        Ok(ScreenshotAnswer {
            session_id: session_id.to_string(),
            query: query.to_string(),
            selected_doc_ids: selected,
            answer,
            matched_pages: ctx.matched_pages,
            source,
            error,
        })
    }

    /// Bullet summary per document, built without any model call.
    pub fn chat_summary(
        &self,
        session_id: &str,
        doc_id: Option<&str>,
        max_items: usize,
    ) -> PortResult<Vec<DocumentBullets>> {
        require(session_id, "session_id")?;
        let documents = self.session_documents(session_id, doc_id)?;
        Ok(documents
            .iter()
            .map(|doc| DocumentBullets {
                doc_id: doc.doc_id.clone(),
                filename: doc.filename.clone(),
                bullets: to_bullets(&doc.full_text(), max_items),
                page_count: doc.pages.len(),
            })
            .collect())
    }

    /// Explains every document of the session in the requested learning mode.
    pub async fn process_mode(
        &self,
        session_id: &str,
        mode: &str,
    ) -> PortResult<(Mode, Vec<ModeDocumentResult>)> {
        let mode = Mode::parse(mode)
            .ok_or_else(|| PortError::InvalidArgument("Unsupported mode".to_string()))?;
        require(session_id, "session_id")?;
        let documents = self.session_documents(session_id, None)?;

        let mut results = Vec::with_capacity(documents.len());
        for doc in documents {
            let mode_explanation =
                explain_document(self.text_model.as_ref(), mode, &doc.filename, &doc.full_text())
                    .await;
            results.push(ModeDocumentResult {
                filename: doc.filename.clone(),
                doc_type: doc.doc_type,
                page_count: doc.pages.len(),
                pages: doc.pages.clone(),
                mode_explanation,
            });
        }
        Ok((mode, results))
    }

    /// Explains uploaded files in a learning mode and has the vision model
    /// read every sizeable image embedded in PDFs. Nothing is stored in the
    /// session. An image the model cannot read gets an "unavailable" entry.
    pub async fn process_mode_with_vision(
        &self,
        session_id: &str,
        mode: &str,
        files: Vec<UploadedFile>,
    ) -> PortResult<(Mode, Vec<VisionModeDocumentResult>)> {
        let mode = Mode::parse(mode)
            .ok_or_else(|| PortError::InvalidArgument("Unsupported mode".to_string()))?;
        require(session_id, "session_id")?;
        if files.is_empty() {
            return Err(PortError::InvalidArgument("No files provided".to_string()));
        }

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if file.content.is_empty() {
                return Err(PortError::InvalidArgument(format!(
                    "File {} is empty",
                    file.filename
                )));
            }
            let (doc_type, pages) = self.extractor.extract(&file.filename, &file.content).await?;

            let images = if doc_type == DocType::Pdf {
                self.extractor
                    .extract_images(&file.filename, &file.content)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Could not read images from '{}': {}", file.filename, e);
                        Vec::new()
                    })
            } else {
                Vec::new()
            };

            let lead_text = pages
                .iter()
                .take(IMAGE_CONTEXT_PAGES)
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let context = (!lead_text.trim().is_empty()).then_some(lead_text.as_str());
            let query = format!(
                "Analyze this diagram or image from the document. Explain what it shows \
                 and how it relates to the learning content in {mode} mode."
            );

            let mut vision_analyses = Vec::with_capacity(images.len());
            for image in &images {
                let analysis = match self.vision_model.ask(&query, &image.bytes, context).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(
                            "Vision analysis failed for '{}' page {}: {}",
                            file.filename,
                            image.page_index + 1,
                            e
                        );
                        format!("Vision analysis unavailable: {e}")
                    }
                };
                vision_analyses.push(VisionAnalysis {
                    page_index: image.page_index,
                    analysis,
                });
            }

            let full_text = pages
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let mode_explanation =
                explain_document(self.text_model.as_ref(), mode, &file.filename, &full_text).await;
            info!(
                "Processed '{}' in {} mode with {} image(s).",
                file.filename,
                mode,
                images.len()
            );

            results.push(VisionModeDocumentResult {
                document: ModeDocumentResult {
                    filename: file.filename,
                    doc_type,
                    page_count: pages.len(),
                    pages,
                    mode_explanation,
                },
                has_images: !images.is_empty(),
                vision_analyses,
            });
        }
        Ok((mode, results))
    }
}
