//! crates/insighthub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The kind of file a document was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Pdf,
    Pptx,
    Docx,
    Image,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Pdf => "pdf",
            DocType::Pptx => "pptx",
            DocType::Docx => "docx",
            DocType::Image => "image",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted text for one logical page: a PDF page, a PPTX slide,
/// or a DOCX "virtual page".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub text: String,
}

impl Page {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A document uploaded into a session.
#[derive(Debug, Clone)]
pub struct Document {
    pub doc_id: String,
    pub filename: String,
    pub doc_type: DocType,
    pub pages: Vec<Page>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// The lightweight view of this document shown to clients.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            doc_id: self.doc_id.clone(),
            filename: self.filename.clone(),
            doc_type: self.doc_type,
            page_count: self.pages.len(),
        }
    }

    /// All page texts joined with blank lines.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A caller-scoped, TTL-bound container of uploaded documents.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub documents: HashMap<String, Arc<Document>>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            documents: HashMap::new(),
            created_at: now,
            last_accessed: now,
        }
    }
}

/// Document metadata returned to clients (no page text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub filename: String,
    pub doc_type: DocType,
    pub page_count: usize,
}

/// Debug view of a session and its documents.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub session_exists: bool,
    pub session_id: String,
    pub document_count: usize,
    pub documents: Vec<DocumentSummary>,
}

/// A page ranked against a typed question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionHit {
    pub doc_id: String,
    pub filename: String,
    pub doc_type: DocType,
    pub page_index: usize,
    pub score: usize,
    pub snippet: String,
}

impl QuestionHit {
    /// Source tag such as `[notes.pdf p3]`.
    pub fn citation(&self) -> String {
        format!("[{} p{}]", self.filename, self.page_index + 1)
    }
}

/// A page ranked against OCR text from a screenshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPage {
    pub doc_id: String,
    pub filename: String,
    pub page_index: usize,
    pub score: f64,
    pub snippet: String,
}

impl MatchedPage {
    /// Source tag such as `[notes.pdf | page/part 3 | score=0.250]`.
    pub fn citation(&self) -> String {
        format!(
            "[{} | page/part {} | score={:.3}]",
            self.filename,
            self.page_index + 1,
            self.score
        )
    }
}

/// Where the text of an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// The model answered using document context.
    Documents,
    /// No page matched; the general-purpose model answered without context.
    LlmFallback,
    /// The model was unavailable; the answer was built locally from snippets.
    SnippetsFallback,
    /// Neither a document match nor the model was available.
    Unavailable,
    /// The vision model answered the screenshot question.
    Vision,
    /// The vision model was unavailable; the answer was built locally.
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Documents => "documents",
            AnswerSource::LlmFallback => "llm-fallback",
            AnswerSource::SnippetsFallback => "snippets-fallback",
            AnswerSource::Unavailable => "unavailable",
            AnswerSource::Vision => "vision",
            AnswerSource::Fallback => "fallback",
        }
    }
}

/// The outcome of answering a typed question.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub session_id: String,
    pub mode: Option<String>,
    pub answer: String,
    pub hits: Vec<QuestionHit>,
    pub source: AnswerSource,
    pub error: Option<String>,
}

/// The outcome of answering a question about a screenshot.
#[derive(Debug, Clone)]
pub struct ScreenshotAnswer {
    pub session_id: String,
    pub query: String,
    pub selected_doc_ids: Vec<String>,
    pub answer: String,
    pub matched_pages: Vec<MatchedPage>,
    pub source: AnswerSource,
    pub error: Option<String>,
}

/// Bullet summary for one document.
#[derive(Debug, Clone)]
pub struct DocumentBullets {
    pub doc_id: String,
    pub filename: String,
    pub bullets: Vec<String>,
    pub page_count: usize,
}

/// A learning mode used to shape document explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Student,
    Teacher,
    Exam,
    Revision,
    Practical,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Student,
        Mode::Teacher,
        Mode::Exam,
        Mode::Revision,
        Mode::Practical,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Student => "student",
            Mode::Teacher => "teacher",
            Mode::Exam => "exam",
            Mode::Revision => "revision",
            Mode::Practical => "practical",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a mode explanation came from the model or the local summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationSource {
    ModeLlm,
    Fallback,
}

impl ExplanationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationSource::ModeLlm => "mode-llm",
            ExplanationSource::Fallback => "fallback",
        }
    }
}

/// A mode-specific explanation of a whole document.
#[derive(Debug, Clone)]
pub struct ModeExplanation {
    pub title: String,
    pub summary: String,
    pub mode: Mode,
    pub source: ExplanationSource,
    pub model_id: String,
}

/// The per-document result of processing a session in a learning mode.
#[derive(Debug, Clone)]
pub struct ModeDocumentResult {
    pub filename: String,
    pub doc_type: DocType,
    pub page_count: usize,
    pub pages: Vec<Page>,
    pub mode_explanation: ModeExplanation,
}

/// An image embedded in a document, with the page it appears on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub page_index: usize,
    pub bytes: Vec<u8>,
}

/// The vision model's reading of one embedded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionAnalysis {
    pub page_index: usize,
    pub analysis: String,
}

/// A learning-mode result for an uploaded file, plus its image analyses.
#[derive(Debug, Clone)]
pub struct VisionModeDocumentResult {
    pub document: ModeDocumentResult,
    pub vision_analyses: Vec<VisionAnalysis>,
    pub has_images: bool,
}
