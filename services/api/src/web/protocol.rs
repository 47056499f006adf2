//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API
//! server, and their conversions from the core's domain types.

use insighthub_core::domain::{
    AnswerResult, DocumentBullets, DocumentSummary, MatchedPage, ModeDocumentResult,
    ModeExplanation, Page, QuestionHit, ScreenshotAnswer, SessionStatus, VisionAnalysis,
    VisionModeDocumentResult,
};
use serde::Serialize;
use utoipa::ToSchema;

//=========================================================================================
// Documents and Sessions
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub filename: String,
    /// One of `pdf`, `pptx`, `docx`, `image`.
    pub doc_type: String,
    pub page_count: usize,
}

impl From<DocumentSummary> for DocumentInfo {
    fn from(d: DocumentSummary) -> Self {
        Self {
            doc_id: d.doc_id,
            filename: d.filename,
            doc_type: d.doc_type.as_str().to_string(),
            page_count: d.page_count,
        }
    }
}

/// Returned by document upload and listing.
#[derive(Serialize, ToSchema, Debug)]
pub struct DocumentsResponse {
    pub session_id: String,
    pub documents: Vec<DocumentInfo>,
}

impl DocumentsResponse {
    pub fn new(session_id: &str, documents: Vec<DocumentSummary>) -> Self {
        Self {
            session_id: session_id.to_string(),
            documents: documents.into_iter().map(DocumentInfo::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DeleteSessionResponse {
    pub session_id: String,
    pub deleted: bool,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SessionStatusResponse {
    pub session_exists: bool,
    pub session_id: String,
    pub document_count: usize,
    pub documents: Vec<DocumentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SessionStatus> for SessionStatusResponse {
    fn from(s: SessionStatus) -> Self {
        let message = (!s.session_exists).then(|| "No session found with this ID".to_string());
        Self {
            session_exists: s.session_exists,
            session_id: s.session_id,
            document_count: s.document_count,
            documents: s.documents.into_iter().map(DocumentInfo::from).collect(),
            message,
        }
    }
}

//=========================================================================================
// Vision Tutor
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct MatchedPageInfo {
    pub doc_id: String,
    pub filename: String,
    pub page_index: usize,
    pub score: f64,
}

impl From<MatchedPage> for MatchedPageInfo {
    fn from(m: MatchedPage) -> Self {
        Self {
            doc_id: m.doc_id,
            filename: m.filename,
            page_index: m.page_index,
            score: m.score,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct VisionAskResponse {
    pub session_id: String,
    pub query: String,
    pub selected_doc_ids: Vec<String>,
    pub answer: String,
    pub matched_pages: Vec<MatchedPageInfo>,
    /// `vision`, or `fallback` when the model was unavailable.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ScreenshotAnswer> for VisionAskResponse {
    fn from(a: ScreenshotAnswer) -> Self {
        Self {
            session_id: a.session_id,
            query: a.query,
            selected_doc_ids: a.selected_doc_ids,
            answer: a.answer,
            matched_pages: a.matched_pages.into_iter().map(MatchedPageInfo::from).collect(),
            source: a.source.as_str().to_string(),
            error: a.error,
        }
    }
}

//=========================================================================================
// Modes
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct HitInfo {
    pub doc_id: String,
    pub filename: String,
    pub doc_type: String,
    pub page_index: usize,
    pub score: usize,
    pub snippet: String,
}

impl From<QuestionHit> for HitInfo {
    fn from(h: QuestionHit) -> Self {
        Self {
            doc_id: h.doc_id,
            filename: h.filename,
            doc_type: h.doc_type.as_str().to_string(),
            page_index: h.page_index,
            score: h.score,
            snippet: h.snippet,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AskResponse {
    pub session_id: String,
    pub mode: Option<String>,
    pub answer: String,
    pub hits: Vec<HitInfo>,
    /// `documents`, `llm-fallback`, `snippets-fallback` or `unavailable`.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AnswerResult> for AskResponse {
    fn from(r: AnswerResult) -> Self {
        Self {
            session_id: r.session_id,
            mode: r.mode,
            answer: r.answer,
            hits: r.hits.into_iter().map(HitInfo::from).collect(),
            source: r.source.as_str().to_string(),
            error: r.error,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DocumentBulletsInfo {
    pub doc_id: String,
    pub filename: String,
    pub bullets: Vec<String>,
    pub page_count: usize,
}

impl From<DocumentBullets> for DocumentBulletsInfo {
    fn from(b: DocumentBullets) -> Self {
        Self {
            doc_id: b.doc_id,
            filename: b.filename,
            bullets: b.bullets,
            page_count: b.page_count,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ChatModeResponse {
    pub session_id: String,
    pub summaries: Vec<DocumentBulletsInfo>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct PageInfo {
    pub page_index: usize,
    pub text: String,
}

impl From<Page> for PageInfo {
    fn from(p: Page) -> Self {
        Self {
            page_index: p.index,
            text: p.text,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ModeExplanationInfo {
    pub title: String,
    pub summary: String,
    pub mode: String,
    /// `mode-llm` or `fallback`.
    pub source: String,
    pub model_id: String,
}

impl From<ModeExplanation> for ModeExplanationInfo {
    fn from(m: ModeExplanation) -> Self {
        Self {
            title: m.title,
            summary: m.summary,
            mode: m.mode.as_str().to_string(),
            source: m.source.as_str().to_string(),
            model_id: m.model_id,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ModeResultInfo {
    pub filename: String,
    pub doc_type: String,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
    pub mode_explanation: ModeExplanationInfo,
}

impl From<ModeDocumentResult> for ModeResultInfo {
    fn from(r: ModeDocumentResult) -> Self {
        Self {
            filename: r.filename,
            doc_type: r.doc_type.as_str().to_string(),
            page_count: r.page_count,
            pages: r.pages.into_iter().map(PageInfo::from).collect(),
            mode_explanation: r.mode_explanation.into(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ProcessModeResponse {
    pub mode: String,
    pub session_id: String,
    pub results: Vec<ModeResultInfo>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct VisionAnalysisInfo {
    pub page_index: usize,
    pub analysis: String,
}

impl From<VisionAnalysis> for VisionAnalysisInfo {
    fn from(v: VisionAnalysis) -> Self {
        Self {
            page_index: v.page_index,
            analysis: v.analysis,
        }
    }
}

/// A mode result for an uploaded file, with readings of its embedded images.
#[derive(Serialize, ToSchema, Debug)]
pub struct VisionModeResultInfo {
    pub filename: String,
    pub doc_type: String,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
    pub mode_explanation: ModeExplanationInfo,
    pub vision_analyses: Vec<VisionAnalysisInfo>,
    pub has_images: bool,
}

impl From<VisionModeDocumentResult> for VisionModeResultInfo {
    fn from(r: VisionModeDocumentResult) -> Self {
        let doc = ModeResultInfo::from(r.document);
        Self {
            filename: doc.filename,
            doc_type: doc.doc_type,
            page_count: doc.page_count,
            pages: doc.pages,
            mode_explanation: doc.mode_explanation,
            vision_analyses: r.vision_analyses.into_iter().map(VisionAnalysisInfo::from).collect(),
            has_images: r.has_images,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ProcessModeWithVisionResponse {
    pub mode: String,
    pub session_id: String,
    pub results: Vec<VisionModeResultInfo>,
}
