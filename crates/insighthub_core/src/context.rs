//! crates/insighthub_core/src/context.rs
//!
//! Turns ranked pages into a bounded, citation-tagged context blob.
//!
//! Both flows share one shape: score every candidate page, sort by score
//! (stable, so ties keep document then page order), drop non-positive
//! scores, keep the top few, tag each snippet with its source and join them.

use crate::domain::{Document, MatchedPage, QuestionHit};
use crate::matcher::{keyword_overlap_ratio, keyword_tokens, overlap_score, tokenize};
use std::sync::Arc;

/// Number of pages kept for a typed question.
pub const QUESTION_TOP_HITS: usize = 3;
/// Per-page snippet length for a typed question.
pub const QUESTION_SNIPPET_CHARS: usize = 800;
/// Hard cap on the whole question context blob.
pub const QUESTION_CONTEXT_CHARS: usize = 2400;
/// Number of pages kept for a screenshot.
pub const SCREENSHOT_TOP_K: usize = 4;
/// Per-page snippet length for a screenshot.
pub const SCREENSHOT_SNIPPET_CHARS: usize = 1400;

const ELLIPSIS: &str = "...";

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Ranked hits for a typed question and the blob handed to the model.
#[derive(Debug, Clone, Default)]
pub struct QuestionContext {
    pub hits: Vec<QuestionHit>,
    pub context_blob: String,
}

impl QuestionContext {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Scores every page of `documents` against `question` by raw token overlap.
pub fn select_question_context(question: &str, documents: &[Arc<Document>]) -> QuestionContext {
    let query_tokens = tokenize(question);

    let mut hits: Vec<QuestionHit> = Vec::new();
    for doc in documents {
        for page in &doc.pages {
            let score = overlap_score(&query_tokens, &tokenize(&page.text));
            if score == 0 {
                continue;
            }
            let head = truncate_chars(&page.text, QUESTION_SNIPPET_CHARS);
            let snippet = if head.len() < page.text.len() {
                format!("{head}{ELLIPSIS}")
            } else {
                head.to_string()
            };
            hits.push(QuestionHit {
                doc_id: doc.doc_id.clone(),
                filename: doc.filename.clone(),
                doc_type: doc.doc_type,
                page_index: page.index,
                score,
                snippet,
            });
        }
    }

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(QUESTION_TOP_HITS);

    let joined = hits
        .iter()
        .map(|h| format!("{} {}", h.citation(), h.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");
    let context_blob = truncate_chars(&joined, QUESTION_CONTEXT_CHARS).to_string();

    QuestionContext { hits, context_blob }
}

/// Pages matched against a screenshot and the reference text built from them.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotContext {
    pub context_text: String,
    pub matched_pages: Vec<MatchedPage>,
}

impl ScreenshotContext {
    /// The reference text, or `None` when nothing matched.
    pub fn context(&self) -> Option<&str> {
        let trimmed = self.context_text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Scores every page of `documents` against OCR text by Jaccard ratio.
pub fn select_screenshot_context(
    ocr_text: &str,
    documents: &[Arc<Document>],
    top_k: usize,
    snippet_chars: usize,
) -> ScreenshotContext {
    let ocr_tokens = keyword_tokens(ocr_text);

    let mut scored: Vec<MatchedPage> = Vec::new();
    for doc in documents {
        for page in &doc.pages {
            let score = keyword_overlap_ratio(&ocr_tokens, &keyword_tokens(&page.text));
            if score <= 0.0 {
                continue;
            }
            scored.push(MatchedPage {
                doc_id: doc.doc_id.clone(),
                filename: doc.filename.clone(),
                page_index: page.index,
                score,
                snippet: truncate_chars(&page.text, snippet_chars).to_string(),
            });
        }
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);

    let context_text = scored
        .iter()
        .map(|m| format!("{}\n{}", m.citation(), m.snippet))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
        .trim()
        .to_string();

    ScreenshotContext {
        context_text,
        matched_pages: scored,
    }
}
