//! crates/insighthub_core/src/modes.rs
//!
//! Mode-specific document explanations. The text model is the primary
//! source; when it fails the explanation is rebuilt locally from the
//! document text with the bullet summarizer.

use crate::context::truncate_chars;
use crate::domain::{ExplanationSource, Mode, ModeExplanation};
use crate::ports::{PortError, PortResult, TextModelService};
use crate::summarizer::to_bullets;
use tracing::warn;

/// Maximum characters of document text sent to the model.
pub const MODE_CONTENT_CHARS: usize = 16_000;
/// Answer length cap for mode explanations; longer than a plain answer.
pub const MODE_MAX_TOKENS: u32 = 500;
/// Bullets in a locally generated fallback explanation.
pub const FALLBACK_BULLETS: usize = 6;

const TRUNCATION_MARKER: &str = "\n\n[truncated for length]";

impl Mode {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Mode::Student => "You are 'Study Buddy' for Student mode. Document data will be provided in full. \
                Explain the material in simple language, pull key takeaways, propose quick analogies, \
                and generate 3 self-check questions. Stay grounded in the document text, avoid guessing, \
                and invite the learner to ask follow-up questions about the document.",
            Mode::Teacher => "You are 'Lesson Planner' for Teacher mode. Document data will be provided in full. \
                Produce a concise teaching outline: learning objectives, 3-4 explanation chunks, \
                class activities, and a quick assessment idea. Keep it practical and tied to the document.",
            Mode::Exam => "You are 'Exam Coach' for Exam mode. Document data will be provided in full. \
                Create an exam-focused guide: highlight must-know concepts, propose practice questions \
                labelled as 2, 5, and 10 marks, list likely definitions, and add brief answering tips. \
                Use only the document content; when something is missing, state that.",
            Mode::Revision => "You are 'Revision Buddy' for Revision mode. Document data will be provided in full. \
                Compress the material into bullet-style flash notes, include formulas/definitions, and \
                ask 3 rapid-fire recall questions. Keep wording tight and document-grounded.",
            Mode::Practical => "You are 'Practical Mentor' for Practical mode. Document data will be provided in full. \
                Design hands-on tasks, step-by-step exercises, and small projects that directly use the \
                document's information. Include materials/tools needed, expected outcomes, and quick \
                checks for completion. Stay strictly grounded to the document content.",
        }
    }

    pub fn title_prefix(&self) -> &'static str {
        match self {
            Mode::Student => "Student Guide",
            Mode::Teacher => "Teaching Guide",
            Mode::Exam => "Exam Coach",
            Mode::Revision => "Quick Revision",
            Mode::Practical => "Practical Mentor",
        }
    }
}

/// Trims `content` and caps it at `max_chars`, marking the cut.
pub fn trim_content(content: &str, max_chars: usize) -> String {
    let flat = content.trim();
    let head = truncate_chars(flat, max_chars);
    if head.len() == flat.len() {
        flat.to_string()
    } else {
        format!("{head}{TRUNCATION_MARKER}")
    }
}

fn build_prompt(mode: Mode, filename: &str, doc_blob: &str) -> String {
    format!(
        "Mode: {mode}\n\
         Document name: {filename}\n\
         Task: produce the mode-specific guidance using only the document data below.\n\
         Prefer short paragraphs and bullets.\n\n\
         DOCUMENT DATA START\n\
         {doc_blob}\n\
         DOCUMENT DATA END\n"
    )
}

async fn ask_mode_model(
    model: &dyn TextModelService,
    mode: Mode,
    filename: &str,
    document_text: &str,
) -> PortResult<String> {
    let doc_blob = trim_content(document_text, MODE_CONTENT_CHARS);
    if doc_blob.is_empty() {
        return Err(PortError::Model("Document text is empty".to_string()));
    }
    let prompt = build_prompt(mode, filename, &doc_blob);
    model
        .ask_with_budget(&prompt, Some(mode.system_prompt()), MODE_MAX_TOKENS)
        .await
}

/// Explains a document in the given mode, falling back to local bullets.
pub async fn explain_document(
    model: &dyn TextModelService,
    mode: Mode,
    filename: &str,
    document_text: &str,
) -> ModeExplanation {
    let (summary, source) = match ask_mode_model(model, mode, filename, document_text).await {
        Ok(answer) => (answer, ExplanationSource::ModeLlm),
        Err(e) => {
            warn!("Mode model unavailable for '{}': {}", filename, e);
            let bullets = to_bullets(document_text, FALLBACK_BULLETS).join("\n");
            (
                format!("Mode response unavailable ({e}). Fallback summary from document:\n{bullets}"),
                ExplanationSource::Fallback,
            )
        }
    };

    ModeExplanation {
        title: format!("{}: {}", mode.title_prefix(), filename),
        summary,
        mode,
        source,
        model_id: model.model_id().to_string(),
    }
}
