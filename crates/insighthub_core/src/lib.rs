pub mod assistant;
pub mod context;
pub mod domain;
pub mod matcher;
pub mod modes;
pub mod ports;
pub mod session_store;
pub mod summarizer;

pub use assistant::{Assistant, UploadedFile};
pub use domain::{
    AnswerResult, AnswerSource, DocType, Document, DocumentBullets, DocumentSummary,
    EmbeddedImage, ExplanationSource, MatchedPage, Mode, ModeDocumentResult, ModeExplanation,
    Page, QuestionHit, ScreenshotAnswer, Session, SessionStatus, VisionAnalysis,
    VisionModeDocumentResult,
};
pub use ports::{
    DocumentExtractor, OcrService, PortError, PortResult, TextModelService, VisionModelService,
};
pub use session_store::{Clock, SessionStore, SystemClock};
