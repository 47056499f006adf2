pub mod extractor;
pub mod ocr;
pub mod ollama;
pub mod text_llm;
pub mod vision_llm;

pub use extractor::FileExtractor;
pub use ocr::TesseractOcrAdapter;
pub use ollama::OllamaClient;
pub use text_llm::OllamaTextAdapter;
pub use vision_llm::OllamaVisionAdapter;
