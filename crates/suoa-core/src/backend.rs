use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for text extraction backends.
///
/// Implementors turn a file into plain text; everything downstream
/// (relevance windowing, pattern cascades, unit-name detection) lives in
/// `suoa_extract::FieldExtractor` and never touches the file again.
pub trait TextBackend: Send + Sync {
    /// Extract the full text content of a document.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

/// Backend for documents that are already plain text (`.txt` dumps).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextBackend;

impl TextBackend for PlainTextBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn name(&self) -> &'static str {
        "plain-text"
    }
}
