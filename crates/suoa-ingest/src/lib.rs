use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod batch;

// Re-export domain types for convenience
pub use suoa_core::{BackendError, Document, ExtractedRecord, MethodologyRecord, TextBackend};
pub use batch::{BatchOptions, BatchOutput, NO_TEXT, ProgressEvent, run_batch, run_batch_with};

/// File extensions the ingest layer knows how to read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("input directory not found: {0}")]
    MissingDirectory(PathBuf),
    #[error("no .pdf or .txt files in {0}")]
    NoDocuments(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

/// List the supported study files directly inside `dir`, sorted by name.
///
/// Subdirectories are not descended into. An existing directory without any
/// supported file is an error, since a batch over it would produce nothing.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(IngestError::NoDocuments(dir.to_path_buf()));
    }
    paths.sort();
    Ok(paths)
}

/// Backend that picks plain text or MuPDF by file extension.
///
/// - `.txt` → [`suoa_core::PlainTextBackend`]
/// - anything else → MuPDF (requires `pdf` feature)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionBackend;

impl TextBackend for ExtensionBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        match extension(path).as_str() {
            "txt" => suoa_core::PlainTextBackend.extract_text(path),
            _ => extract_pdf(path),
        }
    }

    fn name(&self) -> &'static str {
        "by-extension"
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String, BackendError> {
    suoa_pdf_mupdf::MupdfBackend::default().extract_text(path)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<String, BackendError> {
    Err(BackendError::Unsupported(format!(
        "{} (PDF support not compiled in; enable the `pdf` feature of suoa-ingest)",
        path.display()
    )))
}

/// Extract raw text from a `.pdf` or `.txt` file.
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    Ok(ExtensionBackend.extract_text(path)?)
}

/// Read `path` into a [`Document`] named after its file name.
pub fn load_document(path: &Path) -> Result<Document, IngestError> {
    let text = extract_text(path)?;
    Ok(Document::new(file_name(path), text))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
