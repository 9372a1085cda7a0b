use std::path::PathBuf;
use std::time::Instant;

use suoa_core::{Document, ExtractedRecord, MethodologyRecord, TextBackend, file_id_from_filename};
use suoa_extract::FieldExtractor;

use crate::{ExtensionBackend, file_name};

/// Error recorded when a backend succeeds but yields only whitespace, as
/// with a scanned PDF that has no text layer.
pub const NO_TEXT: &str = "no text extracted";

/// Progress events emitted while a batch runs, one document at a time.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started {
        index: usize,
        total: usize,
        filename: String,
    },
    Extracted {
        index: usize,
        total: usize,
        record: Box<ExtractedRecord>,
    },
    /// Text could not be obtained; the batch continues with the next file.
    Failed {
        index: usize,
        total: usize,
        filename: String,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Also compute a [`MethodologyRecord`] per document.
    pub methodology: bool,
}

/// Records in input order. `methodology` is empty unless requested.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub records: Vec<ExtractedRecord>,
    pub methodology: Vec<MethodologyRecord>,
}

impl BatchOutput {
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Run the extractor over `paths`, reading each file with the backend its
/// extension calls for.
pub fn run_batch(
    paths: &[PathBuf],
    extractor: &FieldExtractor,
    options: BatchOptions,
    progress: impl Fn(ProgressEvent),
) -> BatchOutput {
    run_batch_with(paths, &ExtensionBackend, extractor, options, progress)
}

/// Run the extractor over `paths` with an explicit backend.
///
/// Documents are processed sequentially. A backend failure, or a document
/// with no text at all, turns into a record with empty fields and the error
/// message set; it never aborts the batch.
pub fn run_batch_with(
    paths: &[PathBuf],
    backend: &dyn TextBackend,
    extractor: &FieldExtractor,
    options: BatchOptions,
    progress: impl Fn(ProgressEvent),
) -> BatchOutput {
    let total = paths.len();
    let started = Instant::now();
    tracing::info!(total, backend = backend.name(), "starting batch");

    let mut output = BatchOutput::default();
    for (index, path) in paths.iter().enumerate() {
        let filename = file_name(path);
        progress(ProgressEvent::Started {
            index,
            total,
            filename: filename.clone(),
        });

        let text = backend
            .extract_text(path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(NO_TEXT.to_string())
                } else {
                    Ok(text)
                }
            });

        match text {
            Ok(text) => {
                let document = Document::new(filename, text);
                let record = extractor.extract(&document);
                if options.methodology {
                    output.methodology.push(extractor.extract_methodology(&document));
                }
                progress(ProgressEvent::Extracted {
                    index,
                    total,
                    record: Box::new(record.clone()),
                });
                output.records.push(record);
            }
            Err(error) => {
                tracing::warn!(file = %path.display(), error = %error, "text extraction failed");
                if options.methodology {
                    output.methodology.push(empty_methodology(&filename));
                }
                progress(ProgressEvent::Failed {
                    index,
                    total,
                    filename: filename.clone(),
                    error: error.clone(),
                });
                output.records.push(ExtractedRecord::failed(&filename, error));
            }
        }
    }

    tracing::info!(
        total,
        failed = output.failed_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch finished"
    );
    output
}

fn empty_methodology(filename: &str) -> MethodologyRecord {
    MethodologyRecord {
        file_id: file_id_from_filename(filename),
        filename: filename.to_string(),
        ..Default::default()
    }
}
