use std::path::Path;

use mupdf::{Document, TextPageFlags};

use suoa_core::{BackendError, TextBackend};

/// MuPDF-based implementation of [`TextBackend`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so that the extractor
/// and the plain-text path do not transitively depend on it.
///
/// Each text block is emitted as its own paragraph (blocks are separated by a
/// blank line), which is what relevance windowing splits on. Running headers
/// and footers ("Journal of Quantitative Criminology (2019) 35:1–28") are
/// dropped by excluding blocks in the top 4% and bottom 5% of each page.
#[derive(Debug, Clone, Copy)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    /// `None` disables footer exclusion.
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    /// `None` disables header exclusion.
    header_exclusion_ratio: Option<f32>,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            footer_exclusion_ratio: Some(0.05),
            header_exclusion_ratio: Some(0.04),
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }
}

fn extraction_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}

impl TextBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document.pages().map_err(extraction_error)? {
            let page = page_result.map_err(extraction_error)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(extraction_error)?;

            let page_bounds = page.bounds().map_err(extraction_error)?;
            let page_height = page_bounds.y1 - page_bounds.y0;

            let header_threshold = self
                .header_exclusion_ratio
                .map(|r| page_bounds.y0 + page_height * r);
            let footer_threshold = self
                .footer_exclusion_ratio
                .map(|r| page_bounds.y1 - page_height * r);

            let mut blocks = Vec::new();
            for block in text_page.blocks() {
                let block_bounds = block.bounds();

                if header_threshold.is_some_and(|t| block_bounds.y1 <= t)
                    || footer_threshold.is_some_and(|t| block_bounds.y0 >= t)
                {
                    continue;
                }

                let mut block_text = String::new();
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    block_text.push_str(&line_text);
                    block_text.push('\n');
                }
                if !block_text.trim().is_empty() {
                    blocks.push(block_text);
                }
            }
            pages_text.push(blocks.join("\n"));
        }

        tracing::debug!(path = %path.display(), pages = pages_text.len(), "extracted PDF text");
        Ok(pages_text.join("\n"))
    }

    fn name(&self) -> &'static str {
        "mupdf"
    }
}
