use once_cell::sync::Lazy;
use thiserror::Error;

pub mod cascade;
pub mod config;
pub mod extractor;
pub mod methodology;
pub mod patterns;
pub mod relevance;
pub mod text_processing;
pub mod unit_name;
pub mod units;

pub use cascade::{Cascade, Pattern, PlausibleRange, TieBreak, ValueKind};
pub use config::{ExtractorConfig, ExtractorConfigBuilder, ListOverride};
pub use extractor::FieldExtractor;
pub use methodology::MethodologyExtractor;
pub use unit_name::{NameCandidate, UnitNameDetector, canonicalize};
pub use units::{AreaMeasure, AreaUnit, parse_area};
// Re-export domain types from core (canonical definitions live there)
pub use suoa_core::{Document, ExtractedRecord, Field, FieldMatch, MethodologyRecord};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("pattern `{label}` has no `{group}` capture group")]
    MissingGroup { label: String, group: &'static str },
    #[error("unknown tie-break `{0}` (expected last, first or most-frequent)")]
    InvalidTieBreak(String),
}

static DEFAULT_EXTRACTOR: Lazy<FieldExtractor> = Lazy::new(FieldExtractor::new);

/// Unit-size expression in `text` using the built-in cascade.
///
/// The highest-priority pattern wins; among its matches the last one in
/// reading order is kept.
pub fn extract_unit_size(text: &str) -> Option<FieldMatch> {
    DEFAULT_EXTRACTOR.unit_size(text)
}

/// Number of spatial units, e.g. `142` from "a total of 142 tracts".
pub fn extract_unit_count(text: &str) -> Option<FieldMatch> {
    DEFAULT_EXTRACTOR.unit_count(text)
}

/// Number of incidents, e.g. `1761` from "1,761 burglary incidents".
pub fn extract_incident_count(text: &str) -> Option<FieldMatch> {
    DEFAULT_EXTRACTOR.incident_count(text)
}

/// Canonical unit-type name, or an empty string.
pub fn detect_unit_name(text: &str) -> String {
    DEFAULT_EXTRACTOR.unit_name(text)
}

/// Run the default pipeline (relevance windowing, four fields, km²
/// conversion) on one document.
pub fn extract_record(document: &Document) -> ExtractedRecord {
    DEFAULT_EXTRACTOR.extract(document)
}
