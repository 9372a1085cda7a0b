use std::fmt;
use std::ops::Range;
use std::path::Path;

use serde::Serialize;

pub mod backend;
pub mod config_file;

pub use backend::{BackendError, PlainTextBackend, TextBackend};

/// One study file together with the text a backend produced for it.
#[derive(Debug, Clone)]
pub struct Document {
    /// Study identifier derived from the filename (`S01` for `S01_title.pdf`).
    pub file_id: String,
    pub filename: String,
    pub text: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            file_id: file_id_from_filename(&filename),
            filename,
            text: text.into(),
        }
    }
}

/// Derive the study identifier from a filename.
///
/// The identifier is everything before the first underscore of the file stem.
/// A stem without underscores is used whole.
pub fn file_id_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    match stem.split_once('_') {
        Some((id, _)) if !id.is_empty() => id.to_string(),
        _ => stem,
    }
}

/// The four fields the extractor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    UnitName,
    UnitSize,
    UnitCount,
    IncidentCount,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::UnitName,
        Field::UnitSize,
        Field::UnitCount,
        Field::IncidentCount,
    ];

    /// Column name used in exports.
    pub fn column(&self) -> &'static str {
        match self {
            Field::UnitName => "unit_name",
            Field::UnitSize => "unit_size",
            Field::UnitCount => "unit_count",
            Field::IncidentCount => "incident_count",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::UnitName => "Unit name",
            Field::UnitSize => "Unit size",
            Field::UnitCount => "Unit count",
            Field::IncidentCount => "Incident count",
        };
        f.write_str(label)
    }
}

/// A value pulled out of document text, with the evidence it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMatch {
    /// Normalised value (`"2.5 km²"`, `"1761"`).
    pub value: String,
    /// The full regex match, byte-for-byte as it appears in the searched text.
    pub source: String,
    /// Byte range of `source` within the searched text.
    pub span: Range<usize>,
    /// Priority of the pattern that produced this match (higher wins).
    pub priority: u32,
    /// Stable label of the producing pattern.
    pub pattern: String,
}

/// Extraction output for one document.
///
/// Every field is independently optional; `None` means no pattern matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecord {
    pub file_id: String,
    pub filename: String,
    /// Canonical unit-type name, empty when nothing was detected.
    pub unit_name: String,
    pub unit_size: Option<FieldMatch>,
    /// `unit_size` converted to square kilometres when its unit is recognised.
    pub unit_size_km2: Option<f64>,
    pub unit_count: Option<FieldMatch>,
    pub incident_count: Option<FieldMatch>,
    /// Set when text extraction failed; all other fields are then empty.
    pub error: Option<String>,
}

impl ExtractedRecord {
    /// A record for a document whose text could not be obtained.
    pub fn failed(document_name: &str, error: impl Into<String>) -> Self {
        Self {
            file_id: file_id_from_filename(document_name),
            filename: document_name.to_string(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::UnitName => !self.unit_name.is_empty(),
            Field::UnitSize => self.unit_size.is_some(),
            Field::UnitCount => self.unit_count.is_some(),
            Field::IncidentCount => self.incident_count.is_some(),
        }
    }

    /// Number of the four fields that were found.
    pub fn found_count(&self) -> usize {
        Field::ALL.iter().filter(|f| self.has_field(**f)).count()
    }
}

/// Methodological descriptors of a discrete-choice study.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MethodologyRecord {
    pub file_id: String,
    pub filename: String,
    pub statistical_method: String,
    pub alternative_sampling: String,
    pub number_of_variables: Option<u64>,
    pub sample_size_occasions: Option<u64>,
    pub scale_justification: String,
    pub software_used: String,
    pub convergence: String,
    pub text_length: usize,
}
