use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use suoa_core::{ExtractedRecord, Field};

pub mod export;

pub use export::{
    export_methodology, export_records, methodology_path, write_methodology_csv, write_records,
};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown export format `{0}` (expected csv, json or markdown)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Csv, ExportFormat::Json, ExportFormat::Markdown]
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "markdown",
        })
    }
}

/// How many documents yielded each field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSummary {
    pub total: usize,
    pub failed: usize,
    pub unit_name: usize,
    pub unit_size: usize,
    pub unit_count: usize,
    pub incident_count: usize,
    /// Documents with all four fields.
    pub complete: usize,
}

impl CoverageSummary {
    pub fn from_records(records: &[ExtractedRecord]) -> Self {
        let mut s = Self {
            total: records.len(),
            ..Self::default()
        };
        for r in records {
            if r.error.is_some() {
                s.failed += 1;
            }
            for field in Field::ALL {
                if r.has_field(field) {
                    *s.count_mut(field) += 1;
                }
            }
            if r.found_count() == Field::ALL.len() {
                s.complete += 1;
            }
        }
        s
    }

    pub fn count(&self, field: Field) -> usize {
        match field {
            Field::UnitName => self.unit_name,
            Field::UnitSize => self.unit_size,
            Field::UnitCount => self.unit_count,
            Field::IncidentCount => self.incident_count,
        }
    }

    fn count_mut(&mut self, field: Field) -> &mut usize {
        match field {
            Field::UnitName => &mut self.unit_name,
            Field::UnitSize => &mut self.unit_size,
            Field::UnitCount => &mut self.unit_count,
            Field::IncidentCount => &mut self.incident_count,
        }
    }

    /// Share of documents (0–100) that yielded `field`.
    pub fn percent(&self, field: Field) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(field) as f64 / self.total as f64 * 100.0
        }
    }
}
