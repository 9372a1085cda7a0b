use suoa_core::{Document, ExtractedRecord, Field, FieldMatch, MethodologyRecord};

use crate::cascade::{Cascade, ValueKind};
use crate::config::ExtractorConfig;
use crate::methodology::MethodologyExtractor;
use crate::unit_name::{UnitNameDetector, canonicalize};
use crate::{patterns, relevance, text_processing, units};

/// A configurable field extraction pipeline.
///
/// Holds an [`ExtractorConfig`] plus the cascades resolved from it, and
/// exposes each pipeline step as a method. The default constructor uses
/// built-in defaults; use [`FieldExtractor::with_config`] to supply custom
/// patterns, ranges and tie-breaks.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    config: ExtractorConfig,
    unit_size: Cascade,
    unit_count: Cascade,
    incident_count: Cascade,
    keywords: Vec<String>,
    unit_names: UnitNameDetector,
    methodology: MethodologyExtractor,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ExtractorConfig) -> Self {
        let unit_size = Cascade::new(
            config
                .unit_size_patterns
                .resolve(patterns::default_unit_size_patterns()),
            ValueKind::Area,
        )
        .with_tie_break(config.size_tie_break);
        let unit_count = Cascade::new(
            config
                .unit_count_patterns
                .resolve(patterns::default_unit_count_patterns()),
            ValueKind::Count,
        )
        .with_tie_break(config.count_tie_break)
        .with_range(config.unit_count_range);
        let incident_count = Cascade::new(
            config
                .incident_count_patterns
                .resolve(patterns::default_incident_count_patterns()),
            ValueKind::Count,
        )
        .with_tie_break(config.count_tie_break)
        .with_range(config.incident_count_range);

        let default_keywords: Vec<String> = relevance::DEFAULT_KEYWORDS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let default_names: Vec<String> = crate::unit_name::DEFAULT_UNIT_NAMES
            .iter()
            .map(|s| s.to_string())
            .collect();

        Self {
            keywords: config.keywords.resolve(&default_keywords),
            unit_names: UnitNameDetector::new(
                config.unit_names.resolve(&default_names),
                config.max_candidate_words,
            ),
            methodology: MethodologyExtractor::new(config.variable_count_range),
            unit_size,
            unit_count,
            incident_count,
            config,
        }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Repair PDF artefacts: ligatures and line-break hyphenation (step 1).
    pub fn prepare_text(&self, raw: &str) -> String {
        let text = text_processing::expand_ligatures(raw);
        text_processing::fix_hyphenation_with_config(&text, &self.config)
    }

    /// Keep the keyword-dense paragraphs (step 2).
    pub fn relevant_text(&self, text: &str) -> String {
        if !self.config.use_relevance {
            return text.to_string();
        }
        relevance::relevant_sections(
            text,
            &self.keywords,
            self.config.min_sections,
            self.config.max_sections,
        )
    }

    /// Steps 1 and 2 together: the text every field is searched in.
    pub fn search_text(&self, raw: &str) -> String {
        self.relevant_text(&self.prepare_text(raw))
    }

    pub fn unit_size(&self, text: &str) -> Option<FieldMatch> {
        self.unit_size.run(&text_processing::collapse_newlines(text))
    }

    pub fn unit_count(&self, text: &str) -> Option<FieldMatch> {
        self.unit_count.run(&text_processing::collapse_newlines(text))
    }

    pub fn incident_count(&self, text: &str) -> Option<FieldMatch> {
        self.incident_count.run(&text_processing::collapse_newlines(text))
    }

    /// Canonical unit name, empty when none was detected.
    pub fn unit_name(&self, text: &str) -> String {
        self.unit_names.detect(text)
    }

    /// Every accepted candidate for `field`, in reading order for the
    /// numeric fields and in discovery order for the unit name.
    ///
    /// Unit-name candidates carry their canonical name in `value`, the
    /// cleaned capture in `source` and `confidence × 100` as `priority`.
    pub fn candidates(&self, field: Field, text: &str) -> Vec<FieldMatch> {
        let collapsed = text_processing::collapse_newlines(text);
        match field {
            Field::UnitSize => self.unit_size.candidates(&collapsed),
            Field::UnitCount => self.unit_count.candidates(&collapsed),
            Field::IncidentCount => self.incident_count.candidates(&collapsed),
            Field::UnitName => self
                .unit_names
                .candidates(text)
                .into_iter()
                .map(|c| FieldMatch {
                    value: canonicalize(&c.name),
                    priority: (c.confidence * 100.0).round() as u32,
                    source: c.name,
                    span: c.span,
                    pattern: c.source,
                })
                .collect(),
        }
    }

    /// Run the full pipeline on one document.
    pub fn extract(&self, document: &Document) -> ExtractedRecord {
        let text = self.search_text(&document.text);

        let unit_size = self.unit_size(&text);
        let unit_size_km2 = unit_size.as_ref().and_then(|m| units::to_km2(&m.value));
        let record = ExtractedRecord {
            file_id: document.file_id.clone(),
            filename: document.filename.clone(),
            unit_name: self.unit_name(&text),
            unit_size,
            unit_size_km2,
            unit_count: self.unit_count(&text),
            incident_count: self.incident_count(&text),
            error: None,
        };

        tracing::debug!(
            file_id = %record.file_id,
            searched_chars = text.len(),
            found = record.found_count(),
            "extracted fields"
        );
        record
    }

    /// Methodology descriptors, computed over the whole prepared text.
    pub fn extract_methodology(&self, document: &Document) -> MethodologyRecord {
        let prepared = Document {
            text: self.prepare_text(&document.text),
            ..document.clone()
        };
        self.methodology.extract(&prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractorConfigBuilder;

    #[test]
    fn prepare_text_repairs_pdf_artifacts() {
        let ex = FieldExtractor::new();
        assert_eq!(
            ex.prepare_text("ﬁve neigh-\nbourhoods"),
            "five neighbourhoods"
        );
    }

    #[test]
    fn relevance_can_be_disabled() {
        let ex = FieldExtractor::with_config(
            ExtractorConfigBuilder::new()
                .use_relevance(false)
                .build()
                .unwrap(),
        );
        let text = "Unrelated.\n\nAlso unrelated.";
        assert_eq!(ex.search_text(text), text);
    }

    #[test]
    fn newlines_do_not_break_patterns() {
        let ex = FieldExtractor::new();
        let m = ex.unit_size("the mean size\nis 2.5 km²").unwrap();
        assert_eq!(m.value, "2.5 km²");
        assert_eq!(m.source, "mean size is 2.5 km²");
    }

    #[test]
    fn unit_name_candidates_expose_confidence() {
        let ex = FieldExtractor::new();
        let c = ex.candidates(Field::UnitName, "the unit of analysis is the ward.");
        assert_eq!(c[0].value, "Ward");
        assert_eq!(c[0].priority, 95);
        assert_eq!(c[0].pattern, "unit_of_analysis_is");
    }

    #[test]
    fn extract_converts_size() {
        let ex = FieldExtractor::new();
        let doc = Document::new(
            "S09_grid.txt",
            "The study area was divided into grid cells of 500 × 500 m.",
        );
        let rec = ex.extract(&doc);
        assert_eq!(rec.unit_size.as_ref().unwrap().value, "500 × 500 m");
        assert_eq!(rec.unit_size_km2, Some(0.25));
        assert_eq!(rec.unit_name, "Grid cell");
    }

    #[test]
    fn custom_pattern_outranks_builtins() {
        let config = ExtractorConfigBuilder::new()
            .add_unit_count_pattern(r"(?i)(?P<num>\d+)\s+barrios", 95, "barrios")
            .build()
            .unwrap();
        let ex = FieldExtractor::with_config(config);
        let m = ex.unit_count("a total of 300 blocks in 75 barrios").unwrap();
        assert_eq!(m.value, "75");
        assert_eq!(m.pattern, "barrios");
    }

    #[test]
    fn methodology_uses_prepared_text() {
        let ex = FieldExtractor::new();
        let doc = Document::new("S02_x.pdf", "A mixed logit was esti-\nmated in NLOGIT.");
        let rec = ex.extract_methodology(&doc);
        assert_eq!(rec.statistical_method, "Mixed Logit");
        assert_eq!(rec.software_used, "NLOGIT");
    }
}
