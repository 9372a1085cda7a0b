use suoa_core::config_file::{ExtractionConfig, PatternConfig, RangeConfig};

use crate::ExtractError;
use crate::cascade::{Pattern, PlausibleRange, TieBreak};

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(value),
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
        }
    }
}

pub const DEFAULT_UNIT_COUNT_RANGE: PlausibleRange =
    PlausibleRange::new(10.0, 100_000.0).rejecting_years();
pub const DEFAULT_INCIDENT_COUNT_RANGE: PlausibleRange =
    PlausibleRange::new(50.0, 10_000_000.0).rejecting_years();
pub const DEFAULT_VARIABLE_COUNT_RANGE: PlausibleRange = PlausibleRange::new(3.0, 100.0);

/// Configuration for the field extraction pipeline.
///
/// Use [`ExtractorConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    // ── cascades ──
    pub(crate) unit_size_patterns: ListOverride<Pattern>,
    pub(crate) unit_count_patterns: ListOverride<Pattern>,
    pub(crate) incident_count_patterns: ListOverride<Pattern>,
    pub(crate) unit_count_range: PlausibleRange,
    pub(crate) incident_count_range: PlausibleRange,
    pub(crate) size_tie_break: TieBreak,
    pub(crate) count_tie_break: TieBreak,

    // ── relevance.rs ──
    pub(crate) keywords: ListOverride<String>,
    pub(crate) min_sections: usize,
    pub(crate) max_sections: usize,
    /// Run the cascades on the relevant sections only (default: true).
    pub(crate) use_relevance: bool,

    // ── unit_name.rs ──
    pub(crate) unit_names: ListOverride<String>,
    /// Longest accepted unit-name candidate, in words (default: 6).
    pub(crate) max_candidate_words: usize,

    // ── text_processing.rs ──
    pub(crate) compound_suffixes: ListOverride<String>,

    // ── methodology.rs ──
    pub(crate) variable_count_range: PlausibleRange,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            unit_size_patterns: ListOverride::Default,
            unit_count_patterns: ListOverride::Default,
            incident_count_patterns: ListOverride::Default,
            unit_count_range: DEFAULT_UNIT_COUNT_RANGE,
            incident_count_range: DEFAULT_INCIDENT_COUNT_RANGE,
            size_tie_break: TieBreak::LastMatch,
            count_tie_break: TieBreak::MostFrequent,
            keywords: ListOverride::Default,
            min_sections: 3,
            max_sections: 10,
            use_relevance: true,
            unit_names: ListOverride::Default,
            max_candidate_words: 6,
            compound_suffixes: ListOverride::Default,
            variable_count_range: DEFAULT_VARIABLE_COUNT_RANGE,
        }
    }
}

impl ExtractorConfig {
    pub fn size_tie_break(&self) -> TieBreak {
        self.size_tie_break
    }

    pub fn count_tie_break(&self) -> TieBreak {
        self.count_tie_break
    }

    pub fn min_sections(&self) -> usize {
        self.min_sections
    }

    pub fn max_sections(&self) -> usize {
        self.max_sections
    }

    pub fn use_relevance(&self) -> bool {
        self.use_relevance
    }

    pub fn unit_count_range(&self) -> PlausibleRange {
        self.unit_count_range
    }

    pub fn incident_count_range(&self) -> PlausibleRange {
        self.incident_count_range
    }

    pub fn variable_count_range(&self) -> PlausibleRange {
        self.variable_count_range
    }

    pub fn max_candidate_words(&self) -> usize {
        self.max_candidate_words
    }
}

/// A pattern given as a string, compiled in [`ExtractorConfigBuilder::build`].
#[derive(Debug, Clone, Default)]
struct PatternSpec {
    pattern: String,
    priority: u32,
    label: String,
}

/// Builder for [`ExtractorConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast if any pattern is invalid or lacks its required capture groups.
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfigBuilder {
    unit_size_patterns: ListOverride<PatternSpec>,
    unit_count_patterns: ListOverride<PatternSpec>,
    incident_count_patterns: ListOverride<PatternSpec>,
    unit_count_range: Option<PlausibleRange>,
    incident_count_range: Option<PlausibleRange>,
    variable_count_range: Option<PlausibleRange>,
    size_tie_break: Option<TieBreak>,
    count_tie_break: Option<TieBreak>,
    keywords: ListOverride<String>,
    min_sections: Option<usize>,
    max_sections: Option<usize>,
    use_relevance: Option<bool>,
    unit_names: ListOverride<String>,
    max_candidate_words: Option<usize>,
    compound_suffixes: ListOverride<String>,
}

fn spec(pattern: &str, priority: u32, label: &str) -> PatternSpec {
    PatternSpec {
        pattern: pattern.to_string(),
        priority,
        label: label.to_string(),
    }
}

impl ExtractorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `[extraction]` table of a config file.
    pub fn from_config(file: &ExtractionConfig) -> Result<Self, ExtractError> {
        let mut b = Self::new();
        if let Some(keywords) = &file.keywords {
            b = b.set_keywords(keywords.clone());
        }
        for k in file.extra_keywords.iter().flatten() {
            b = b.add_keyword(k.clone());
        }
        if let Some(n) = file.min_sections {
            b = b.min_sections(n);
        }
        if let Some(n) = file.max_sections {
            b = b.max_sections(n);
        }
        if let Some(r) = file.unit_count_range {
            b = b.unit_count_range(to_range(r, true));
        }
        if let Some(r) = file.incident_count_range {
            b = b.incident_count_range(to_range(r, true));
        }
        if let Some(r) = file.variable_count_range {
            b = b.variable_count_range(to_range(r, false));
        }
        if let Some(t) = &file.size_tie_break {
            b = b.size_tie_break(t.parse()?);
        }
        if let Some(t) = &file.count_tie_break {
            b = b.count_tie_break(t.parse()?);
        }
        if let Some(n) = file.max_candidate_words {
            b = b.max_candidate_words(n);
        }
        for p in file.extra_unit_size_patterns.iter().flatten() {
            let (pattern, priority, label) = pattern_parts(p, "user_unit_size");
            b = b.add_unit_size_pattern(pattern, priority, label);
        }
        for p in file.extra_unit_count_patterns.iter().flatten() {
            let (pattern, priority, label) = pattern_parts(p, "user_unit_count");
            b = b.add_unit_count_pattern(pattern, priority, label);
        }
        for p in file.extra_incident_count_patterns.iter().flatten() {
            let (pattern, priority, label) = pattern_parts(p, "user_incident_count");
            b = b.add_incident_count_pattern(pattern, priority, label);
        }
        Ok(b)
    }

    // ── Pattern families ──

    pub fn add_unit_size_pattern(mut self, pattern: &str, priority: u32, label: &str) -> Self {
        self.unit_size_patterns.push(spec(pattern, priority, label));
        self
    }

    pub fn set_unit_size_patterns(mut self, patterns: Vec<(String, u32, String)>) -> Self {
        self.unit_size_patterns = ListOverride::Replace(to_specs(patterns));
        self
    }

    pub fn add_unit_count_pattern(mut self, pattern: &str, priority: u32, label: &str) -> Self {
        self.unit_count_patterns.push(spec(pattern, priority, label));
        self
    }

    pub fn set_unit_count_patterns(mut self, patterns: Vec<(String, u32, String)>) -> Self {
        self.unit_count_patterns = ListOverride::Replace(to_specs(patterns));
        self
    }

    pub fn add_incident_count_pattern(mut self, pattern: &str, priority: u32, label: &str) -> Self {
        self.incident_count_patterns.push(spec(pattern, priority, label));
        self
    }

    pub fn set_incident_count_patterns(mut self, patterns: Vec<(String, u32, String)>) -> Self {
        self.incident_count_patterns = ListOverride::Replace(to_specs(patterns));
        self
    }

    // ── Plausibility and tie-breaking ──

    pub fn unit_count_range(mut self, range: PlausibleRange) -> Self {
        self.unit_count_range = Some(range);
        self
    }

    pub fn incident_count_range(mut self, range: PlausibleRange) -> Self {
        self.incident_count_range = Some(range);
        self
    }

    pub fn variable_count_range(mut self, range: PlausibleRange) -> Self {
        self.variable_count_range = Some(range);
        self
    }

    pub fn size_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.size_tie_break = Some(tie_break);
        self
    }

    pub fn count_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.count_tie_break = Some(tie_break);
        self
    }

    // ── Relevance ──

    pub fn set_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = ListOverride::Replace(keywords);
        self
    }

    pub fn add_keyword(mut self, keyword: String) -> Self {
        self.keywords.push(keyword);
        self
    }

    pub fn min_sections(mut self, n: usize) -> Self {
        self.min_sections = Some(n);
        self
    }

    pub fn max_sections(mut self, n: usize) -> Self {
        self.max_sections = Some(n);
        self
    }

    /// Disable relevance windowing and search the whole text.
    pub fn use_relevance(mut self, enabled: bool) -> Self {
        self.use_relevance = Some(enabled);
        self
    }

    // ── Unit names ──

    pub fn set_unit_names(mut self, names: Vec<String>) -> Self {
        self.unit_names = ListOverride::Replace(names);
        self
    }

    pub fn add_unit_name(mut self, name: String) -> Self {
        self.unit_names.push(name);
        self
    }

    pub fn max_candidate_words(mut self, n: usize) -> Self {
        self.max_candidate_words = Some(n);
        self
    }

    // ── Compound suffixes ──

    pub fn set_compound_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.compound_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_compound_suffix(mut self, suffix: String) -> Self {
        self.compound_suffixes.push(suffix);
        self
    }

    /// Compile all string patterns and produce an [`ExtractorConfig`].
    pub fn build(self) -> Result<ExtractorConfig, ExtractError> {
        let compile = |specs: ListOverride<PatternSpec>,
                       needs_unit: bool|
         -> Result<ListOverride<Pattern>, ExtractError> {
            let compile_all = |specs: Vec<PatternSpec>| -> Result<Vec<Pattern>, ExtractError> {
                specs
                    .into_iter()
                    .map(|s| {
                        let p = Pattern::new(&s.pattern, s.priority, s.label)?;
                        if needs_unit && !p.has_group("unit") {
                            return Err(ExtractError::MissingGroup {
                                label: p.label().to_string(),
                                group: "unit",
                            });
                        }
                        Ok(p)
                    })
                    .collect()
            };
            Ok(match specs {
                ListOverride::Default => ListOverride::Default,
                ListOverride::Replace(v) => ListOverride::Replace(compile_all(v)?),
                ListOverride::Extend(v) => ListOverride::Extend(compile_all(v)?),
            })
        };

        Ok(ExtractorConfig {
            unit_size_patterns: compile(self.unit_size_patterns, true)?,
            unit_count_patterns: compile(self.unit_count_patterns, false)?,
            incident_count_patterns: compile(self.incident_count_patterns, false)?,
            unit_count_range: self.unit_count_range.unwrap_or(DEFAULT_UNIT_COUNT_RANGE),
            incident_count_range: self
                .incident_count_range
                .unwrap_or(DEFAULT_INCIDENT_COUNT_RANGE),
            size_tie_break: self.size_tie_break.unwrap_or(TieBreak::LastMatch),
            count_tie_break: self.count_tie_break.unwrap_or(TieBreak::MostFrequent),
            keywords: self.keywords,
            min_sections: self.min_sections.unwrap_or(3),
            max_sections: self.max_sections.unwrap_or(10),
            use_relevance: self.use_relevance.unwrap_or(true),
            unit_names: self.unit_names,
            max_candidate_words: self.max_candidate_words.unwrap_or(6),
            compound_suffixes: self.compound_suffixes,
            variable_count_range: self
                .variable_count_range
                .unwrap_or(DEFAULT_VARIABLE_COUNT_RANGE),
        })
    }
}

fn to_specs(patterns: Vec<(String, u32, String)>) -> Vec<PatternSpec> {
    patterns
        .into_iter()
        .map(|(pattern, priority, label)| PatternSpec {
            pattern,
            priority,
            label,
        })
        .collect()
}

fn to_range(r: RangeConfig, reject_year_like: bool) -> PlausibleRange {
    PlausibleRange {
        min: r.min as f64,
        max: r.max as f64,
        reject_year_like,
    }
}

fn pattern_parts<'a>(p: &'a PatternConfig, fallback: &'a str) -> (&'a str, u32, &'a str) {
    (
        p.pattern.as_str(),
        p.priority,
        p.label.as_deref().unwrap_or(fallback),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert_eq!(config.max_sections, 10);
        assert_eq!(config.min_sections, 3);
        assert_eq!(config.max_candidate_words, 6);
        assert_eq!(config.size_tie_break, TieBreak::LastMatch);
        assert_eq!(config.count_tie_break, TieBreak::MostFrequent);
        assert!(config.incident_count_range.reject_year_like);
    }

    #[test]
    fn test_builder_basic() {
        let config = ExtractorConfigBuilder::new()
            .max_sections(4)
            .count_tie_break(TieBreak::FirstMatch)
            .incident_count_range(PlausibleRange::new(100.0, 1000.0))
            .build()
            .unwrap();
        assert_eq!(config.max_sections, 4);
        assert_eq!(config.count_tie_break, TieBreak::FirstMatch);
        assert_eq!(config.incident_count_range.min, 100.0);
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ExtractorConfigBuilder::new()
            .add_unit_count_pattern(r"(?P<num>[invalid", 10, "broken")
            .build();
        assert!(matches!(result, Err(ExtractError::Regex(_))));
    }

    #[test]
    fn test_size_pattern_needs_unit_group() {
        let result = ExtractorConfigBuilder::new()
            .add_unit_size_pattern(r"(?P<num>\d+) acres", 80, "acres")
            .build();
        assert!(matches!(
            result,
            Err(ExtractError::MissingGroup { group: "unit", .. })
        ));
    }

    #[test]
    fn test_add_pattern_extends_defaults() {
        let config = ExtractorConfigBuilder::new()
            .add_unit_count_pattern(r"(?P<num>\d+)\s+barrios", 95, "barrios")
            .build()
            .unwrap();
        let resolved = config.unit_count_patterns.resolve(&[]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].label(), "barrios");
        assert!(matches!(config.unit_count_patterns, ListOverride::Extend(_)));
    }

    #[test]
    fn test_from_config_file() {
        let file = ExtractionConfig {
            max_sections: Some(5),
            size_tie_break: Some("first".into()),
            unit_count_range: Some(RangeConfig { min: 20, max: 500 }),
            extra_keywords: Some(vec!["barrio".into()]),
            extra_incident_count_patterns: Some(vec![PatternConfig {
                pattern: r"(?P<num>\d+)\s+hurtos".into(),
                priority: 90,
                label: None,
            }]),
            ..Default::default()
        };
        let config = ExtractorConfigBuilder::from_config(&file)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.max_sections, 5);
        assert_eq!(config.size_tie_break, TieBreak::FirstMatch);
        assert_eq!(config.unit_count_range.max, 500.0);
        assert!(config.unit_count_range.reject_year_like);
        assert_eq!(config.keywords.resolve(&[]), vec!["barrio".to_string()]);
        let extra = config.incident_count_patterns.resolve(&[]);
        assert_eq!(extra[0].label(), "user_incident_count");
    }

    #[test]
    fn test_from_config_bad_tie_break() {
        let file = ExtractionConfig {
            count_tie_break: Some("coin-flip".into()),
            ..Default::default()
        };
        assert!(matches!(
            ExtractorConfigBuilder::from_config(&file),
            Err(ExtractError::InvalidTieBreak(_))
        ));
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
