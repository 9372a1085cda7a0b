//! Detection and canonicalisation of the spatial unit type ("Census tract",
//! "Postal code area", ...).
//!
//! Candidates come from three sources, in decreasing confidence: direct
//! phrasings ("the unit of analysis is ..."), weaker contextual phrasings
//! ("... with an area of ..."), and a dictionary scan of known unit names.
//! The best candidate is mapped onto a canonical name.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text_processing::{contains_phrase, phrase_positions, title_case};

pub const DIRECT_CONFIDENCE: f32 = 0.95;
pub const DICTIONARY_CONFIDENCE: f32 = 0.9;
pub const DICTIONARY_VARIANT_CONFIDENCE: f32 = 0.85;
pub const CONTEXT_CONFIDENCE: f32 = 0.8;

/// Known unit names, most specific first. Discovery order breaks confidence
/// ties, so "census block group" is preferred over "block".
pub(crate) static DEFAULT_UNIT_NAMES: &[&str] = &[
    "census block group",
    "census block",
    "census tract",
    "postal code area",
    "postcode area",
    "lower layer super output area",
    "lower super output area",
    "middle layer super output area",
    "middle super output area",
    "output area",
    "statistical local area",
    "statistical area",
    "sla",
    "lsoa",
    "msoa",
    "grid cell",
    "grid square",
    "pc4 area",
    "pc4",
    "sa2",
    "sa1",
    "street segment",
    "road segment",
    "neighborhood",
    "neighbourhood",
    "community",
    "postal code",
    "postcode",
    "zip code",
    "ward",
    "district",
    "municipality",
    "residential suburb",
    "suburb",
    "administrative unit",
    "city block",
    "census unit",
    "small area",
    "block group",
    "block",
    "tract",
    "property",
    "household",
];

/// Variant spelling → canonical unit name.
static SYNONYMS: &[(&str, &str)] = &[
    ("census block", "Census block"),
    ("census blocks", "Census block"),
    ("census tract", "Census tract"),
    ("census tracts", "Census tract"),
    ("block", "Census block"),
    ("blocks", "Census block"),
    ("tract", "Census tract"),
    ("tracts", "Census tract"),
    ("city block", "Census block"),
    ("city blocks", "Census block"),
    ("street block", "Census block"),
    ("block group", "Block group"),
    ("block groups", "Block group"),
    ("census block group", "Block group"),
    ("census block groups", "Block group"),
    ("postal code", "Postal code area"),
    ("postal codes", "Postal code area"),
    ("postal code area", "Postal code area"),
    ("postal code areas", "Postal code area"),
    ("postcode", "Postal code area"),
    ("postcodes", "Postal code area"),
    ("postcode area", "Postal code area"),
    ("post code", "Postal code area"),
    ("post code area", "Postal code area"),
    ("zip code", "Postal code area"),
    ("zip codes", "Postal code area"),
    ("zipcode", "Postal code area"),
    ("zip", "Postal code area"),
    ("4-digit postal code", "Postal code area"),
    ("4-digit postcode", "Postal code area"),
    ("pc4", "PC4 area"),
    ("pc4 area", "PC4 area"),
    ("output area", "Output area"),
    ("output areas", "Output area"),
    ("lower super output area", "LSOA"),
    ("lower layer super output area", "LSOA"),
    ("lsoa", "LSOA"),
    ("lsoas", "LSOA"),
    ("middle super output area", "MSOA"),
    ("middle layer super output area", "MSOA"),
    ("msoa", "MSOA"),
    ("statistical local area", "Statistical Local Area (SLA)"),
    ("sla", "Statistical Local Area (SLA)"),
    ("statistical area", "Statistical area"),
    ("sa2", "SA2"),
    ("sa1", "SA1"),
    ("neighborhood", "Neighborhood"),
    ("neighbourhood", "Neighborhood"),
    ("neighborhoods", "Neighborhood"),
    ("neighbourhoods", "Neighborhood"),
    ("community", "Community"),
    ("communities", "Community"),
    ("residential suburb", "Residential suburb"),
    ("suburb", "Residential suburb"),
    ("suburbs", "Residential suburb"),
    ("residential area", "Residential area"),
    ("residential district", "Residential district"),
    ("street segment", "Street segment"),
    ("street segments", "Street segment"),
    ("road segment", "Street segment"),
    ("road segments", "Street segment"),
    ("grid cell", "Grid cell"),
    ("grid cells", "Grid cell"),
    ("cell", "Grid cell"),
    ("cells", "Grid cell"),
    ("grid square", "Grid cell"),
    ("grid squares", "Grid cell"),
    ("property", "Property"),
    ("properties", "Property"),
    ("household", "Household"),
    ("households", "Household"),
    ("ward", "Ward"),
    ("wards", "Ward"),
    ("district", "District"),
    ("districts", "District"),
    ("municipality", "Municipality"),
    ("municipalities", "Municipality"),
    ("administrative unit", "Administrative unit"),
    ("census unit", "Census unit"),
    ("small area", "Small area"),
    ("small areas", "Small area"),
    ("census unit statistical area", "Census unit statistical area"),
];

static SYNONYMS_LONGEST_FIRST: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut v = SYNONYMS.to_vec();
    v.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
    v
});

static STOPWORDS: &[&str] = &["the", "a", "an", "at", "of", "level"];

const NAME: &str = r"(?P<name>[a-z0-9\s\-()]+?)";
const NAME_WORDS: &str = r"(?P<name>(?:[a-z0-9()\-]+\s+){0,3}[a-z0-9()\-]+)";
const TERM: &str = r"(?:[.,;:\n]|\bwith\b|\bwhich\b|\band\b|\bwhere\b|\blevel\b|$)";
const LEVEL_TERM: &str = r"(?:-level|\s+level|[.,;:\n]|\bwith\b|\bwhich\b|\band\b|\bwhere\b|$)";
const VERB: &str = r"(?:\s+(?:in|for|of)\s+(?:this|the|our)\s+(?:study|analysis|paper|research))?(?:\s+(?:is|was|are|were)\b|\s*:)";

struct Template {
    regex: Regex,
    label: &'static str,
    confidence: f32,
}

fn template(pattern: String, label: &'static str, confidence: f32) -> Template {
    Template {
        regex: Regex::new(&pattern).expect("built-in pattern must compile"),
        label,
        confidence,
    }
}

static TEMPLATES: Lazy<Vec<Template>> = Lazy::new(|| {
    let d = DIRECT_CONFIDENCE;
    let c = CONTEXT_CONFIDENCE;
    vec![
        template(
            format!(r"\b(?:spatial\s+)?units?\s+of\s+(?:analysis|observation|measurement){VERB}\s*(?:the\s+)?{NAME}{TERM}"),
            "unit_of_analysis_is",
            d,
        ),
        template(
            format!(r"\b(?:spatial|analysis|study|area)\s+units?(?:\s+used)?{VERB}\s*(?:the\s+)?{NAME}{TERM}"),
            "spatial_units_are",
            d,
        ),
        template(
            format!(r"\b(?:the|our)\s+(?:spatial|geographical|geographic)\s+(?:scale|resolution){VERB}\s*(?:the\s+)?{NAME}{LEVEL_TERM}"),
            "spatial_scale_is",
            d,
        ),
        template(
            format!(r"\b(?:data|crimes|incidents|burglaries|robberies|offen[cs]es|events|counts)\s+(?:is|was|are|were)\s+aggregated\s+(?:at|to)\s+(?:the\s+)?{NAME}{LEVEL_TERM}"),
            "aggregated_at",
            d,
        ),
        template(
            format!(r"\banaly(?:sis|ses)\s+(?:is|was|are|were)\s+(?:conducted|performed|carried\s+out)\s+at\s+(?:the\s+)?{NAME}{LEVEL_TERM}"),
            "analysis_conducted_at",
            d,
        ),
        template(
            format!(r"\banaly[sz]ed\s+at\s+the\s+{NAME}{LEVEL_TERM}"),
            "analysed_at",
            d,
        ),
        template(
            format!(r"\bwe\s+(?:used|use|employed|employ|chose|selected)\s+(?:the\s+)?{NAME}\s+as\s+(?:our|the)\s+(?:spatial\s+)?(?:units?|level)\s+of\s+analysis"),
            "used_as_unit",
            d,
        ),
        template(
            format!(r"\bas\s+the\s+(?:spatial\s+)?unit\s+of\s+analysis,?\s+(?:we\s+(?:used|use|employed|selected)\s+)?(?:the\s+)?{NAME}{TERM}"),
            "as_the_unit",
            d,
        ),
        template(
            format!(r"\bchoice\s+sets?\s+(?:is\s+|was\s+|are\s+|were\s+)?(?:compos(?:es|ed)|consist(?:s|ed)|made\s+up)\s+of\s+(?:all\s+)?(?:the\s+)?(?:\d[\d,]*\s+)?{NAME}{TERM}"),
            "choice_set_of",
            d,
        ),
        template(
            format!(r"\b(?:crime|offender|criminal)\s+location\s+choices?\s+(?:at|in|among)\s+(?:the\s+)?{NAME}{LEVEL_TERM}"),
            "location_choice_at",
            d,
        ),
        template(
            format!(r"\blocated\s+in\s+(?:one\s+of\s+)?\d[\d,]*\s+{NAME}{TERM}"),
            "located_in_n",
            d,
        ),
        template(
            format!(r"\b(?:divided|partitioned|split)\s+into\s+(?:\d[\d,]*\s+)?{NAME}{TERM}"),
            "divided_into",
            d,
        ),
        template(
            format!(r"\b\d[\d,]*\s+{NAME_WORDS}\s+(?:with|having)\s+(?:an?\s+)?(?:average\s+|mean\s+|median\s+)?(?:area|size)\b"),
            "counted_with_area",
            c,
        ),
        template(
            format!(r"{NAME_WORDS}\s+(?:with|having|of)\s+(?:an\s+area|a\s+size|an\s+average\s+(?:area|size)|a\s+mean\s+(?:area|size))\s+of\s+(?:about\s+|approximately\s+)?\d"),
            "name_with_area_of",
            c,
        ),
        template(
            format!(r"{NAME_WORDS}[\s-]+(?:level|scale)\s+(?:was|were|is|are)\s+(?:used\s+as\s+)?(?:the|a|an)\s+(?:spatial\s+)?(?:unit|area)"),
            "name_level_unit",
            c,
        ),
        template(
            format!(r"\b(?:used|considered|defined|adopted)\s+{NAME_WORDS}\s+as\s+(?:the\s+|our\s+)?(?:spatial\s+)?(?:units?|areas?)\b"),
            "used_name_as",
            c,
        ),
        template(
            format!(r"\beach\s+{NAME_WORDS}\s+(?:has|contains|represents|covers)\b"),
            "each_name",
            c,
        ),
    ]
});

/// One possible unit name found in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct NameCandidate {
    /// Cleaned candidate text (lower-case, stopwords removed).
    pub name: String,
    pub confidence: f32,
    /// Template label, or `dictionary` / `dictionary_variant`.
    pub source: String,
    /// Byte range of the raw capture within the lower-cased text.
    pub span: Range<usize>,
}

/// Remove stopwords and stray hyphens; reject empty, numeric-only or overlong
/// candidates.
pub fn clean_candidate(raw: &str, max_words: usize) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .map(|w| w.strip_suffix("-level").unwrap_or(w).trim_matches('-'))
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .collect();
    if words.is_empty() || words.len() > max_words {
        return None;
    }
    let cleaned = words.join(" ");
    cleaned
        .chars()
        .any(|c| c.is_alphabetic())
        .then_some(cleaned)
}

/// Map a detected name onto its canonical form.
///
/// Exact synonym hits win; otherwise the longest synonym that occurs in the
/// name as a whole phrase; otherwise the name is title-cased.
pub fn canonicalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    if lower.is_empty() {
        return String::new();
    }
    if let Some((_, canonical)) = SYNONYMS.iter().find(|(k, _)| *k == lower) {
        return canonical.to_string();
    }
    if let Some((_, canonical)) = SYNONYMS_LONGEST_FIRST
        .iter()
        .find(|(k, _)| contains_phrase(&lower, k))
    {
        return canonical.to_string();
    }
    title_case(&lower)
}

/// Detects the unit-of-analysis name in document text.
#[derive(Debug, Clone)]
pub struct UnitNameDetector {
    unit_names: Vec<String>,
    max_words: usize,
}

impl Default for UnitNameDetector {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_NAMES.iter().map(|s| s.to_string()).collect(), 6)
    }
}

impl UnitNameDetector {
    pub fn new(unit_names: Vec<String>, max_words: usize) -> Self {
        Self {
            unit_names: unit_names.into_iter().map(|n| n.to_lowercase()).collect(),
            max_words,
        }
    }

    /// All accepted candidates in discovery order.
    pub fn candidates(&self, text: &str) -> Vec<NameCandidate> {
        let lower = text.to_lowercase();
        let mut out = Vec::new();

        for t in TEMPLATES.iter() {
            for caps in t.regex.captures_iter(&lower) {
                let Some(m) = caps.name("name") else { continue };
                if let Some(name) = clean_candidate(m.as_str(), self.max_words) {
                    out.push(NameCandidate {
                        name,
                        confidence: t.confidence,
                        source: t.label.to_string(),
                        span: m.range(),
                    });
                }
            }
        }

        for unit in &self.unit_names {
            for pos in phrase_positions(&lower, unit) {
                out.push(NameCandidate {
                    name: unit.clone(),
                    confidence: DICTIONARY_CONFIDENCE,
                    source: "dictionary".to_string(),
                    span: pos..pos + unit.len(),
                });
            }
            for variant in variants(unit) {
                let first = phrase_positions(&lower, &variant).next();
                if let Some(pos) = first {
                    out.push(NameCandidate {
                        span: pos..pos + variant.len(),
                        name: variant,
                        confidence: DICTIONARY_VARIANT_CONFIDENCE,
                        source: "dictionary_variant".to_string(),
                    });
                }
            }
        }

        out
    }

    /// Best candidate, canonicalised. Empty when nothing was found.
    pub fn detect(&self, text: &str) -> String {
        let mut candidates = self.candidates(text);
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        match candidates.first() {
            Some(best) => {
                let canonical = canonicalize(&best.name);
                tracing::debug!(
                    candidate = %best.name,
                    source = %best.source,
                    confidence = best.confidence,
                    canonical = %canonical,
                    "detected unit name"
                );
                canonical
            }
            None => String::new(),
        }
    }
}

/// Plural and possessive spellings of a dictionary name.
fn variants(name: &str) -> Vec<String> {
    let mut v = vec![format!("{name}s"), format!("{name}'s")];
    if let Some(stem) = name.strip_suffix('y') {
        v.push(format!("{stem}ies"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> String {
        UnitNameDetector::default().detect(text)
    }

    #[test]
    fn direct_statement_wins() {
        assert_eq!(
            detect("the unit of analysis is the postal code area"),
            "Postal code area"
        );
    }

    #[test]
    fn colon_form_is_direct() {
        assert_eq!(
            detect("Spatial unit of analysis: census tracts. Other text."),
            "Census tract"
        );
    }

    #[test]
    fn aggregated_at_level() {
        assert_eq!(
            detect("All burglaries were aggregated to the census block-level for modelling."),
            "Census block"
        );
    }

    #[test]
    fn dictionary_fallback_prefers_specific_names() {
        assert_eq!(
            detect("We model offender choices within every census block group of the city."),
            "Block group"
        );
    }

    #[test]
    fn nothing_found_is_empty() {
        assert_eq!(detect("A paper about offender decision making."), "");
    }

    #[test]
    fn clean_candidate_rules() {
        assert_eq!(
            clean_candidate("the census tract ", 6).as_deref(),
            Some("census tract")
        );
        assert_eq!(clean_candidate("the a of", 6), None);
        assert_eq!(clean_candidate("142", 6), None);
        assert_eq!(clean_candidate("one two three four five six seven", 6), None);
    }

    #[test]
    fn canonicalize_exact_then_phrase_then_title() {
        assert_eq!(canonicalize("census tracts"), "Census tract");
        assert_eq!(canonicalize("residential census tracts in chicago"), "Census tract");
        assert_eq!(canonicalize("barrio"), "Barrio");
    }

    #[test]
    fn canonicalize_ignores_embedded_substrings() {
        assert_eq!(canonicalize("cellular zone"), "Cellular Zone");
        assert_eq!(canonicalize("wardrobe district"), "District");
    }

    #[test]
    fn longest_known_phrase_names_a_compound_unit() {
        assert_eq!(canonicalize("small area statistical unit"), "Small area");
        assert_eq!(canonicalize("census block group boundaries"), "Block group");
    }

    #[test]
    fn candidates_report_sources() {
        let candidates =
            UnitNameDetector::default().candidates("the unit of analysis is the lsoa.");
        assert_eq!(candidates[0].source, "unit_of_analysis_is");
        assert_eq!(candidates[0].name, "lsoa");
        assert!(candidates.iter().any(|c| c.source == "dictionary"));
    }
}
