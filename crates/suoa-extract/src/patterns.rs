//! Built-in pattern families for the three numeric fields.
//!
//! Priorities are spaced by tens so user patterns from the config file can be
//! slotted between them.

use once_cell::sync::Lazy;

use crate::cascade::Pattern;

/// Area quantity: thousands-grouped (`1,234,567`), decimal point or decimal comma.
const AREA_NUM: &str = r"\b(?P<num>(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{1,6}(?:[.,]\d{1,6})?))";

/// Second factor of a grid dimension; same shape as [`AREA_NUM`] without the group.
const GRID_FACTOR: &str = r"(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{1,6}(?:[.,]\d{1,6})?)";

/// Area unit. `²` is not a word character, so those alternatives carry no `\b`.
const AREA_UNIT: &str = r"(?P<unit>km²|km2\b|km\^2|sq\.?\s?km\b|square\s+kilomet(?:er|re)s?\b|square\s+km\b|mi²|mi2\b|sq\.?\s?mi(?:les?)?\b|square\s+miles?\b|m²|m2\b|sq\.?\s?m\b|square\s+met(?:er|re)s?\b|hectares?\b|ha\b)";

/// Integer count, optionally with thousands separators.
const COUNT_NUM: &str = r"\b(?P<num>\d{1,3}(?:[,.]\d{3})+|\d{1,7})\b";

/// Up to two words between a number and its noun ("1,761 burglary incidents").
const QUALIFIERS: &str = r"(?:[a-z-]+\s+){0,2}";

const UNIT_NOUNS: &str = r"(?:census\s+)?(?:block\s+groups?|blocks?|tracts?|postal\s+codes?(?:\s+areas)?|postcodes?|zip\s+codes|grid\s+cells|cells|wards|districts|suburbs|neighbou?rhoods|communities|lsoas|output\s+areas|street\s+segments|segments|spatial\s+units|units|areas|zones|municipalities)";

const INCIDENT_NOUNS: &str = r"(?:incidents|crimes|burglaries|robberies|thefts|offen[cs]es|criminal\s+events|crime\s+events|snatchings|arsons|assaults|attacks)";

const ANALYSIS_VERBS: &str = r"(?:analy[sz]ed|studied|included|processed|recorded|documented|used|examined|geocoded|selected)";

pub const MEAN_SIZE: u32 = 70;
pub const NAMED_UNIT_SIZE: u32 = 60;
pub const AREA_OF_UNIT: u32 = 50;
pub const TOTAL_AREA_DIVIDED: u32 = 45;
pub const GENERIC_SIZE: u32 = 40;
pub const GRID_DIMENSIONS: u32 = 30;
pub const NUMBER_FIRST_AVERAGE: u32 = 20;
pub const BARE_AREA: u32 = 10;

fn builtin(pattern: String, priority: u32, label: &str) -> Pattern {
    Pattern::new(&pattern, priority, label).expect("built-in pattern must compile")
}

pub(crate) static UNIT_SIZE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        builtin(
            format!(
                r"(?i)\b(?:mean|median|average)\b[^\d\n]{{0,30}}?\b(?:size|area)s?\b[^\d\n]{{0,30}}?{AREA_NUM}\s*{AREA_UNIT}"
            ),
            MEAN_SIZE,
            "mean_size",
        ),
        builtin(
            format!(
                r"(?i)\b(?:spatial\s+units?|units?\s+of\s+analysis|census\s+(?:block\s+groups?|blocks?|tracts?)|postal\s+code\s+areas?|postcodes?|grid\s+cells?|statistical\s+areas?|neighbou?rhoods?|lsoas?|output\s+areas?|wards?|suburbs?|street\s+segments?)\b[^\d\n]{{0,50}}?\b(?:area|size)s?\b[^\d\n]{{0,30}}?{AREA_NUM}\s*{AREA_UNIT}"
            ),
            NAMED_UNIT_SIZE,
            "named_unit_size",
        ),
        builtin(
            format!(
                r"(?i)\barea\s+of\s+(?:the\s+|each\s+|a\s+|an\s+)?(?:spatial\s+)?(?:units?|blocks?|tracts?|cells?|postcodes?|wards?|neighbou?rhoods?|zones?)\b[^\d\n]{{0,40}}?{AREA_NUM}\s*{AREA_UNIT}"
            ),
            AREA_OF_UNIT,
            "area_of_unit",
        ),
        // The `units` group makes the cascade report total / units instead of
        // the total itself.
        builtin(
            format!(
                r"(?i)\b(?:total|combined|overall)\b[^\d\n]{{0,20}}?\barea\b[^\d\n]{{0,40}}?{AREA_NUM}\s*{AREA_UNIT}[^\d\n]{{0,50}}?\b(?:divided|split|partitioned|distributed)\s+(?:across|into|among|over)\s+(?:the\s+|all\s+)?(?P<units>\d{{1,3}}(?:,\d{{3}})+|\d{{1,7}})\s+{QUALIFIERS}{UNIT_NOUNS}\b"
            ),
            TOTAL_AREA_DIVIDED,
            "total_area_divided",
        ),
        builtin(
            format!(r"(?i)\b(?:area|size)s?\b[^\d\n]{{1,40}}?{AREA_NUM}\s*{AREA_UNIT}"),
            GENERIC_SIZE,
            "generic_size",
        ),
        builtin(
            format!(
                r"(?i){AREA_NUM}\s*(?:m|km)?\s*[×x*]\s*{GRID_FACTOR}\s*(?P<unit>km|kilomet(?:er|re)s?|met(?:er|re)s?|m)\b"
            ),
            GRID_DIMENSIONS,
            "grid_dimensions",
        ),
        builtin(
            format!(
                r"(?i){AREA_NUM}\s*{AREA_UNIT}[^\d\n]{{0,40}}?\b(?:on\s+average|mean|median|average|per\s+(?:unit|block|tract|cell|postcode|zone)|each)\b"
            ),
            NUMBER_FIRST_AVERAGE,
            "number_first_average",
        ),
        builtin(format!(r"(?i){AREA_NUM}\s*{AREA_UNIT}"), BARE_AREA, "bare_area"),
    ]
});

pub(crate) static UNIT_COUNT_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        builtin(
            format!(
                r"(?i)\b(?:total|number|count|sample)\s+of\s+{COUNT_NUM}\s+{QUALIFIERS}{UNIT_NOUNS}\b"
            ),
            60,
            "total_of_units",
        ),
        builtin(
            format!(
                r"(?i)\b(?:total|number|count)\s+of\s+{QUALIFIERS}{UNIT_NOUNS}\b[^\d\n]{{0,40}}?{COUNT_NUM}"
            ),
            55,
            "unit_total_is",
        ),
        builtin(
            format!(
                r"(?i)\b(?:{ANALYSIS_VERBS}|comprise[sd]?|consist(?:s|ed)?\s+of|contain(?:s|ed)?|(?:divided|partitioned|split|aggregated)\s+into)\s+(?:the\s+|all\s+)?{COUNT_NUM}\s+{QUALIFIERS}{UNIT_NOUNS}\b"
            ),
            50,
            "analysed_units",
        ),
        builtin(
            format!(
                r"(?i)\b(?:study\s+area|city|region|municipality)\b[^\d\n]{{0,50}}?{COUNT_NUM}\s+{QUALIFIERS}{UNIT_NOUNS}\b"
            ),
            40,
            "study_area_units",
        ),
        builtin(
            format!(r"(?i){COUNT_NUM}\s+{QUALIFIERS}{UNIT_NOUNS}\b"),
            30,
            "number_then_units",
        ),
    ]
});

pub(crate) static INCIDENT_COUNT_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        builtin(
            format!(
                r"(?i)\b(?:total|number|sample)\s+of\s+{COUNT_NUM}\s+{QUALIFIERS}(?:{INCIDENT_NOUNS}|cases|events)\b"
            ),
            60,
            "total_of_incidents",
        ),
        builtin(
            format!(
                r"(?i)\b(?:total|number)\s+of\s+{QUALIFIERS}{INCIDENT_NOUNS}\b[^\d\n]{{0,40}}?{COUNT_NUM}"
            ),
            55,
            "incident_total_is",
        ),
        builtin(
            format!(
                r"(?i)\b{ANALYSIS_VERBS}\s+(?:the\s+|all\s+)?{COUNT_NUM}\s+{QUALIFIERS}(?:{INCIDENT_NOUNS}|cases|events)\b"
            ),
            50,
            "analysed_incidents",
        ),
        builtin(
            format!(
                r"(?i)\b(?:dataset|data\s+set|data|sample|records)\b[^\d\n]{{0,40}}?\b(?:contain(?:s|ed)?|includ(?:es|ed)|compris(?:es|ed)|consist(?:s|ed)\s+of)\b[^\d\n]{{0,40}}?{COUNT_NUM}\s+{QUALIFIERS}(?:{INCIDENT_NOUNS}|cases|events)\b"
            ),
            45,
            "dataset_incidents",
        ),
        builtin(
            format!(
                r"(?i)\b(?:between|from|during|over)\b[^\d\n]{{0,50}}?\b(?:period|timeframe|years|months)\b[^\d\n]{{0,50}}?{COUNT_NUM}\s+{QUALIFIERS}{INCIDENT_NOUNS}\b"
            ),
            40,
            "period_incidents",
        ),
        builtin(
            format!(r"(?i){COUNT_NUM}\s+{QUALIFIERS}{INCIDENT_NOUNS}\b"),
            30,
            "number_then_incidents",
        ),
    ]
});

/// Built-in unit-size family, highest priority first.
pub fn default_unit_size_patterns() -> &'static [Pattern] {
    &UNIT_SIZE_PATTERNS
}

pub fn default_unit_count_patterns() -> &'static [Pattern] {
    &UNIT_COUNT_PATTERNS
}

pub fn default_incident_count_patterns() -> &'static [Pattern] {
    &INCIDENT_COUNT_PATTERNS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_label(label: &str) -> &'static Pattern {
        default_unit_size_patterns()
            .iter()
            .find(|p| p.label() == label)
            .unwrap()
    }

    fn labels_matching(patterns: &[Pattern], text: &str) -> Vec<String> {
        patterns
            .iter()
            .filter(|p| p.regex().is_match(text))
            .map(|p| p.label().to_string())
            .collect()
    }

    #[test]
    fn builtins_compile_with_required_groups() {
        for p in default_unit_size_patterns() {
            assert!(p.has_group("unit"), "{} lacks unit group", p.label());
        }
        assert_eq!(default_unit_count_patterns().len(), 5);
        assert_eq!(default_incident_count_patterns().len(), 6);
    }

    #[test]
    fn unit_size_families_fire() {
        let size = default_unit_size_patterns();
        assert!(labels_matching(size, "the mean size is 2.5 km²").contains(&"mean_size".into()));
        assert!(
            labels_matching(size, "census blocks have an average area of 0.02 km2")
                .contains(&"named_unit_size".into())
        );
        assert!(
            labels_matching(size, "grid cells of 500 × 500 m").contains(&"grid_dimensions".into())
        );
        assert!(
            labels_matching(size, "about 2.96 km² on average").contains(&"number_first_average".into())
        );
        assert!(labels_matching(size, "covering 12 hectares").contains(&"bare_area".into()));
        assert!(
            labels_matching(size, "a total area of 48 km² is divided across 120 blocks")
                .contains(&"total_area_divided".into())
        );
    }

    #[test]
    fn size_families_are_ordered_by_priority() {
        let priorities: Vec<u32> = default_unit_size_patterns()
            .iter()
            .map(|p| p.priority())
            .collect();
        assert!(priorities.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn area_number_keeps_every_thousands_group() {
        let bare = by_label("bare_area");
        let m = bare.regex().captures("covers 1,234,567 m2 in total").unwrap();
        assert_eq!(&m["num"], "1,234,567");
        let m = bare.regex().captures("cells of 0,25 km²").unwrap();
        assert_eq!(&m["num"], "0,25");
    }

    #[test]
    fn total_area_pattern_captures_unit_total() {
        let p = by_label("total_area_divided");
        let m = p
            .regex()
            .captures("The combined area (1,200 ha) was split into 2,400 small blocks.")
            .unwrap();
        assert_eq!(&m["num"], "1,200");
        assert_eq!(&m["units"], "2,400");
    }

    #[test]
    fn superscript_unit_needs_no_word_boundary() {
        let bare = by_label("bare_area");
        let m = bare.regex().captures("spans 4 km², roughly").unwrap();
        assert_eq!(&m["unit"], "km²");
    }

    #[test]
    fn hectare_abbreviation_is_whole_word() {
        let bare = by_label("bare_area");
        assert!(!bare.regex().is_match("for 5 hours"));
        assert!(bare.regex().is_match("for 5 ha each"));
    }

    #[test]
    fn incident_qualifiers_are_bounded() {
        let n = &default_incident_count_patterns()[5];
        assert!(n.regex().is_match("1,761 burglary incidents"));
        assert!(n.regex().is_match("900 residential burglaries"));
        assert!(!n.regex().is_match("900 of the reported and solved crimes"));
    }
}
