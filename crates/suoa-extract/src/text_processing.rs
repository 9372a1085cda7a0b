use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::config::ExtractorConfig;

/// Compound-word suffixes that keep their hyphen across a line break
/// ("block-\nlevel" stays "block-level").
pub(crate) static COMPOUND_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "level",
        "based",
        "scale",
        "specific",
        "related",
        "sized",
        "wide",
        "grained",
        "time",
        "type",
        "term",
        "choice",
        "dependent",
        "independent",
        "oriented",
        "class",
        "digit",
        "area",
        "year",
        "order",
    ]
    .into_iter()
    .collect()
});

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Join words split by a hyphen at the end of a line.
///
/// - `"neigh-\nbourhood"` → `"neighbourhood"`
/// - `"tract-\nlevel"` → `"tract-level"` (compound suffix)
/// - `"500 m x 500-\n600 m"` keeps the hyphen (digit before it)
///
/// Hyphens followed by plain spaces are left alone: in running text those are
/// usually dashes or suspended compounds ("census- and tract-level").
pub fn fix_hyphenation(text: &str) -> String {
    fix_hyphenation_with_config(text, &ExtractorConfig::default())
}

pub(crate) fn fix_hyphenation_with_config(text: &str, config: &ExtractorConfig) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(\w)-[ \t]*\r?\n[ \t]*(\w)(\w*)").expect("built-in pattern must compile")
    });

    let default_suffixes: Vec<String> = COMPOUND_SUFFIXES.iter().map(|s| s.to_string()).collect();
    let suffix_set: HashSet<String> = config
        .compound_suffixes
        .resolve(&default_suffixes)
        .into_iter()
        .collect();

    RE.replace_all(text, |caps: &regex::Captures| {
        let before = &caps[1];
        let after_word = format!("{}{}", &caps[2], &caps[3]);

        if before.chars().last().is_some_and(|c| c.is_ascii_digit())
            || suffix_set.contains(&after_word.to_lowercase())
        {
            return format!("{}-{}", before, after_word);
        }
        format!("{}{}", before, after_word)
    })
    .into_owned()
}

/// Replace line breaks with spaces. Byte offsets are preserved.
pub fn collapse_newlines(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

/// Byte offsets where `needle` occurs in `haystack` as a whole phrase, i.e.
/// not preceded or followed by an alphanumeric character.
pub fn phrase_positions<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack
        .match_indices(needle)
        .filter(move |(i, _)| {
            if needle.is_empty() {
                return false;
            }
            let before = haystack[..*i].chars().next_back();
            let after = haystack[i + needle.len()..].chars().next();
            before.is_none_or(|c| !c.is_alphanumeric()) && after.is_none_or(|c| !c.is_alphanumeric())
        })
        .map(|(i, _)| i)
}

pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    phrase_positions(haystack, needle).next().is_some()
}

pub fn count_phrase(haystack: &str, needle: &str) -> usize {
    phrase_positions(haystack, needle).count()
}

/// Capitalise the first letter of every word and lowercase the rest.
/// A "word" starts after any non-alphabetic character (`pc4-area` → `Pc4-Area`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("ﬁnding ﬂow"), "finding flow");
        assert_eq!(expand_ligatures("eﬃcient oﬄine"), "efficient offline");
        assert_eq!(expand_ligatures("no ligatures here"), "no ligatures here");
    }

    #[test]
    fn test_fix_hyphenation_line_break() {
        assert_eq!(fix_hyphenation("neigh-\nbourhood"), "neighbourhood");
        assert_eq!(fix_hyphenation("postal code ar- \n ea"), "postal code area");
    }

    #[test]
    fn test_fix_hyphenation_compound() {
        assert_eq!(fix_hyphenation("tract-\nlevel data"), "tract-level data");
        assert_eq!(fix_hyphenation("fine-\ngrained"), "fine-grained");
    }

    #[test]
    fn test_fix_hyphenation_keeps_inline_dashes() {
        assert_eq!(
            fix_hyphenation("census- and tract-level units"),
            "census- and tract-level units"
        );
        assert_eq!(fix_hyphenation("4-\ndigit postcodes"), "4-digit postcodes");
    }

    #[test]
    fn test_fix_hyphenation_custom_suffix() {
        use crate::ExtractorConfigBuilder;
        let config = ExtractorConfigBuilder::new()
            .add_compound_suffix("aggregated".to_string())
            .build()
            .unwrap();
        assert_eq!(
            fix_hyphenation_with_config("block-\naggregated", &config),
            "block-aggregated"
        );
        assert_eq!(
            fix_hyphenation_with_config("tract-\nlevel", &config),
            "tract-level"
        );
    }

    #[test]
    fn test_fix_hyphenation_replace_suffixes() {
        use crate::ExtractorConfigBuilder;
        let config = ExtractorConfigBuilder::new()
            .set_compound_suffixes(vec!["aggregated".to_string()])
            .build()
            .unwrap();
        assert_eq!(fix_hyphenation_with_config("tract-\nlevel", &config), "tractlevel");
    }

    #[test]
    fn test_collapse_newlines_preserves_length() {
        let text = "size\n2 km²\r\nhere";
        let collapsed = collapse_newlines(text);
        assert_eq!(collapsed.len(), text.len());
        assert_eq!(collapsed, "size 2 km²  here");
    }

    #[test]
    fn test_phrase_positions_respect_word_boundaries() {
        assert!(contains_phrase("the census tract", "tract"));
        assert!(!contains_phrase("a tractor", "tract"));
        assert!(!contains_phrase("wardrobe", "ward"));
        assert_eq!(count_phrase("unit, unit; units", "unit"), 2);
        assert_eq!(count_phrase("anything", ""), 0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("street segment"), "Street Segment");
        assert_eq!(title_case("pc4-area"), "Pc4-Area");
        assert_eq!(title_case("CENSUS tract"), "Census Tract");
    }
}
