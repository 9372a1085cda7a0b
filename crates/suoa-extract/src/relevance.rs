//! Keyword-scored paragraph windowing.
//!
//! Papers mention areas and counts everywhere (study region, literature
//! review, tables). Restricting the cascades to paragraphs that talk about
//! spatial units keeps the candidate pool small.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text_processing::count_phrase;

/// Built-in relevance keywords.
pub(crate) static DEFAULT_KEYWORDS: &[&str] = &[
    "spatial unit",
    "unit of analysis",
    "units of analysis",
    "spatial scale",
    "spatial resolution",
    "census block",
    "census tract",
    "block group",
    "neighborhood",
    "neighbourhood",
    "grid cell",
    "postal code",
    "postcode",
    "zip code",
    "ward",
    "district",
    "suburb",
    "output area",
    "lsoa",
    "street segment",
    "area",
    "size",
    "km",
    "km2",
    "km²",
    "square kilometer",
    "square kilometre",
    "square mile",
    "hectare",
    "ha",
    "aggregated",
    "aggregation",
    "divided into",
    "study area",
    "incidents",
    "crimes",
    "burglaries",
    "robberies",
    "offenses",
    "offences",
    "choice set",
    "alternatives",
];

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("built-in pattern must compile"));

fn score(paragraph: &str, keywords: &[String]) -> usize {
    let lower = paragraph.to_lowercase();
    keywords.iter().map(|k| count_phrase(&lower, k)).sum()
}

/// Select the most keyword-dense paragraphs of `text`.
///
/// Each scoring paragraph contributes itself and its immediate neighbours.
/// Windows are ordered by score (stable for equal scores) and at most
/// `max_sections` of them are kept. Returns the full text when no paragraph
/// scores at all.
pub fn relevant_sections(
    text: &str,
    keywords: &[String],
    min_sections: usize,
    max_sections: usize,
) -> String {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    let paragraphs: Vec<&str> = PARAGRAPH_BREAK.split(text).collect();

    let mut windows: Vec<(usize, String)> = paragraphs
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let s = score(p, &keywords);
            if s == 0 {
                return None;
            }
            let start = i.saturating_sub(1);
            let end = (i + 2).min(paragraphs.len());
            Some((s, paragraphs[start..end].join(" ")))
        })
        .collect();

    if windows.is_empty() {
        tracing::debug!("no paragraph matched relevance keywords, using full text");
        return text.to_string();
    }

    windows.sort_by(|a, b| b.0.cmp(&a.0));
    let keep = max_sections.min(min_sections.max(windows.len()));
    tracing::debug!(
        scored = windows.len(),
        kept = keep.min(windows.len()),
        "selected relevant sections"
    );

    windows
        .into_iter()
        .take(keep)
        .map(|(_, w)| w)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_scoring_paragraph_returns_full_text() {
        let text = "Lorem ipsum dolor.\n\nSit amet.";
        assert_eq!(relevant_sections(text, &defaults(), 3, 10), text);
    }

    #[test]
    fn scoring_paragraph_brings_neighbours() {
        let text = "Intro words.\n\nThe census tract is our unit of analysis.\n\nTotal of 142 were used.\n\nUnrelated ending.";
        let out = relevant_sections(text, &defaults(), 3, 10);
        assert!(out.contains("Intro words."));
        assert!(out.contains("Total of 142 were used."));
        assert!(!out.contains("Unrelated ending."));
    }

    #[test]
    fn higher_scores_come_first() {
        let text = "One ward here.\n\nfiller\n\nfiller\n\nfiller\n\nA census tract, another census tract and a third census tract.";
        let out = relevant_sections(text, &defaults(), 3, 1);
        assert!(out.contains("third census tract"));
        assert!(!out.contains("One ward here."));
    }

    #[test]
    fn keywords_match_whole_words_only() {
        // "ha" must not fire inside "that" or "hazard".
        let text = "That hazard was noted.\n\nNothing else.";
        assert_eq!(relevant_sections(text, &defaults(), 3, 10), text);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let text = "Intro.\n\nWe used the LSOA as our UNIT OF ANALYSIS.";
        let keywords = vec!["Unit of Analysis".to_string()];
        let out = relevant_sections(text, &keywords, 3, 10);
        assert!(out.contains("LSOA"));
    }
}
