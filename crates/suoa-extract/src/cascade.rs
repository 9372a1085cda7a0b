//! Priority-ranked regex cascade shared by every numeric field.
//!
//! A [`Cascade`] runs all of its patterns over the text, turns each match into
//! a candidate, drops candidates that fail numeric plausibility, keeps only the
//! candidates of the highest surviving priority and applies a [`TieBreak`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use regex::{Captures, Regex};
use suoa_core::FieldMatch;

use crate::ExtractError;

/// One matcher in a cascade. Higher `priority` wins.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    priority: u32,
    label: String,
}

impl Pattern {
    /// Compile a pattern. Every pattern needs a `num` capture group.
    pub fn new(pattern: &str, priority: u32, label: impl Into<String>) -> Result<Self, ExtractError> {
        let regex = Regex::new(pattern)?;
        let label = label.into();
        if !regex.capture_names().flatten().any(|n| n == "num") {
            return Err(ExtractError::MissingGroup {
                label,
                group: "num",
            });
        }
        Ok(Self {
            regex,
            priority,
            label,
        })
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub(crate) fn has_group(&self, name: &str) -> bool {
        self.regex.capture_names().flatten().any(|n| n == name)
    }
}

/// How to choose among candidates that share the winning priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Last occurrence in reading order.
    #[default]
    LastMatch,
    /// First occurrence in reading order.
    FirstMatch,
    /// Most frequent value; equal counts go to the value seen last.
    MostFrequent,
}

impl TieBreak {
    /// Pick one candidate. `candidates` must already be in reading order.
    fn select(self, mut candidates: Vec<FieldMatch>) -> Option<FieldMatch> {
        match self {
            TieBreak::LastMatch => candidates.pop(),
            TieBreak::FirstMatch => candidates.into_iter().next(),
            TieBreak::MostFrequent => {
                let mut counts: HashMap<&str, usize> = HashMap::new();
                for c in &candidates {
                    *counts.entry(c.value.as_str()).or_default() += 1;
                }
                let best = counts.values().copied().max()?;
                let winner = candidates
                    .iter()
                    .rposition(|c| counts.get(c.value.as_str()) == Some(&best))?;
                Some(candidates.swap_remove(winner))
            }
        }
    }
}

impl FromStr for TieBreak {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "last-match" => Ok(TieBreak::LastMatch),
            "first" | "first-match" => Ok(TieBreak::FirstMatch),
            "most-frequent" | "frequent" => Ok(TieBreak::MostFrequent),
            other => Err(ExtractError::InvalidTieBreak(other.to_string())),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TieBreak::LastMatch => "last",
            TieBreak::FirstMatch => "first",
            TieBreak::MostFrequent => "most-frequent",
        })
    }
}

/// Inclusive numeric bounds a count candidate must satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
    /// Reject bare four-digit integers between 1900 and 2100.
    pub reject_year_like: bool,
}

impl PlausibleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            reject_year_like: false,
        }
    }

    pub const fn rejecting_years(mut self) -> Self {
        self.reject_year_like = true;
        self
    }

    /// `raw` is the number as written, `value` its parsed form.
    pub fn accepts(&self, raw: &str, value: f64) -> bool {
        if value < self.min || value > self.max {
            return false;
        }
        !(self.reject_year_like && is_year_like(raw))
    }
}

fn is_year_like(raw: &str) -> bool {
    raw.len() == 4
        && raw.bytes().all(|b| b.is_ascii_digit())
        && raw
            .parse::<u32>()
            .is_ok_and(|y| (1900..=2100).contains(&y))
}

/// What a match turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Area expression: value is the literal text from `num` to the end of `unit`.
    Area,
    /// Integer count: value is `num` with thousands separators removed.
    Count,
}

/// Parse a count written with optional thousands separators (`1,761`, `24.594`).
///
/// A separator is only accepted before a group of exactly three digits, so
/// `2.5` is not a count.
pub fn parse_count(raw: &str) -> Option<f64> {
    let mut groups = raw.split([',', '.']);
    let head = groups.next()?;
    if head.is_empty() || !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut digits = head.to_string();
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }
    digits.parse::<f64>().ok()
}

/// Render a number as an integer string when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// A set of patterns plus the policy that picks a single winner.
#[derive(Debug, Clone)]
pub struct Cascade {
    patterns: Vec<Pattern>,
    kind: ValueKind,
    tie_break: TieBreak,
    range: Option<PlausibleRange>,
}

impl Cascade {
    pub fn new(patterns: Vec<Pattern>, kind: ValueKind) -> Self {
        Self {
            patterns,
            kind,
            tie_break: TieBreak::default(),
            range: None,
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_range(mut self, range: PlausibleRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Every accepted candidate, in reading order.
    pub fn candidates(&self, text: &str) -> Vec<FieldMatch> {
        let mut out = Vec::new();
        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(text) {
                if let Some(candidate) = self.candidate(pattern, &caps, text) {
                    out.push(candidate);
                }
            }
        }
        out.sort_by_key(|c| c.span.start);
        out
    }

    /// Run the cascade and return the winning candidate, if any.
    pub fn run(&self, text: &str) -> Option<FieldMatch> {
        let candidates = self.candidates(text);
        let top = candidates.iter().map(|c| c.priority).max()?;
        let finalists: Vec<FieldMatch> = candidates
            .into_iter()
            .filter(|c| c.priority == top)
            .collect();
        let finalist_count = finalists.len();
        let winner = self.tie_break.select(finalists)?;
        tracing::debug!(
            pattern = %winner.pattern,
            priority = winner.priority,
            value = %winner.value,
            finalists = finalist_count,
            tie_break = %self.tie_break,
            "cascade selected candidate"
        );
        Some(winner)
    }

    fn candidate(&self, pattern: &Pattern, caps: &Captures<'_>, text: &str) -> Option<FieldMatch> {
        let whole = caps.get(0)?;
        let num = caps.name("num")?;
        if starts_mid_number(text, num.start()) {
            return None;
        }
        let mut source = whole.as_str().to_string();
        let value = match self.kind {
            ValueKind::Area => {
                let end = caps
                    .name("unit")
                    .map_or(whole.end(), |u| u.end())
                    .max(num.end());
                let stated = text.get(num.start()..end)?.trim();
                match caps.name("units") {
                    Some(units) => {
                        let count = parse_count(units.as_str())?;
                        let per_unit = crate::units::per_unit_area(stated, count)?;
                        let divisor = text.get(units.start()..whole.end())?;
                        source = format!("[Inferred: {stated} / {divisor}] {source}");
                        per_unit.to_string()
                    }
                    None => stated.to_string(),
                }
            }
            ValueKind::Count => {
                let parsed = parse_count(num.as_str())?;
                if let Some(range) = &self.range
                    && !range.accepts(num.as_str(), parsed)
                {
                    return None;
                }
                format_number(parsed)
            }
        };
        Some(FieldMatch {
            value,
            source,
            span: whole.range(),
            priority: pattern.priority,
            pattern: pattern.label.clone(),
        })
    }
}

/// True when `start` sits right after `<digit><separator>`, i.e. the match
/// would begin in the tail of a longer number.
fn starts_mid_number(text: &str, start: usize) -> bool {
    let before = &text.as_bytes()[..start];
    matches!(before, [.., d, b',' | b'.'] if d.is_ascii_digit())
}
