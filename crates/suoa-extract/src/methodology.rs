//! Keyword and count heuristics describing how a discrete-choice study was
//! modelled: estimator family, alternative sampling, model size, software.

use once_cell::sync::Lazy;
use regex::Regex;
use suoa_core::{Document, MethodologyRecord};

use crate::cascade::{Cascade, Pattern, PlausibleRange, TieBreak, ValueKind};
use crate::text_processing::{contains_phrase, title_case};

const NOT_CLEAR: &str = "Not Clear";

static METHOD_FAMILIES: &[(&str, &[&str])] = &[
    (
        "multinomial logit",
        &[
            "multinomial logit",
            "conditional logit",
            "mcfadden",
            "discrete choice model",
            "choice model",
            "multinomial choice",
        ],
    ),
    (
        "mixed logit",
        &[
            "mixed logit",
            "random parameter",
            "random coefficient",
            "random effects logit",
            "unobserved heterogeneity",
            "mixed multinomial",
            "random parameter logit",
        ],
    ),
    (
        "latent class",
        &[
            "latent class",
            "finite mixture",
            "discrete mixture",
            "heterogeneous preferences",
            "preference heterogeneity",
            "class membership",
        ],
    ),
    (
        "nested logit",
        &[
            "nested logit",
            "hierarchical logit",
            "tree structure",
            "nesting structure",
        ],
    ),
    (
        "other",
        &[
            "probit",
            "ordered logit",
            "binary logit",
            "logistic regression",
            "regression analysis",
        ],
    ),
];

static SAMPLING_FAMILIES: &[(&str, &[&str])] = &[
    (
        "importance sampling",
        &["importance sampling", "biased sampling", "weighted sampling"],
    ),
    (
        "random sampling",
        &[
            "random sampling",
            "randomly sampled",
            "random subset",
            "random sample of alternatives",
            "randomly selected alternatives",
            "random selection of",
            "randomly chosen alternatives",
        ],
    ),
    (
        "stratified sampling",
        &["stratified sampling", "stratified sample", "stratification"],
    ),
    (
        "none",
        &[
            "full choice set",
            "complete choice set",
            "all alternatives",
            "entire choice set",
            "complete set of alternatives",
            "all possible alternatives",
            "entire set of",
        ],
    ),
];

static SOFTWARE: &[(&str, &[&str])] = &[
    (
        "R",
        &[
            "r software",
            "r statistical",
            "r package",
            "r environment",
            "r core team",
            "cran",
        ],
    ),
    ("Stata", &["stata"]),
    ("Python", &["python"]),
    ("SAS", &["sas"]),
    ("SPSS", &["spss"]),
    ("Biogeme", &["biogeme", "pythonbiogeme"]),
    ("NLOGIT", &["nlogit", "n-logit"]),
    ("LIMDEP", &["limdep"]),
];

static CONVERGENCE_TERMS: &[&str] = &[
    "convergence",
    "converged",
    "iteration",
    "iterations",
    "maximum likelihood",
    "optimization",
    "numerical issues",
    "estimation problems",
];

static JUSTIFICATION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"scale.*?(?:justif|reason|rationale|chose|select)",
        r"(?:unit|spatial).*?(?:size|scale).*?(?:justif|reason|chose|select)",
        r"spatial.*?resolution.*?(?:justif|reason|chose|select)",
        r"aggregation.*?level.*?(?:justif|reason|chose|select)",
        r"grid.*?size.*?(?:justif|reason|chose|select)",
        r"(?:why|because).*?(?:unit|scale|size)",
        r"methodolog.*?(?:scale|unit|size)",
        r"theoretical.*?(?:scale|unit|size)",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("built-in pattern must compile"))
    .collect()
});

const NUM: &str = r"\b(?P<num>\d{1,3}(?:,\d{3})+|\d+)";

fn builtin(pattern: String, label: &str) -> Pattern {
    Pattern::new(&pattern, 10, label).expect("built-in pattern must compile")
}

static VARIABLE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        builtin(
            format!(r"(?i){NUM}\s*(?:independent\s+|explanatory\s+|predictor\s+)?variables?\b"),
            "n_variables",
        ),
        builtin(format!(r"(?i){NUM}\s*covariates?\b"), "n_covariates"),
        builtin(format!(r"(?i){NUM}\s*predictors?\b"), "n_predictors"),
        builtin(format!(r"(?i){NUM}\s*factors?\b"), "n_factors"),
        builtin(
            format!(r"(?i)\bmodel\s*(?:with|including|contains?)\s*{NUM}\s*variables?"),
            "model_with_n",
        ),
        builtin(
            format!(r"(?i)\bregression\s*(?:with|including)\s*{NUM}\s*variables?"),
            "regression_with_n",
        ),
    ]
});

static SAMPLE_SIZE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        builtin(format!(r"(?i){NUM}\s*(?:choice\s*)?occasions?\b"), "n_occasions"),
        builtin(format!(r"(?i){NUM}\s*observations?\b"), "n_observations"),
        builtin(format!(r"(?i){NUM}\s*(?:choice\s*)?sets?\b"), "n_choice_sets"),
        builtin(format!(r"(?i){NUM}\s*decisions?\b"), "n_decisions"),
        builtin(format!(r"(?i){NUM}\s*choices?\b"), "n_choices"),
        builtin(format!(r"(?i)\bn\s*=\s*{NUM}"), "n_equals"),
        builtin(format!(r"(?i)\bsample\s*(?:of|size)\s*{NUM}"), "sample_of_n"),
        builtin(format!(r"(?i){NUM}\s*cases?\b"), "n_cases"),
    ]
});

static CHOICE_SET_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        builtin(
            format!(r"(?i){NUM}\s*(?:alternatives|choices|options|choice\s*alternatives)"),
            "n_alternatives",
        ),
        builtin(
            format!(r"(?i)\bchoice\s*set\s*(?:of|with|containing)\s*{NUM}"),
            "choice_set_of_n",
        ),
        builtin(
            format!(r"(?i){NUM}\s*possible\s*(?:locations|sites|alternatives)"),
            "n_possible",
        ),
        builtin(
            format!(r"(?i){NUM}\s*candidate\s*(?:locations|sites|alternatives)"),
            "n_candidate",
        ),
    ]
});

/// Extracts a [`MethodologyRecord`] from full document text.
#[derive(Debug, Clone)]
pub struct MethodologyExtractor {
    variables: Cascade,
    sample_size: Cascade,
    choice_set: Cascade,
}

impl Default for MethodologyExtractor {
    fn default() -> Self {
        Self::new(PlausibleRange::new(3.0, 100.0))
    }
}

impl MethodologyExtractor {
    pub fn new(variable_range: PlausibleRange) -> Self {
        Self {
            variables: Cascade::new(VARIABLE_PATTERNS.clone(), ValueKind::Count)
                .with_tie_break(TieBreak::MostFrequent)
                .with_range(variable_range),
            sample_size: Cascade::new(SAMPLE_SIZE_PATTERNS.clone(), ValueKind::Count)
                .with_tie_break(TieBreak::MostFrequent)
                .with_range(PlausibleRange::new(50.0, 1_000_000.0)),
            choice_set: Cascade::new(CHOICE_SET_PATTERNS.clone(), ValueKind::Count)
                .with_range(PlausibleRange::new(10.0, 100_000.0)),
        }
    }

    pub fn extract(&self, document: &Document) -> MethodologyRecord {
        let lower = document.text.to_lowercase();
        MethodologyRecord {
            file_id: document.file_id.clone(),
            filename: document.filename.clone(),
            statistical_method: statistical_method(&lower),
            alternative_sampling: self.alternative_sampling(&lower),
            number_of_variables: self.number_of_variables(&document.text),
            sample_size_occasions: self.sample_size(&document.text),
            scale_justification: scale_justification(&document.text).to_string(),
            software_used: software_used(&lower),
            convergence: convergence(&lower).to_string(),
            text_length: document.text.chars().count(),
        }
    }

    /// Explicit sampling vocabulary, else a guess from the largest choice-set
    /// size mentioned.
    pub fn alternative_sampling(&self, lower: &str) -> String {
        for (family, phrases) in SAMPLING_FAMILIES {
            if phrases.iter().any(|p| contains_phrase(lower, p)) {
                return title_case(family);
            }
        }

        let largest = self
            .choice_set
            .candidates(lower)
            .iter()
            .filter_map(|c| c.value.parse::<u64>().ok())
            .max();
        match largest {
            Some(n) if n > 1000 => "Likely Sampled (Large Choice Set)".to_string(),
            Some(n) if n <= 100 => "Likely No Sampling (Small Choice Set)".to_string(),
            _ => NOT_CLEAR.to_string(),
        }
    }

    pub fn number_of_variables(&self, text: &str) -> Option<u64> {
        self.variables.run(text)?.value.parse().ok()
    }

    pub fn sample_size(&self, text: &str) -> Option<u64> {
        self.sample_size.run(text)?.value.parse().ok()
    }
}

/// Every estimator family mentioned, title-cased and comma-joined.
pub fn statistical_method(lower: &str) -> String {
    let detected: Vec<String> = METHOD_FAMILIES
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|p| contains_phrase(lower, p)))
        .map(|(family, _)| title_case(family))
        .collect();
    if detected.is_empty() {
        NOT_CLEAR.to_string()
    } else {
        detected.join(", ")
    }
}

pub fn software_used(lower: &str) -> String {
    let detected: Vec<&str> = SOFTWARE
        .iter()
        .filter(|(_, names)| names.iter().any(|n| contains_phrase(lower, n)))
        .map(|(name, _)| *name)
        .collect();
    if detected.is_empty() {
        "Not Specified".to_string()
    } else {
        detected.join(", ")
    }
}

pub fn scale_justification(text: &str) -> &'static str {
    if JUSTIFICATION_RES.iter().any(|re| re.is_match(text)) {
        "Yes"
    } else {
        "No"
    }
}

pub fn convergence(lower: &str) -> &'static str {
    if CONVERGENCE_TERMS.iter().any(|t| contains_phrase(lower, t)) {
        "Mentioned"
    } else {
        "Not Reported"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_method_families() {
        assert_eq!(
            statistical_method("we estimate a conditional logit model"),
            "Multinomial Logit"
        );
        assert_eq!(
            statistical_method("a mixed logit and a latent class model"),
            "Mixed Logit, Latent Class"
        );
        assert_eq!(statistical_method("descriptive statistics only"), NOT_CLEAR);
    }

    #[test]
    fn sampling_vocabulary_wins_over_choice_set_size() {
        let m = MethodologyExtractor::default();
        assert_eq!(
            m.alternative_sampling("we used random sampling from 24,594 alternatives"),
            "Random Sampling"
        );
        assert_eq!(
            m.alternative_sampling("the choice set contains 24,594 alternatives"),
            "Likely Sampled (Large Choice Set)"
        );
        assert_eq!(
            m.alternative_sampling("each offender faces 85 alternatives"),
            "Likely No Sampling (Small Choice Set)"
        );
        assert_eq!(m.alternative_sampling("nothing to see"), NOT_CLEAR);
    }

    #[test]
    fn variable_count_is_most_frequent_in_range() {
        let m = MethodologyExtractor::default();
        let text = "We include 12 variables. Table 2 lists the 12 variables; 2 variables were dropped. Later, 200 variables.";
        assert_eq!(m.number_of_variables(text), Some(12));
        assert_eq!(m.number_of_variables("2 variables only"), None);
    }

    #[test]
    fn sample_size_ignores_small_numbers() {
        let m = MethodologyExtractor::default();
        let text = "Based on 12 cases and 3,452 choice occasions (n = 3,452).";
        assert_eq!(m.sample_size(text), Some(3452));
    }

    #[test]
    fn software_requires_whole_words() {
        assert_eq!(
            software_used("models were fitted in stata and biogeme"),
            "Stata, Biogeme"
        );
        assert_eq!(software_used("the basis for the model"), "Not Specified");
        assert_eq!(software_used("we used the r package mlogit"), "R");
    }

    #[test]
    fn justification_and_convergence() {
        assert_eq!(
            scale_justification("The spatial scale was chosen because offenders know blocks"),
            "Yes"
        );
        assert_eq!(scale_justification("Nothing relevant."), "No");
        assert_eq!(convergence("the model converged after 12 iterations"), "Mentioned");
        assert_eq!(convergence("estimates are reported"), "Not Reported");
    }

    #[test]
    fn extract_fills_record() {
        let doc = Document::new(
            "S03_choice.txt",
            "A conditional logit with 8 variables estimated in Stata on 1,200 choices.",
        );
        let rec = MethodologyExtractor::default().extract(&doc);
        assert_eq!(rec.file_id, "S03");
        assert_eq!(rec.statistical_method, "Multinomial Logit");
        assert_eq!(rec.number_of_variables, Some(8));
        assert_eq!(rec.sample_size_occasions, Some(1200));
        assert_eq!(rec.software_used, "Stata");
        assert_eq!(rec.text_length, doc.text.chars().count());
    }
}
