use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(#[from] std::io::Error),
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Relevance keywords; replaces the built-in list when set.
    pub keywords: Option<Vec<String>>,
    /// Relevance keywords appended to the built-in (or replaced) list.
    pub extra_keywords: Option<Vec<String>>,
    pub min_sections: Option<usize>,
    pub max_sections: Option<usize>,
    pub unit_count_range: Option<RangeConfig>,
    pub incident_count_range: Option<RangeConfig>,
    pub variable_count_range: Option<RangeConfig>,
    /// `last`, `first` or `most-frequent`.
    pub size_tie_break: Option<String>,
    pub count_tie_break: Option<String>,
    pub max_candidate_words: Option<usize>,
    pub extra_unit_size_patterns: Option<Vec<PatternConfig>>,
    pub extra_unit_count_patterns: Option<Vec<PatternConfig>>,
    pub extra_incident_count_patterns: Option<Vec<PatternConfig>>,
}

/// Inclusive numeric plausibility range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub min: u64,
    pub max: u64,
}

/// A user-supplied pattern. The regex must contain a `num` capture group;
/// unit-size patterns additionally need a `unit` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: String,
    pub priority: u32,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `csv`, `json` or `markdown`.
    pub format: Option<String>,
    pub directory: Option<String>,
    /// Also write the methodology table.
    pub methodology: Option<bool>,
}

/// Platform config directory path: `<config_dir>/suoa/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("suoa").join("config.toml"))
}

/// Load config by cascading CWD `.suoa.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".suoa.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Load a config the user pointed at explicitly; unlike [`load_from_path`],
/// a missing or malformed file is an error.
pub fn load_required(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn pick<T: Clone>(overlay: &Option<T>, base: &Option<T>) -> Option<T> {
    overlay.clone().or_else(|| base.clone())
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let be = base.extraction.unwrap_or_default();
    let oe = overlay.extraction.unwrap_or_default();
    let bo = base.output.unwrap_or_default();
    let oo = overlay.output.unwrap_or_default();

    ConfigFile {
        extraction: Some(ExtractionConfig {
            keywords: pick(&oe.keywords, &be.keywords),
            extra_keywords: pick(&oe.extra_keywords, &be.extra_keywords),
            min_sections: pick(&oe.min_sections, &be.min_sections),
            max_sections: pick(&oe.max_sections, &be.max_sections),
            unit_count_range: pick(&oe.unit_count_range, &be.unit_count_range),
            incident_count_range: pick(&oe.incident_count_range, &be.incident_count_range),
            variable_count_range: pick(&oe.variable_count_range, &be.variable_count_range),
            size_tie_break: pick(&oe.size_tie_break, &be.size_tie_break),
            count_tie_break: pick(&oe.count_tie_break, &be.count_tie_break),
            max_candidate_words: pick(&oe.max_candidate_words, &be.max_candidate_words),
            extra_unit_size_patterns: pick(
                &oe.extra_unit_size_patterns,
                &be.extra_unit_size_patterns,
            ),
            extra_unit_count_patterns: pick(
                &oe.extra_unit_count_patterns,
                &be.extra_unit_count_patterns,
            ),
            extra_incident_count_patterns: pick(
                &oe.extra_incident_count_patterns,
                &be.extra_incident_count_patterns,
            ),
        }),
        output: Some(OutputConfig {
            format: pick(&oo.format, &bo.format),
            directory: pick(&oo.directory, &bo.directory),
            methodology: pick(&oo.methodology, &bo.methodology),
        }),
    }
}

/// Write a config to `path`, creating parent directories as needed.
pub fn save_config(config: &ConfigFile, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_round_trip_toml() {
        let config = ConfigFile {
            extraction: Some(ExtractionConfig {
                incident_count_range: Some(RangeConfig { min: 50, max: 500_000 }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.extraction.unwrap().incident_count_range,
            Some(RangeConfig { min: 50, max: 500_000 })
        );
    }

    #[test]
    fn partial_config_parses() {
        let toml_str = "[output]\nformat = \"json\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert!(parsed.extraction.is_none());
        assert_eq!(parsed.output.unwrap().format.as_deref(), Some("json"));
    }

    #[test]
    fn extra_patterns_parse() {
        let toml_str = r#"
[[extraction.extra_unit_count_patterns]]
pattern = '(?i)(?P<num>\d+)\s+barrios'
priority = 95
label = "barrios"
"#;
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let extra = parsed
            .extraction
            .unwrap()
            .extra_unit_count_patterns
            .unwrap();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].priority, 95);
        assert_eq!(extra[0].label.as_deref(), Some("barrios"));
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            extraction: Some(ExtractionConfig {
                max_sections: Some(10),
                size_tie_break: Some("last".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            extraction: Some(ExtractionConfig {
                max_sections: Some(4),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).extraction.unwrap();
        assert_eq!(merged.max_sections, Some(4));
        assert_eq!(merged.size_tie_break.as_deref(), Some("last"));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            output: Some(OutputConfig {
                directory: Some("/tmp/out".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.output.unwrap().directory.as_deref(), Some("/tmp/out"));
    }

    #[test]
    fn load_required_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[extraction\nmax_sections = ").unwrap();
        let err = load_required(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(load_from_path(&path).is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ConfigFile {
            output: Some(OutputConfig {
                methodology: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_required(&path).unwrap(), config);
    }
}
