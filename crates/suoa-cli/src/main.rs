use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use suoa_core::config_file::{self, ConfigFile, ExtractionConfig, OutputConfig, RangeConfig};
use suoa_core::{Document, Field};
use suoa_extract::{ExtractorConfig, ExtractorConfigBuilder, FieldExtractor, PlausibleRange};
use suoa_ingest::{BatchOptions, ProgressEvent};
use suoa_reporting::{CoverageSummary, ExportFormat};

mod output;

use output::ColorMode;

/// SUoA extractor - pull spatial units of analysis out of crime location choice studies
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); SUOA_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract unit name, size, unit count and incident count from every study in a directory
    Extract {
        /// Directory containing .pdf or .txt studies
        dir: PathBuf,

        /// Output file (default: suoa_results.<ext> in the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv, json or markdown
        #[arg(long)]
        format: Option<String>,

        /// Also write a methodology table next to the results
        #[arg(long)]
        methodology: bool,

        /// Extra config file layered over the platform and ./.suoa.toml configs
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dry run on one file: list every candidate per field and the value selected
    Scan {
        /// Path to the .pdf or .txt study
        file_path: PathBuf,

        /// Search the whole text instead of the relevant sections
        #[arg(long)]
        full_text: bool,

        /// Extra config file layered over the platform and ./.suoa.toml configs
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Write a config file populated with the built-in defaults
    InitConfig {
        /// Destination (default: the platform config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("SUOA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Extract {
            dir,
            output,
            format,
            methodology,
            config,
            no_color,
        } => extract(dir, output, format, methodology, config, no_color),
        Command::Scan {
            file_path,
            full_text,
            config,
            no_color,
        } => scan(&file_path, full_text, config, no_color),
        Command::InitConfig { path, force } => init_config(path, force),
    }
}

/// Platform config, then `./.suoa.toml`, then `--config`.
fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let mut config = config_file::load_config();
    tracing::debug!(
        platform = ?config_file::config_path(),
        "loaded platform and local config"
    );
    if let Some(path) = explicit {
        tracing::info!(path = %path.display(), "layering explicit config");
        config = config_file::merge(config, config_file::load_required(path)?);
    }
    Ok(config)
}

fn build_extractor(config: &ConfigFile, full_text: bool) -> anyhow::Result<FieldExtractor> {
    let extraction = config.extraction.clone().unwrap_or_default();
    let extractor_config = ExtractorConfigBuilder::from_config(&extraction)?
        .use_relevance(!full_text)
        .build()?;
    Ok(FieldExtractor::with_config(extractor_config))
}

fn extract(
    dir: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
    methodology: bool,
    config_path: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    let config = resolve_config(config_path.as_deref())?;
    let out_config = config.output.clone().unwrap_or_default();

    // CLI flags > config file > defaults
    let format: ExportFormat = match format.or(out_config.format) {
        Some(f) => f.parse()?,
        None => ExportFormat::default(),
    };
    let methodology = methodology || out_config.methodology.unwrap_or(false);
    let output_path = output.unwrap_or_else(|| {
        let dir = out_config
            .directory
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("suoa_results.{}", format.extension()))
    });

    let extractor = build_extractor(&config, false)?;
    let paths = suoa_ingest::discover_documents(&dir)?;
    tracing::info!(
        dir = %dir.display(),
        documents = paths.len(),
        output = %output_path.display(),
        %format,
        methodology,
        "extracting"
    );

    let color = ColorMode(!no_color);
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let progress_cb = |event: ProgressEvent| {
        if let ProgressEvent::Started { filename, .. } = &event {
            bar.set_message(filename.clone());
            return;
        }
        let mut line = Vec::new();
        if output::print_progress(&mut line, &event, color).is_ok() {
            bar.println(String::from_utf8_lossy(&line).trim_end());
        }
        bar.inc(1);
    };

    let batch = suoa_ingest::run_batch(
        &paths,
        &extractor,
        BatchOptions { methodology },
        progress_cb,
    );
    bar.finish_and_clear();

    suoa_reporting::export_records(&batch.records, format, &output_path)?;
    if methodology {
        let path = suoa_reporting::methodology_path(&output_path);
        tracing::debug!(path = %path.display(), "methodology table path");
        suoa_reporting::export_methodology(&batch.methodology, &path)?;
    }

    let summary = CoverageSummary::from_records(&batch.records);
    let mut stdout = std::io::stdout();
    output::print_summary(&mut stdout, &summary, &output_path, color)?;
    Ok(())
}

fn scan(
    file_path: &Path,
    full_text: bool,
    config_path: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let config = resolve_config(config_path.as_deref())?;
    let extractor = build_extractor(&config, full_text)?;
    let color = ColorMode(!no_color);
    let mut w = std::io::stdout();

    let document: Document = suoa_ingest::load_document(file_path)?;
    let text = extractor.search_text(&document.text);
    tracing::debug!(
        file = %file_path.display(),
        full_text,
        searched_chars = text.len(),
        "scanning"
    );
    output::print_scan_header(
        &mut w,
        &document.filename,
        document.text.len(),
        text.len(),
        color,
    )?;

    for field in Field::ALL {
        let candidates = extractor.candidates(field, &text);
        let winner = match field {
            Field::UnitName => Some(extractor.unit_name(&text)).filter(|n| !n.is_empty()),
            Field::UnitSize => extractor.unit_size(&text).map(|m| {
                match suoa_extract::units::to_km2(&m.value) {
                    Some(km2) => format!("{} ({km2} km²)", m.value),
                    None => m.value,
                }
            }),
            Field::UnitCount => extractor.unit_count(&text).map(|m| m.value),
            Field::IncidentCount => extractor.incident_count(&text).map(|m| m.value),
        };
        output::print_candidates(&mut w, field, &candidates, winner.as_deref(), color)?;
    }
    w.flush()?;
    Ok(())
}

fn range_config(range: PlausibleRange) -> RangeConfig {
    RangeConfig {
        min: range.min as u64,
        max: range.max as u64,
    }
}

/// A config file spelling out every scalar default.
fn default_config_file() -> ConfigFile {
    let defaults = ExtractorConfig::default();
    ConfigFile {
        extraction: Some(ExtractionConfig {
            extra_keywords: Some(Vec::new()),
            min_sections: Some(defaults.min_sections()),
            max_sections: Some(defaults.max_sections()),
            unit_count_range: Some(range_config(defaults.unit_count_range())),
            incident_count_range: Some(range_config(defaults.incident_count_range())),
            variable_count_range: Some(range_config(defaults.variable_count_range())),
            size_tie_break: Some(defaults.size_tie_break().to_string()),
            count_tie_break: Some(defaults.count_tie_break().to_string()),
            max_candidate_words: Some(defaults.max_candidate_words()),
            ..Default::default()
        }),
        output: Some(OutputConfig {
            format: Some(ExportFormat::default().to_string()),
            directory: Some(".".to_string()),
            methodology: Some(false),
        }),
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path.or_else(config_file::config_path) {
        Some(p) => p,
        None => anyhow::bail!("Could not determine a config directory; pass a path"),
    };
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    config_file::save_config(&default_config_file(), &path)?;
    tracing::info!(path = %path.display(), force, "wrote default config");
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_extract_flags() {
        let cli = Cli::parse_from([
            "suoa",
            "-vv",
            "extract",
            "studies",
            "-o",
            "out.json",
            "--format",
            "json",
            "--methodology",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Extract {
                dir,
                output,
                format,
                methodology,
                ..
            } => {
                assert_eq!(dir, PathBuf::from("studies"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert_eq!(format.as_deref(), Some("json"));
                assert!(methodology);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn init_config_then_resolve_explicit_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suoa.toml");
        init_config(Some(path.clone()), false).unwrap();
        assert!(init_config(Some(path.clone()), false).is_err());
        init_config(Some(path.clone()), true).unwrap();

        let config = resolve_config(Some(&path)).unwrap();
        let output = config.output.unwrap();
        assert_eq!(output.format.as_deref(), Some("csv"));
        assert!(resolve_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn default_config_file_builds_an_extractor() {
        let config = default_config_file();
        let extractor = build_extractor(&config, false).unwrap();
        assert_eq!(extractor.config().max_sections(), 10);
        assert_eq!(
            extractor.config().unit_count_range(),
            ExtractorConfig::default().unit_count_range()
        );
    }
}
