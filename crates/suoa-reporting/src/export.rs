use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use suoa_core::{ExtractedRecord, FieldMatch, MethodologyRecord};

use crate::{CoverageSummary, ExportError, ExportFormat};

pub const RECORD_COLUMNS: [&str; 11] = [
    "file_id",
    "filename",
    "unit_name",
    "unit_size",
    "unit_size_km2",
    "unit_count",
    "incident_count",
    "unit_size_source",
    "unit_count_source",
    "incident_count_source",
    "error",
];

pub const METHODOLOGY_COLUMNS: [&str; 10] = [
    "file_id",
    "filename",
    "statistical_method",
    "alternative_sampling",
    "number_of_variables",
    "sample_size_occasions",
    "scale_justification",
    "software_used",
    "convergence",
    "text_length",
];

/// Write `records` to `path` in the given format, creating parent
/// directories as needed.
pub fn export_records(
    records: &[ExtractedRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let file = create(path)?;
    write_records(file, records, format)?;
    tracing::info!(path = %path.display(), records = records.len(), %format, "wrote results");
    Ok(())
}

/// Methodology rows always go out as CSV.
pub fn export_methodology(records: &[MethodologyRecord], path: &Path) -> Result<(), ExportError> {
    let file = create(path)?;
    write_methodology_csv(file, records)?;
    tracing::info!(path = %path.display(), records = records.len(), "wrote methodology");
    Ok(())
}

/// Sibling path for the methodology table: `out/results.csv` becomes
/// `out/results_methodology.csv`.
pub fn methodology_path(results: &Path) -> PathBuf {
    let stem = results
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "results".to_string());
    results.with_file_name(format!("{stem}_methodology.csv"))
}

fn create(path: &Path) -> Result<std::fs::File, ExportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(std::fs::File::create(path)?)
}

pub fn write_records(
    w: impl Write,
    records: &[ExtractedRecord],
    format: ExportFormat,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => write_csv(w, records),
        ExportFormat::Json => write_json(w, records),
        ExportFormat::Markdown => write_markdown(w, records),
    }
}

fn value(m: &Option<FieldMatch>) -> &str {
    m.as_ref().map(|m| m.value.as_str()).unwrap_or("")
}

fn source(m: &Option<FieldMatch>) -> &str {
    m.as_ref().map(|m| m.source.as_str()).unwrap_or("")
}

fn opt_num<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn write_csv(w: impl Write, records: &[ExtractedRecord]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(w);
    writer.write_record(RECORD_COLUMNS)?;
    for r in records {
        let km2 = opt_num(r.unit_size_km2);
        writer.write_record([
            r.file_id.as_str(),
            r.filename.as_str(),
            r.unit_name.as_str(),
            value(&r.unit_size),
            km2.as_str(),
            value(&r.unit_count),
            value(&r.incident_count),
            source(&r.unit_size),
            source(&r.unit_count),
            source(&r.incident_count),
            r.error.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_methodology_csv(
    w: impl Write,
    records: &[MethodologyRecord],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(w);
    writer.write_record(METHODOLOGY_COLUMNS)?;
    for r in records {
        let variables = opt_num(r.number_of_variables);
        let occasions = opt_num(r.sample_size_occasions);
        let text_length = r.text_length.to_string();
        writer.write_record([
            r.file_id.as_str(),
            r.filename.as_str(),
            r.statistical_method.as_str(),
            r.alternative_sampling.as_str(),
            variables.as_str(),
            occasions.as_str(),
            r.scale_justification.as_str(),
            r.software_used.as_str(),
            r.convergence.as_str(),
            text_length.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    file_id: &'a str,
    filename: &'a str,
    unit_name: &'a str,
    unit_size: Option<&'a FieldMatch>,
    unit_size_km2: Option<f64>,
    unit_count: Option<&'a FieldMatch>,
    incident_count: Option<&'a FieldMatch>,
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: CoverageSummary,
    records: Vec<JsonRecord<'a>>,
}

fn write_json(mut w: impl Write, records: &[ExtractedRecord]) -> Result<(), ExportError> {
    let report = JsonReport {
        summary: CoverageSummary::from_records(records),
        records: records
            .iter()
            .map(|r| JsonRecord {
                file_id: &r.file_id,
                filename: &r.filename,
                unit_name: &r.unit_name,
                unit_size: r.unit_size.as_ref(),
                unit_size_km2: r.unit_size_km2,
                unit_count: r.unit_count.as_ref(),
                incident_count: r.incident_count.as_ref(),
                error: r.error.as_deref(),
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut w, &report)?;
    writeln!(w)?;
    Ok(())
}

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn write_markdown(mut w: impl Write, records: &[ExtractedRecord]) -> Result<(), ExportError> {
    let s = CoverageSummary::from_records(records);
    writeln!(w, "# SUoA Extraction Results\n")?;
    writeln!(
        w,
        "{} documents, {} failed, {} with all four fields.\n",
        s.total, s.failed, s.complete
    )?;
    writeln!(
        w,
        "| File | Unit name | Unit size | km² | Units | Incidents | Error |"
    )?;
    writeln!(w, "|---|---|---|---|---|---|---|")?;
    for r in records {
        writeln!(
            w,
            "| {} | {} | {} | {} | {} | {} | {} |",
            md_escape(&r.filename),
            md_escape(&r.unit_name),
            md_escape(value(&r.unit_size)),
            opt_num(r.unit_size_km2),
            value(&r.unit_count),
            value(&r.incident_count),
            md_escape(r.error.as_deref().unwrap_or("")),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methodology_path_is_sibling() {
        assert_eq!(
            methodology_path(Path::new("out/results.csv")),
            PathBuf::from("out/results_methodology.csv")
        );
        assert_eq!(
            methodology_path(Path::new("results.json")),
            PathBuf::from("results_methodology.csv")
        );
    }

    #[test]
    fn markdown_escapes_pipes() {
        let records = vec![ExtractedRecord::failed("S09_a|b.pdf", "bad | xref")];
        let mut out = Vec::new();
        write_records(&mut out, &records, ExportFormat::Markdown).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("S09_a\\|b.pdf"));
        assert!(text.contains("bad \\| xref"));
        assert!(text.contains("1 documents, 1 failed"));
    }

    #[test]
    fn empty_csv_still_has_header() {
        let mut out = Vec::new();
        write_records(&mut out, &[], ExportFormat::Csv).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", RECORD_COLUMNS.join(","))
        );
    }
}
