use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use suoa_core::{ExtractedRecord, Field, FieldMatch};
use suoa_ingest::ProgressEvent;
use suoa_reporting::CoverageSummary;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn snippet(s: &str, max: usize) -> String {
    let flat: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

/// One-line description of what a record yielded.
fn found_fields(record: &ExtractedRecord) -> String {
    let mut parts = Vec::new();
    if !record.unit_name.is_empty() {
        parts.push(record.unit_name.clone());
    }
    if let Some(m) = &record.unit_size {
        parts.push(m.value.clone());
    }
    if let Some(m) = &record.unit_count {
        parts.push(format!("{} units", m.value));
    }
    if let Some(m) = &record.incident_count {
        parts.push(format!("{} incidents", m.value));
    }
    parts.join(", ")
}

/// Print a per-document progress line. `Started` events print nothing.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::Started { .. } => {}
        ProgressEvent::Extracted {
            index,
            total,
            record,
        } => {
            let found = record.found_count();
            let tally = format!("{found}/{} fields", Field::ALL.len());
            let details = found_fields(record);
            let details = if details.is_empty() {
                String::new()
            } else {
                format!(" ({details})")
            };
            if color.enabled() {
                let tally = match found {
                    4 => tally.green().to_string(),
                    0 => tally.red().to_string(),
                    _ => tally.yellow().to_string(),
                };
                writeln!(
                    w,
                    "[{}/{}] {} -> {}{}",
                    index + 1,
                    total,
                    record.filename.bold(),
                    tally,
                    details.dimmed()
                )?;
            } else {
                writeln!(
                    w,
                    "[{}/{}] {} -> {}{}",
                    index + 1,
                    total,
                    record.filename,
                    tally,
                    details
                )?;
            }
        }
        ProgressEvent::Failed {
            index,
            total,
            filename,
            error,
        } => {
            if color.enabled() {
                writeln!(
                    w,
                    "[{}/{}] {} -> {} {}",
                    index + 1,
                    total,
                    filename.bold(),
                    "FAILED:".red(),
                    error
                )?;
            } else {
                writeln!(w, "[{}/{}] {} -> FAILED: {}", index + 1, total, filename, error)?;
            }
        }
    }
    Ok(())
}

/// Print the coverage table after a batch.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &CoverageSummary,
    output: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "═══ SUoA EXTRACTION SUMMARY ═══".bold())?;
    } else {
        writeln!(w, "=== SUoA EXTRACTION SUMMARY ===")?;
    }
    writeln!(w, "Documents processed: {}", summary.total)?;
    if summary.failed > 0 {
        let line = format!("Text extraction failed: {}", summary.failed);
        if color.enabled() {
            writeln!(w, "{}", line.red())?;
        } else {
            writeln!(w, "{line}")?;
        }
    }
    for field in Field::ALL {
        writeln!(
            w,
            "  {:<16} {:>4} ({:.1}%)",
            format!("{field}:"),
            summary.count(field),
            summary.percent(field)
        )?;
    }
    writeln!(w, "  {:<16} {:>4}", "All four:", summary.complete)?;
    writeln!(w)?;
    writeln!(w, "Results written to {}", output.display())?;
    Ok(())
}

/// Header for `suoa scan`.
pub fn print_scan_header(
    w: &mut dyn Write,
    filename: &str,
    total_chars: usize,
    searched_chars: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "SCAN:".bold().cyan(), filename.bold())?;
    } else {
        writeln!(w, "SCAN: {filename}")?;
    }
    writeln!(
        w,
        "Searching {searched_chars} of {total_chars} characters after relevance windowing\n"
    )?;
    Ok(())
}

/// Every accepted candidate for one field, followed by the selected value.
pub fn print_candidates(
    w: &mut dyn Write,
    field: Field,
    candidates: &[FieldMatch],
    winner: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", field.to_string().bold())?;
    } else {
        writeln!(w, "{field}")?;
    }
    if candidates.is_empty() {
        writeln!(w, "  (no candidates)")?;
    }
    for c in candidates {
        writeln!(
            w,
            "  [{:>3}] {:<24} {:<16} \"{}\"",
            c.priority,
            c.pattern,
            c.value,
            snippet(&c.source, 70)
        )?;
    }
    match winner {
        Some(value) if color.enabled() => writeln!(w, "  => {}", value.green())?,
        Some(value) => writeln!(w, "  => {value}")?,
        None if color.enabled() => writeln!(w, "  => {}", "not found".dimmed())?,
        None => writeln!(w, "  => not found")?,
    }
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn progress_line_lists_found_fields() {
        let record = ExtractedRecord {
            filename: "S01_a.pdf".into(),
            unit_name: "Census tract".into(),
            unit_count: Some(FieldMatch {
                value: "142".into(),
                source: "Total of 142 tracts".into(),
                span: 0..19,
                priority: 60,
                pattern: "total_of_units".into(),
            }),
            ..Default::default()
        };
        let event = ProgressEvent::Extracted {
            index: 0,
            total: 3,
            record: Box::new(record),
        };
        let out = render(|w| print_progress(w, &event, ColorMode(false)));
        assert_eq!(
            out,
            "[1/3] S01_a.pdf -> 2/4 fields (Census tract, 142 units)\n"
        );
    }

    #[test]
    fn failures_are_reported_inline() {
        let event = ProgressEvent::Failed {
            index: 1,
            total: 2,
            filename: "S02_b.pdf".into(),
            error: "failed to open document: bad xref".into(),
        };
        let out = render(|w| print_progress(w, &event, ColorMode(false)));
        assert_eq!(
            out,
            "[2/2] S02_b.pdf -> FAILED: failed to open document: bad xref\n"
        );
    }

    #[test]
    fn empty_candidate_list_says_not_found() {
        let out = render(|w| print_candidates(w, Field::UnitSize, &[], None, ColorMode(false)));
        assert!(out.starts_with("Unit size\n  (no candidates)\n  => not found"));
    }

    #[test]
    fn snippet_flattens_and_truncates() {
        assert_eq!(snippet("a\n  b", 10), "a b");
        assert_eq!(snippet("abcdef", 3), "abc...");
    }
}
