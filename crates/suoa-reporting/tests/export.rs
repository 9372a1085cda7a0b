use suoa_core::{ExtractedRecord, FieldMatch, MethodologyRecord};
use suoa_reporting::{
    ExportFormat, export_methodology, export_records, methodology_path, write_records,
};

fn found(value: &str, source: &str, pattern: &str) -> Option<FieldMatch> {
    Some(FieldMatch {
        value: value.into(),
        source: source.into(),
        span: 0..source.len(),
        priority: 50,
        pattern: pattern.into(),
    })
}

fn sample_records() -> Vec<ExtractedRecord> {
    vec![
        ExtractedRecord {
            file_id: "S01".into(),
            filename: "S01_burglary, Brisbane.pdf".into(),
            unit_name: "Census tract".into(),
            unit_size: found("0.5 ha", "an average size of 0.5 ha", "number_first_average"),
            unit_size_km2: Some(0.005),
            unit_count: found("142", "Total of 142 tracts", "total_of_units"),
            incident_count: found("1761", "1,761 burglary incidents", "number_then_incidents"),
            error: None,
        },
        ExtractedRecord::failed("S02_broken.pdf", "failed to open document: \"bad\" xref"),
    ]
}

#[test]
fn csv_has_fixed_header_and_escapes_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/results.csv");
    export_records(&sample_records(), ExportFormat::Csv, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "file_id,filename,unit_name,unit_size,unit_size_km2,unit_count,incident_count,\
         unit_size_source,unit_count_source,incident_count_source,error"
    );
    assert!(text.contains("\"S01_burglary, Brisbane.pdf\""));
    assert!(text.contains("\"1,761 burglary incidents\""));
    assert!(text.contains("\"failed to open document: \"\"bad\"\" xref\""));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "S01_burglary, Brisbane.pdf");
    assert_eq!(&rows[0][4], "0.005");
    assert_eq!(&rows[0][6], "1761");
    assert_eq!(&rows[1][0], "S02");
    assert_eq!(&rows[1][3], "");
    assert_eq!(&rows[1][10], "failed to open document: \"bad\" xref");
}

#[test]
fn json_nests_matches_and_summary() {
    let mut out = Vec::new();
    write_records(&mut out, &sample_records(), ExportFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["summary"]["complete"], 1);
    let first = &json["records"][0];
    assert_eq!(first["unit_count"]["value"], "142");
    assert_eq!(first["unit_count"]["pattern"], "total_of_units");
    assert!(json["records"][1]["unit_size"].is_null());
}

#[test]
fn methodology_csv_lands_beside_results() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.csv");
    let path = methodology_path(&results);
    let rows = vec![MethodologyRecord {
        file_id: "S03".into(),
        filename: "S03_choice.pdf".into(),
        statistical_method: "Mixed Logit, Latent Class".into(),
        number_of_variables: Some(8),
        text_length: 1200,
        ..Default::default()
    }];
    export_methodology(&rows, &path).unwrap();

    let text = std::fs::read_to_string(dir.path().join("results_methodology.csv")).unwrap();
    assert!(text.starts_with("file_id,filename,statistical_method,"));
    assert!(text.contains("S03,S03_choice.pdf,\"Mixed Logit, Latent Class\",,8,,,,,1200"));
}
