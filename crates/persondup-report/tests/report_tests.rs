use persondup_analyze::{AnalyzeConfig, DuplicateAnalyzer, IdentityKey};
use persondup_report::{
    CsvSink, CsvSinkConfig, FallbackPolicy, ReportError, XlsxSink, run_partitioned,
    run_whole_tree,
};
use persondup_scan::{ScanConfig, TreeWalker};
use serde_json::json;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn declaration(first: &str, first_surname: &str, second_surname: &str) -> serde_json::Value {
    json!({
        "id": format!("{first}-{first_surname}"),
        "metadata": { "institucion": "SALUD", "actualizacion": "2024-02-01", "tipo": "INICIAL" },
        "declaracion": {
            "situacionPatrimonial": {
                "datosGenerales": {
                    "nombre": first,
                    "primerApellido": first_surname,
                    "segundoApellido": second_surname
                }
            }
        }
    })
}

fn write_json(path: &Path, value: &serde_json::Value) {
    fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
}

/// Two entities with duplicates and one without any.
fn create_source_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir(root.join("SALUD")).unwrap();
    for i in 0..3 {
        write_json(
            &root.join(format!("SALUD/ana_{i}.json")),
            &declaration("Ana", "Lopez", "Garcia"),
        );
    }
    write_json(&root.join("SALUD/bob.json"), &declaration("Bob", "Diaz", ""));

    fs::create_dir(root.join("IMSS NORTE")).unwrap();
    write_json(
        &root.join("IMSS NORTE/both.json"),
        &json!([declaration("Carla", "Ruiz", "Mora"), declaration("Carla", "Ruiz", "Mora")]),
    );

    fs::create_dir(root.join("UNIQUE")).unwrap();
    write_json(&root.join("UNIQUE/one.json"), &declaration("Dora", "Vega", "Soto"));

    temp
}

fn csv_config(dest: &Path, fallback: FallbackPolicy) -> CsvSinkConfig {
    CsvSinkConfig::builder()
        .destination(dest)
        .fallback(fallback)
        .timestamp("20240201_134502")
        .build()
        .unwrap()
}

#[test]
fn test_csv_round_trip_preserves_identity_counts() {
    let source = create_source_tree();
    let out = TempDir::new().unwrap();
    let config = ScanConfig::partitioned(source.path());
    let walker = TreeWalker::new();

    let sink = CsvSink::prepare(csv_config(out.path(), FallbackPolicy::Fail)).unwrap();
    let outcome = run_partitioned(&walker, &config, AnalyzeConfig::default(), sink).unwrap();
    assert!(!outcome.output.fell_back);
    assert!(outcome.failed_tables.is_empty());

    let partition = walker
        .list_partitions(&config)
        .unwrap()
        .into_iter()
        .find(|p| p.name == "SALUD")
        .unwrap();
    let scan = walker.scan_partition(&partition, &config);
    let expected: BTreeSet<(IdentityKey, usize)> = DuplicateAnalyzer::new()
        .analyze(&scan.batch.records)
        .rows
        .iter()
        .map(|row| (row.identity(), row.occurrence_count))
        .collect();

    let mut reader = csv::Reader::from_path(out.path().join("duplicates_SALUD.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[4], "occurrenceCount");

    let mut rows = 0;
    let mut actual = BTreeSet::new();
    for record in reader.records() {
        let record = record.unwrap();
        let count: usize = record[4].parse().unwrap();
        actual.insert((IdentityKey::new(&record[0], &record[1], &record[2]), count));
        rows += 1;
    }

    assert_eq!(rows, 3);
    assert_eq!(actual, expected);
}

#[test]
fn test_partitioned_csv_files_and_summary() {
    let source = create_source_tree();
    let out = TempDir::new().unwrap();

    let sink = CsvSink::prepare(csv_config(out.path(), FallbackPolicy::Fail)).unwrap();
    let outcome = run_partitioned(
        &TreeWalker::new(),
        &ScanConfig::partitioned(source.path()),
        AnalyzeConfig::default(),
        sink,
    )
    .unwrap();

    let mut names: Vec<String> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "duplicates_IMSS_NORTE.csv",
            "duplicates_SALUD.csv",
            "summary_duplicates_20240201_134502.csv",
        ]
    );

    let directories: Vec<&str> = outcome
        .summaries
        .iter()
        .map(|s| s.directory.as_str())
        .collect();
    assert_eq!(directories, vec!["SALUD", "IMSS NORTE", "UNIQUE"]);
    assert_eq!(outcome.totals.directories, 3);
    assert_eq!(outcome.totals.files, 6);
    assert_eq!(outcome.totals.records, 7);
    assert_eq!(outcome.totals.duplicate_rows, 5);

    let summary = fs::read_to_string(out.path().join("summary_duplicates_20240201_134502.csv"))
        .unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines[0], "directory,files,records,duplicateRows,duplicateIdentities");
    assert_eq!(lines[1], "SALUD,4,4,3,1");
    assert_eq!(lines[3], "UNIQUE,1,1,0,0");
}

#[test]
fn test_unwritable_destination_without_fallback() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "regular file").unwrap();
    let dest = blocker.join("reports");

    let result = CsvSink::prepare(csv_config(&dest, FallbackPolicy::Fail));
    match result {
        Err(ReportError::DestinationUnwritable { path, .. }) => assert_eq!(path, dest),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an unwritable destination"),
    }
}

#[test]
fn test_unwritable_destination_falls_back_to_temp() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "regular file").unwrap();

    let sink = CsvSink::prepare(csv_config(&blocker.join("reports"), FallbackPolicy::TempDir))
        .unwrap();
    assert!(sink.fell_back());
    assert_eq!(sink.directory(), std::env::temp_dir());
}

#[test]
fn test_partitioned_workbook() {
    let source = create_source_tree();
    let out = TempDir::new().unwrap();
    let path = out.path().join("report.xlsx");
    fs::write(&path, "stale").unwrap();

    let sink = XlsxSink::create_replacing(&path).unwrap();
    let outcome = run_partitioned(
        &TreeWalker::new(),
        &ScanConfig::partitioned(source.path()),
        AnalyzeConfig::default(),
        sink,
    )
    .unwrap();

    assert_eq!(outcome.output.files, vec![path.clone()]);
    assert!(fs::metadata(&path).unwrap().len() > 5);
}

#[test]
fn test_no_partitions_is_a_run_error() {
    let source = TempDir::new().unwrap();
    write_json(&source.path().join("a.json"), &declaration("Ana", "Lopez", "Garcia"));
    let out = TempDir::new().unwrap();

    let sink = XlsxSink::create(out.path().join("report.xlsx")).unwrap();
    let result = run_partitioned(
        &TreeWalker::new(),
        &ScanConfig::partitioned(source.path()),
        AnalyzeConfig::default(),
        sink,
    );
    assert!(matches!(result, Err(ReportError::Scan(_))));
}

#[test]
fn test_whole_tree_writes_into_directory() {
    let source = create_source_tree();
    let out = TempDir::new().unwrap();

    let outcome = run_whole_tree(
        &TreeWalker::new(),
        &ScanConfig::new(source.path()),
        AnalyzeConfig::default(),
        out.path(),
    )
    .unwrap();

    let expected = out.path().join("duplicates.xlsx");
    assert_eq!(outcome.output, Some(expected.clone()));
    assert!(expected.is_file());
    assert_eq!(outcome.report.row_count(), 5);
    assert_eq!(outcome.report.duplicate_identities, 2);
}

#[test]
fn test_whole_tree_without_duplicates_writes_nothing() {
    let source = TempDir::new().unwrap();
    write_json(&source.path().join("a.json"), &declaration("Ana", "Lopez", "Garcia"));
    write_json(&source.path().join("b.json"), &declaration("Bob", "Diaz", ""));
    let out = TempDir::new().unwrap();
    let dest = out.path().join("nested/report.xlsx");

    let outcome = run_whole_tree(
        &TreeWalker::new(),
        &ScanConfig::new(source.path()),
        AnalyzeConfig::default(),
        &dest,
    )
    .unwrap();

    assert!(outcome.output.is_none());
    assert!(outcome.report.is_empty());
    assert!(!dest.exists());
}

#[test]
fn test_directory_named_summary_keeps_summary_sheet() {
    let source = TempDir::new().unwrap();
    fs::create_dir(source.path().join("Summary")).unwrap();
    for i in 0..2 {
        write_json(
            &source.path().join(format!("Summary/ana_{i}.json")),
            &declaration("Ana", "Lopez", "Garcia"),
        );
    }
    let out = TempDir::new().unwrap();
    let path = out.path().join("report.xlsx");

    let sink = XlsxSink::create(&path).unwrap();
    let outcome = run_partitioned(
        &TreeWalker::new(),
        &ScanConfig::partitioned(source.path()),
        AnalyzeConfig::default(),
        sink,
    )
    .unwrap();

    assert_eq!(outcome.failed_tables, vec!["Summary".to_string()]);
    assert_eq!(outcome.totals.duplicate_rows, 2);
    assert_eq!(outcome.output.files, vec![path.clone()]);
    assert!(path.is_file());
}

#[test]
fn test_whole_tree_unwritable_destination() {
    let source = create_source_tree();
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "regular file").unwrap();

    let result = run_whole_tree(
        &TreeWalker::new(),
        &ScanConfig::new(source.path()),
        AnalyzeConfig::default(),
        &blocker.join("sub/r.xlsx"),
    );
    match result {
        Err(ReportError::DestinationUnwritable { path, .. }) => {
            assert_eq!(path, blocker.join("sub"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an unwritable destination"),
    }
}

#[test]
fn test_partitioned_workbook_below_regular_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "regular file").unwrap();

    let result = XlsxSink::create_replacing(blocker.join("sub/r.xlsx"));
    assert!(matches!(result, Err(ReportError::DestinationUnwritable { .. })));
}
