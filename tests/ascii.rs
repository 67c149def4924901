mod common;

use rstest::rstest;
use tempfile::TempDir;

use common::ascii_file;
use gti_ingest::config::{AugmentConfig, IngestConfig};
use gti_ingest::data::loader::{load_ascii, load_file};
use gti_ingest::Error;

const HEADERS: [&str; 4] = ["Time", "Rate", "color1", "color2"];

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn value_and_error_columns_pair_up(#[case] k: usize) {
    let dir = TempDir::new().unwrap();
    let rows = 5;
    let path = ascii_file(dir.path(), "table.txt", rows, k);
    let headers = &HEADERS[..k];

    let ds = load_ascii(&path, "txt_table", "txt_table", headers).unwrap();

    assert_eq!(ds.column_names("txt_table").unwrap(), headers.to_vec());
    for (i, name) in headers.iter().enumerate() {
        let expected: Vec<f64> = (0..rows).map(|r| (r * 10 + i) as f64).collect();
        let errors: Vec<f64> = expected.iter().map(|v| v / 100.0).collect();
        assert_eq!(ds.values("txt_table", name).unwrap(), expected.as_slice());
        assert_eq!(ds.error_values("txt_table", name).unwrap(), errors.as_slice());
    }
}

#[test]
fn width_must_be_twice_the_headers() {
    let dir = TempDir::new().unwrap();
    let path = ascii_file(dir.path(), "narrow.txt", 3, 3);

    let err = load_ascii(&path, "ds", "t", &HEADERS).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
}

#[test]
fn ragged_and_non_numeric_rows_fail() {
    let dir = TempDir::new().unwrap();
    let ragged = dir.path().join("ragged.txt");
    std::fs::write(&ragged, "1 0.1\n2 0.2 3\n").unwrap();
    let text = dir.path().join("words.txt");
    std::fs::write(&text, "1 0.1\ntwo 0.2\n").unwrap();
    let empty = dir.path().join("empty.txt");
    std::fs::write(&empty, "").unwrap();

    for path in [ragged, text, empty] {
        let err = load_ascii(&path, "ds", "t", &["Time"]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{}: {err}", path.display());
    }
}

#[test]
fn comma_separated_tables_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.csv");
    std::fs::write(&path, "# Time,TimeErr\n1.0,0.5\n   \n2.0,0.5\n \t\n").unwrap();

    let ds = load_ascii(&path, "ds", "t", &["Time"]).unwrap();
    assert_eq!(ds.values("t", "Time").unwrap(), &[1.0, 2.0]);
    assert_eq!(ds.error_values("t", "Time").unwrap(), &[0.5, 0.5]);
}

#[test]
fn load_file_adds_no_synthetic_data_by_default() {
    let dir = TempDir::new().unwrap();
    let path = ascii_file(dir.path(), "lc.dat", 4, 4);

    let ds = load_file(&path, &IngestConfig::default()).unwrap();

    assert_eq!(ds.table_ids(), vec!["txt_table"]);
    assert_eq!(ds.column_names("txt_table").unwrap(), HEADERS.to_vec());
    assert!(ds.table("txt_table").unwrap().columns().all(|c| !c.is_synthetic()));
}

#[test]
fn load_file_appends_requested_synthetic_column() {
    let dir = TempDir::new().unwrap();
    let path = ascii_file(dir.path(), "lc.dat", 6, 4);
    let mut config = IngestConfig::default();
    config.ascii.augment = Some(AugmentConfig {
        seed: 3,
        ..AugmentConfig::default()
    });

    let first = load_file(&path, &config).unwrap();
    let second = load_file(&path, &config).unwrap();

    let table = first.table("txt_table").unwrap();
    let amplitude = table.column("Amplitude").unwrap();
    assert!(amplitude.is_synthetic());
    assert_eq!(amplitude.len(), table.column("Time").unwrap().len());
    assert_eq!(first, second);
}

#[test]
fn binary_garbage_is_unrecognized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("image.txt");
    std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 0, 1]).unwrap();

    let err = load_file(&path, &IngestConfig::default()).unwrap_err();
    assert!(matches!(err, Error::FormatUnrecognized(_)), "{err}");
}
