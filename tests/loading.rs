use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use injury_impact::LoadError;
use injury_impact::loader::{load_cached, load_records, load_records_from_reader};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn loads_sample_fixture() {
    let table = load_records(&fixture_path("player_injuries_sample.csv")).expect("fixture should load");
    assert_eq!(table.len(), 8);

    let names: Vec<&str> = table
        .missed_match_columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Match1_missed_match_Result",
            "Match2_missed_match_Result",
            "Match3_missed_match_Result",
        ]
    );

    let saka = &table.records[0];
    assert_eq!(saka.name.as_deref(), Some("Bukayo Saka"));
    assert_eq!(saka.team_name.as_deref(), Some("Arsenal"));
    assert_eq!(saka.age, Some(21));
    assert_eq!(saka.fifa_rating, Some(86.0));
    assert_eq!(saka.date_of_injury.as_deref(), Some("Nov 12, 2022"));
    assert_eq!(
        saka.missed_match_results,
        vec![Some("Win".to_string()), Some("draw".to_string()), None]
    );
    // Metrics are attached by the deriver, not the loader.
    assert_eq!(saka.recovery_days(), None);

    let unknown = &table.records[6];
    assert_eq!(unknown.team_name, None);
}

#[test]
fn missing_file_is_source_not_found() {
    let err = load_records(&fixture_path("does_not_exist.csv")).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("does_not_exist.csv"));
}

#[test]
fn missing_required_column_is_unparsable() {
    let raw = "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury\nA,B,GK,20,70,Knock,\"Jan 1, 2023\"\n";
    let err = load_records_from_reader(raw.as_bytes(), "inline.csv").unwrap_err();
    match err {
        LoadError::SourceUnparsable { source_name, reason } => {
            assert_eq!(source_name, "inline.csv");
            assert!(reason.contains("Date of return"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_input_is_unparsable() {
    let err = load_records_from_reader("".as_bytes(), "empty.csv").unwrap_err();
    assert!(matches!(err, LoadError::SourceUnparsable { .. }));
}

#[test]
fn short_rows_load_with_missing_trailing_cells() {
    let raw = "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return,missed_match_Result1,missed_match_Result2\n\
               A,Arsenal,GK,24,82,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\",Win,lose\n\
               B,Chelsea,DF,27,79,Knock,\"Feb 1, 2023\",\"Feb 5, 2023\",draw\n\
               C,Everton,FW\n";
    let table = load_records_from_reader(raw.as_bytes(), "short.csv").expect("short rows should load");
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.records[1].missed_match_results,
        vec![Some("draw".to_string()), None]
    );
    let c = &table.records[2];
    assert_eq!(c.position.as_deref(), Some("FW"));
    assert_eq!(c.age, None);
    assert_eq!(c.date_of_return, None);
    assert_eq!(c.missed_match_results, vec![None, None]);
}

#[test]
fn rows_longer_than_header_are_unparsable() {
    let raw = "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return\n\
               A,Arsenal,GK,24,82,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\",extra\n";
    let err = load_records_from_reader(raw.as_bytes(), "long.csv").unwrap_err();
    match err {
        LoadError::SourceUnparsable { source_name, reason } => {
            assert_eq!(source_name, "long.csv");
            assert!(reason.contains("9 fields"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_utf8_is_unparsable() {
    let mut raw =
        b"Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return\n".to_vec();
    raw.extend_from_slice(b"A\xff,Arsenal,GK,24,82,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\"\n");
    let err = load_records_from_reader(raw.as_slice(), "latin1.csv").unwrap_err();
    assert!(matches!(err, LoadError::SourceUnparsable { .. }));
}

#[test]
fn header_without_result_columns_loads() {
    let raw = "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return\nA,Arsenal,GK,30,80,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\"\n";
    let table = load_records_from_reader(raw.as_bytes(), "inline.csv").expect("should load");
    assert!(table.missed_match_columns.is_empty());
    assert!(table.records[0].missed_match_results.is_empty());
}

#[test]
fn cached_loads_share_one_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("injuries.csv");
    let mut file = fs::File::create(&path).expect("create csv");
    writeln!(
        file,
        "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return"
    )
    .unwrap();
    writeln!(file, "A,Arsenal,GK,30,80,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\"").unwrap();
    drop(file);

    let first = load_cached(&path).expect("first load");
    // The source is static for the process; later edits are not picked up.
    fs::write(&path, "garbage").unwrap();
    let second = load_cached(&path).expect("second load");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 1);
}

#[test]
fn failed_loads_are_not_cached() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("late.csv");
    assert!(load_cached(&path).unwrap_err().is_not_found());

    fs::write(
        &path,
        "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return\n",
    )
    .unwrap();
    let table = load_cached(&path).expect("load after file appears");
    assert!(table.is_empty());
}
