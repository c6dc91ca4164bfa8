use std::fs;

use geo_series_tools::sample_file::{clean_file, load_sample_table};

const SAMPLE: &str = "#ID_REF = \n#VALUE = beta value\nID_REF\tVALUE\tDetection Pval\ncg00000029\t0.4623\t0.01\ncg00000108 0.93\ncg00000109\t0.8154\n\n";

#[test]
fn every_line_is_either_row_or_reject() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("GSM1007129-tbl-1.txt");
    fs::write(&path, SAMPLE).unwrap();

    let cleaned = clean_file(&path).unwrap();
    assert_eq!(cleaned.line_count(), SAMPLE.lines().count());
    assert_eq!(cleaned.rows.len(), 3);
    assert_eq!(
        cleaned.rejects.concat(),
        b"#ID_REF = \n#VALUE = beta value\ncg00000108 0.93\n\n"
    );
}

#[test]
fn sample_table_keeps_first_two_columns() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("GSM1007129-tbl-1.txt");
    fs::write(&path, SAMPLE).unwrap();

    let table = load_sample_table(&path).unwrap();
    assert_eq!(table.index, vec!["ID_REF", "cg00000029", "cg00000109"]);
    assert_eq!(table.measurement, vec!["VALUE", "0.4623", "0.8154"]);
}

#[test]
fn missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    assert!(clean_file(&temp.path().join("GSM0.txt")).is_err());
}
