use assert_matches::assert_matches;

use geo_series_tools::config::ConfigLoader;
use geo_series_tools::domain::ArchiveKind;
use geo_series_tools::error::GeoError;

#[test]
fn resolve_from_explicit_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("geo-tools.json");
    std::fs::write(
        &path,
        r#"{"schema_version": 1, "series": ["gse41037", {"accession": "GSE32148", "kind": "miniml"}]}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.series.len(), 2);
    assert_eq!(resolved.series[0].accession.as_str(), "GSE41037");
    assert_eq!(resolved.series[0].kind, ArchiveKind::SeriesMatrix);
    assert_eq!(resolved.series[1].kind, ArchiveKind::Miniml);
    assert!(resolved.store().data_root().ends_with("data"));
}

#[test]
fn explicit_missing_path_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(GeoError::ConfigRead(_))
    );
}

#[test]
fn malformed_json_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("geo-tools.json");
    std::fs::write(&path, "{ series: ").unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(GeoError::ConfigParse(_))
    );
}
