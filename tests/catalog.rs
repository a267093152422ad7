use assert_matches::assert_matches;

use catalog_sync::catalog::parse_catalog;
use catalog_sync::error::SyncError;

const METASTORE: &str = r#"[
  {
    "@type": "dcat:Dataset",
    "identifier": "xubh-q36u",
    "title": "Hospital General Information",
    "modified": "2024-05-01",
    "theme": ["Hospitals"],
    "keyword": ["Hospitals"],
    "distribution": [
      {"@type": "dcat:Distribution", "mediaType": "text/csv",
       "downloadURL": "https://data.cms.gov/provider-data/files/hospital_general.csv"}
    ]
  },
  {
    "identifier": "4pq5-n9py",
    "title": "Nursing Home Provider Information",
    "modified": "2024-04-01",
    "theme": ["Nursing homes including rehab services"],
    "distribution": []
  },
  {
    "identifier": "77hc-ibv8",
    "title": "Timely and Effective Care - Hospital",
    "modified": "2024-04-12",
    "theme": ["Hospitals", "Quality"],
    "distribution": [
      {"mediaType": "application/json", "downloadURL": "https://example.test/77hc.json"}
    ]
  }
]"#;

#[test]
fn keeps_only_the_configured_theme() {
    let datasets = parse_catalog(METASTORE.as_bytes(), "Hospitals").unwrap();
    let ids = datasets
        .iter()
        .map(|ds| ds.identifier.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["xubh-q36u", "77hc-ibv8"]);
    assert_eq!(datasets[0].title, "Hospital General Information");
    assert_eq!(datasets[1].theme, vec!["Hospitals", "Quality"]);
}

#[test]
fn theme_match_is_exact() {
    let datasets = parse_catalog(METASTORE.as_bytes(), "hospitals").unwrap();
    assert!(datasets.is_empty());
}

#[test]
fn missing_required_field_rejects_catalog() {
    let body = r#"[{"identifier": "a", "title": "A", "theme": ["Hospitals"], "distribution": []}]"#;
    assert_matches!(
        parse_catalog(body.as_bytes(), "Hospitals"),
        Err(SyncError::CatalogUnavailable(_))
    );
}

#[test]
fn non_array_body_is_malformed() {
    let body = r#"{"items": []}"#;
    let err = parse_catalog(body.as_bytes(), "Hospitals").unwrap_err();
    assert_matches!(err, SyncError::CatalogUnavailable(_));
    assert!(err.is_fatal());
}

#[test]
fn malformed_records_outside_the_theme_are_ignored() {
    let body = r#"[
      {"identifier": "a", "title": "A", "modified": "1", "theme": ["Hospitals"],
       "distribution": [{"mediaType": "text/csv", "downloadURL": "https://example.test/a.csv"}]},
      {"identifier": "b", "theme": ["Dialysis facilities"],
       "distribution": [{"downloadURL": "https://example.test/b.csv"}]},
      {"identifier": "c", "title": "C"}
    ]"#;

    let datasets = parse_catalog(body.as_bytes(), "Hospitals").unwrap();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].identifier, "a");
}
