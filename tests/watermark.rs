use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use catalog_sync::error::SyncError;
use catalog_sync::watermark::{WatermarkMap, WatermarkStore};

fn store_in(dir: &tempfile::TempDir, name: &str) -> WatermarkStore {
    WatermarkStore::new(Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap())
}

#[test]
fn save_then_load_returns_same_map() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp, "run_metadata.json");

    let mut map = WatermarkMap::new();
    map.insert("xubh-q36u".to_string(), "2024-05-01".to_string());
    map.insert("77hc-ibv8".to_string(), "2024-04-12".to_string());
    store.save(&map).unwrap();

    assert_eq!(store.load().unwrap(), map);
}

#[test]
fn save_replaces_previous_contents() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp, "run_metadata.json");

    let mut first = WatermarkMap::new();
    first.insert("old".to_string(), "1".to_string());
    store.save(&first).unwrap();

    let mut second = WatermarkMap::new();
    second.insert("new".to_string(), "2".to_string());
    store.save(&second).unwrap();

    assert_eq!(store.load().unwrap(), second);
    let leftovers = std::fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn save_creates_parent_directories() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp, "state/nested/run_metadata.json");
    store.save(&WatermarkMap::new()).unwrap();
    assert!(store.path().as_std_path().exists());
}

#[test]
fn reads_plain_json_object() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp, "run_metadata.json");
    std::fs::write(
        store.path().as_std_path(),
        r#"{"xubh-q36u": "2024-05-01", "77hc-ibv8": "2024-04-12"}"#,
    )
    .unwrap();

    let map = store.load().unwrap();
    assert_eq!(map.get("xubh-q36u").map(String::as_str), Some("2024-05-01"));
    assert_eq!(map.len(), 2);
}

#[test]
fn corrupt_file_is_a_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp, "run_metadata.json");
    std::fs::write(store.path().as_std_path(), "not json").unwrap();

    assert_matches!(store.load(), Err(SyncError::WatermarkRead { .. }));
}

#[test]
fn unwritable_location_is_a_persist_error() {
    let temp = tempfile::tempdir().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();
    let store = store_in(&temp, "blocker/run_metadata.json");

    let err = store.save(&WatermarkMap::new()).unwrap_err();
    assert_matches!(err, SyncError::WatermarkPersist { .. });
    assert!(err.is_fatal());
}
