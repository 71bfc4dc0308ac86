use std::fs;

use tagsweep_core::{Settings, Stats};
use tagsweep_engine::{RonStore, Store, StoreError, SETTINGS_FILENAME, STATS_FILENAME};
use tempfile::TempDir;

#[test]
fn missing_files_yield_defaults() {
    let temp = TempDir::new().unwrap();
    let store = RonStore::new(temp.path().join("state"));
    assert_eq!(store.load_settings().unwrap(), Settings::default());
    assert_eq!(store.load_stats().unwrap(), Stats::default());
    assert!(!temp.path().join("state").exists());
}

#[test]
fn settings_persist_and_state_dir_is_created() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("state");
    let store = RonStore::new(&dir);

    let settings = Settings {
        batch_size: 6,
        debug_mode: true,
        target_tag: "vaporwave".into(),
        ..Settings::default()
    };
    store.save_settings(&settings).unwrap();
    assert!(dir.join(SETTINGS_FILENAME).is_file());

    let reopened = RonStore::new(&dir);
    assert_eq!(reopened.load_settings().unwrap(), settings);
}

#[test]
fn stats_deltas_accumulate_across_store_instances() {
    let temp = TempDir::new().unwrap();
    let delta = Stats {
        total_checked: 3,
        total_removed: 1,
        errors: 0,
    };

    let totals = RonStore::new(temp.path()).add_stats(&delta).unwrap();
    assert_eq!(totals, delta);
    let totals = RonStore::new(temp.path()).add_stats(&delta).unwrap();
    assert_eq!(totals.total_checked, 6);
    assert_eq!(totals.total_removed, 2);

    let raw = fs::read_to_string(temp.path().join(STATS_FILENAME)).unwrap();
    assert!(raw.contains("updated_utc"));
    assert_eq!(RonStore::new(temp.path()).load_stats().unwrap(), totals);
}

#[test]
fn corrupt_files_are_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(SETTINGS_FILENAME), "(((not ron").unwrap();
    let err = RonStore::new(temp.path()).load_settings().unwrap_err();
    assert!(matches!(err, StoreError::Deserialize { .. }));
}

#[test]
fn state_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let err = RonStore::new(&file_path)
        .save_settings(&Settings::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::StateDir(_)));
}
