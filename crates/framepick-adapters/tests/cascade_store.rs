//! Integration tests for the cascade cache (no network access).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use framepick_adapters::CascadeStore;
use framepick_core::{CascadeBank, DetectorSettings};
use framepick_test_support::{write_cascade_set, NEVER_FIRES_CASCADE};
use tempfile::TempDir;

#[test]
fn test_empty_store_lists_missing() {
    let dir = TempDir::new().unwrap();
    let store = CascadeStore::new(dir.path());

    assert!(!store.all_installed());
    let list = store.list();
    assert_eq!(list.len(), 3);
    assert!(list.iter().all(|(_, installed)| !installed));
}

#[test]
fn test_installed_cascades_load() {
    let dir = TempDir::new().unwrap();
    write_cascade_set(dir.path(), NEVER_FIRES_CASCADE).unwrap();
    let store = CascadeStore::new(dir.path());

    assert!(store.all_installed());
    let names: Vec<String> = store.list().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["face", "eye", "smile"]);

    // nothing is missing, so no download is attempted
    store.ensure().unwrap();
    assert!(CascadeBank::load(&store.paths(), DetectorSettings::default()).is_ok());
}
