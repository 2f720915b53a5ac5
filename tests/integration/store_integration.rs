//! Integration tests for the filesystem object store

use crate::integration::test_utils::table_of;
use bale::manifest::{find_object_hashes, hash_contents};
use bale::package::{Package, Payload, SetValue};
use bale::store::{ContentStore, FsObjectStore};
use bale::TableFormat;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

/// Author, publish, persist, reload, and materialize through one store.
#[test]
fn test_publish_save_open_roundtrip() {
    let build_root = TempDir::new().unwrap();
    fs::write(build_root.path().join("notes.txt"), "field notes").unwrap();

    let store_dir = TempDir::new().unwrap();
    let store = Arc::new(FsObjectStore::new(store_dir.path()).unwrap());

    let mut pkg = Package::new();
    pkg.set(
        &["tables", "metrics"],
        SetValue::Table(table_of(&[10, 20])),
        build_root.path(),
    )
    .unwrap();
    pkg.set(
        &["docs", "notes"],
        SetValue::Path("notes.txt".to_string()),
        build_root.path(),
    )
    .unwrap();

    let manifest = pkg
        .to_manifest(store.as_ref(), TableFormat::Parquet)
        .unwrap();
    let top_hash = store.save_manifest(&manifest).unwrap();
    assert_eq!(top_hash, hash_contents(&manifest));

    // Every referenced object is present in the store.
    for hash in find_object_hashes(&manifest) {
        assert!(store.exists(hash).unwrap());
    }

    // Reload the manifest by its identity and consume it.
    let reloaded = store.load_manifest(&top_hash).unwrap();
    assert_eq!(reloaded, manifest);

    let reopened = Package::from_manifest(&reloaded, store.clone()).unwrap();
    match reopened
        .entry(&["tables", "metrics"])
        .unwrap()
        .as_leaf()
        .unwrap()
        .data()
        .unwrap()
        .as_ref()
    {
        Payload::Table(table) => assert_eq!(table.len(), 2),
        Payload::Bytes(_) => panic!("expected a table"),
    }
    assert_eq!(
        *reopened
            .entry(&["docs", "notes"])
            .unwrap()
            .as_leaf()
            .unwrap()
            .data()
            .unwrap(),
        Payload::Bytes(b"field notes".to_vec())
    );

    // Portable source path survived publish and reload.
    let notes_meta = &reopened
        .entry(&["docs", "notes"])
        .unwrap()
        .as_leaf()
        .unwrap()
        .metadata;
    assert_eq!(notes_meta.get("filepath"), Some(&json!("notes.txt")));
}

/// Republishing an unchanged package reuses the same objects and
/// produces the same identity.
#[test]
fn test_republish_is_stable() {
    let store_dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(store_dir.path()).unwrap();

    let mut pkg = Package::new();
    pkg.set(
        &["data"],
        SetValue::Table(table_of(&[7])),
        std::path::Path::new("."),
    )
    .unwrap();

    let first = pkg.to_manifest(&store, TableFormat::Parquet).unwrap();
    let second = pkg.to_manifest(&store, TableFormat::Parquet).unwrap();
    assert_eq!(hash_contents(&first), hash_contents(&second));

    let h1 = store.save_manifest(&first).unwrap();
    let h2 = store.save_manifest(&second).unwrap();
    assert_eq!(h1, h2);
    assert_eq!(store.list_manifests().unwrap(), vec![h1]);
}

/// The format tag travels on the wire but stays out of the digest, like
/// metadata: identical structure and hashes mean identical identity.
#[test]
fn test_format_does_not_change_identity() {
    let store_dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(store_dir.path()).unwrap();

    let mut pkg = Package::new();
    pkg.set(
        &["data"],
        SetValue::Table(table_of(&[7])),
        std::path::Path::new("."),
    )
    .unwrap();

    let parquet = pkg.to_manifest(&store, TableFormat::Parquet).unwrap();
    let hdf5 = pkg.to_manifest(&store, TableFormat::Hdf5).unwrap();
    assert_eq!(
        find_object_hashes(&parquet).count(),
        find_object_hashes(&hdf5).count()
    );
    assert_eq!(hash_contents(&parquet), hash_contents(&hdf5));
}
