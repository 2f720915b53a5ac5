//! Integration tests for lazy leaf materialization

use crate::integration::test_utils::{table_of, CountingStore, FailingStore};
use bale::manifest::{FileNode, GroupNode, Metadata, Node, TableFormat};
use bale::package::{Package, Payload, SetValue};
use bale::TreeError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn publish_single_leaf(store: &CountingStore) -> Node {
    let mut pkg = Package::new();
    pkg.set(
        &["data"],
        SetValue::Table(table_of(&[1, 2, 3])),
        Path::new("."),
    )
    .unwrap();
    pkg.to_manifest(store, TableFormat::Parquet).unwrap()
}

/// N sequential reads of the same leaf issue exactly one fetch.
#[test]
fn test_sequential_reads_fetch_once() {
    let store = Arc::new(CountingStore::new());
    let manifest = publish_single_leaf(&store);
    let pkg = Package::from_manifest(&manifest, store.clone()).unwrap();

    let leaf = pkg.entry(&["data"]).unwrap().as_leaf().unwrap();
    assert!(!leaf.is_materialized());

    let first = leaf.data().unwrap();
    for _ in 0..5 {
        let again = leaf.data().unwrap();
        assert_eq!(*again, *first);
    }

    assert_eq!(store.fetch_count(), 1);
    assert!(leaf.is_materialized());
}

/// T concurrent first-reads collapse into a single in-flight fetch.
#[test]
fn test_concurrent_first_reads_fetch_once() {
    let store = Arc::new(CountingStore::with_delay(Duration::from_millis(50)));
    let manifest = publish_single_leaf(&store);
    let pkg = Package::from_manifest(&manifest, store.clone()).unwrap();
    let leaf = pkg.entry(&["data"]).unwrap().as_leaf().unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| leaf.data().unwrap()))
            .collect();
        let payloads: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for payload in &payloads {
            assert_eq!(**payload, *payloads[0]);
        }
    });

    assert_eq!(store.fetch_count(), 1);
}

/// Multi-shard leaves fetch each shard once and concatenate in order.
#[test]
fn test_multi_shard_leaf_concatenates() {
    let store = Arc::new(CountingStore::new());
    use bale::store::ObjectSink;
    let h1 = store.put(&Payload::Bytes(b"part one ".to_vec())).unwrap();
    let h2 = store.put(&Payload::Bytes(b"part two".to_vec())).unwrap();

    let mut root = GroupNode::new();
    root.insert(
        "blob",
        Node::File(FileNode::new(vec![h1, h2], Metadata::new()).unwrap()),
    )
    .unwrap();
    let pkg = Package::from_manifest(&Node::Root(root), store.clone()).unwrap();

    let leaf = pkg.entry(&["blob"]).unwrap().as_leaf().unwrap();
    assert_eq!(
        *leaf.data().unwrap(),
        Payload::Bytes(b"part one part two".to_vec())
    );
    assert_eq!(store.fetch_count(), 2);

    // Both shards are cached behind the one materialized payload.
    leaf.data().unwrap();
    assert_eq!(store.fetch_count(), 2);
}

/// Store failures propagate unmodified and leave the leaf unmaterialized.
#[test]
fn test_fetch_failure_propagates() {
    let mut root = GroupNode::new();
    root.insert(
        "blob",
        Node::File(FileNode::from_hex(&["ab"], Metadata::new()).unwrap()),
    )
    .unwrap();
    let pkg = Package::from_manifest(&Node::Root(root), Arc::new(FailingStore)).unwrap();

    let leaf = pkg.entry(&["blob"]).unwrap().as_leaf().unwrap();
    match leaf.data() {
        Err(TreeError::Store(source)) => {
            assert!(source.to_string().contains("transient backend outage"));
        }
        other => panic!("expected a store error, got {:?}", other.map(|_| ())),
    }
    assert!(!leaf.is_materialized());
}
