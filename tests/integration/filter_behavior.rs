//! Integration tests for structural filtering

use crate::integration::test_utils::table_of;
use bale::package::{Filter, Package, SetValue};
use serde_json::json;
use std::path::Path;

/// raw/{widgets, gadgets}, clean/{summary}; widgets carries metadata.
fn sample_package() -> Package {
    let mut pkg = Package::new();
    pkg.set(
        &["raw", "widgets"],
        SetValue::Table(table_of(&[1])),
        Path::new("."),
    )
    .unwrap();
    pkg.set(
        &["raw", "gadgets"],
        SetValue::Table(table_of(&[2])),
        Path::new("."),
    )
    .unwrap();
    pkg.set(
        &["clean", "summary"],
        SetValue::Table(table_of(&[3])),
        Path::new("."),
    )
    .unwrap();

    if let bale::package::PackageEntry::Group(raw) = pkg.root_mut().child_mut("raw").unwrap() {
        raw.child_mut("widgets")
            .unwrap()
            .metadata_mut()
            .insert("grade".to_string(), json!({"quality": "gold"}));
    }
    pkg
}

/// A matching group keeps all descendants, even ones the filter would
/// individually reject.
#[test]
fn test_group_match_propagates_to_descendants() {
    let pkg = sample_package();
    let filtered = pkg.filter(&Filter::by_name("raw"));

    let raw = filtered.entry(&["raw"]).unwrap().as_group().unwrap();
    assert_eq!(raw.len(), 2);
    assert!(filtered.entry(&["raw", "widgets"]).unwrap().is_leaf());
    assert!(filtered.entry(&["raw", "gadgets"]).unwrap().is_leaf());
    assert!(filtered.entry(&["clean"]).is_err());
}

/// Leaf matches keep only minimal scaffolding above them.
#[test]
fn test_leaf_match_keeps_minimal_scaffolding() {
    let pkg = sample_package();
    let filtered = pkg.filter(&Filter::by_name("summary"));

    assert!(filtered.entry(&["clean", "summary"]).unwrap().is_leaf());
    assert_eq!(
        filtered.entry(&["clean"]).unwrap().as_group().unwrap().len(),
        1
    );
    assert!(filtered.entry(&["raw"]).is_err());
}

/// Nested metadata submap matching: declared keys must be present and
/// equal, recursively.
#[test]
fn test_metadata_submap_match() {
    let pkg = sample_package();

    let meta: bale::manifest::Metadata = match json!({"grade": {"quality": "gold"}}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let filtered = pkg.filter(&Filter::by_metadata(meta));

    assert!(filtered.entry(&["raw", "widgets"]).unwrap().is_leaf());
    assert!(filtered
        .entry(&["raw"])
        .unwrap()
        .as_group()
        .unwrap()
        .get("gadgets")
        .is_none());
}

/// The declarative spec form combines name and metadata.
#[test]
fn test_spec_filter() {
    let pkg = sample_package();
    let filter = Filter::from_spec(&json!({
        "name": "widgets",
        "meta": {"grade": {"quality": "gold"}}
    }))
    .unwrap();

    let filtered = pkg.filter(&filter);
    assert!(filtered.entry(&["raw", "widgets"]).unwrap().is_leaf());

    // A spec whose meta contradicts the tree matches nothing.
    let filter = Filter::from_spec(&json!({
        "name": "widgets",
        "meta": {"grade": {"quality": "tin"}}
    }))
    .unwrap();
    assert!(pkg.filter(&filter).root().is_empty());
}

/// Nothing matching still yields an empty root, never a null result.
#[test]
fn test_no_match_yields_empty_root() {
    let pkg = sample_package();
    let filtered = pkg.filter(&Filter::by_name("nonexistent"));
    assert!(filtered.root().is_empty());
}

/// Predicate capabilities see both the entry and its name.
#[test]
fn test_predicate_filter() {
    let pkg = sample_package();
    let filtered = pkg.filter(&Filter::predicate(|entry, name| {
        entry.is_leaf() && name.starts_with('g')
    }));

    assert!(filtered.entry(&["raw", "gadgets"]).unwrap().is_leaf());
    assert!(filtered
        .entry(&["raw"])
        .unwrap()
        .as_group()
        .unwrap()
        .get("widgets")
        .is_none());
    assert!(filtered.entry(&["clean"]).is_err());
}

/// Filtering never mutates the source tree.
#[test]
fn test_filter_leaves_source_intact() {
    let pkg = sample_package();
    let _ = pkg.filter(&Filter::by_name("raw"));
    assert_eq!(pkg.root().len(), 2);
    assert!(pkg.entry(&["clean", "summary"]).unwrap().is_leaf());
}
