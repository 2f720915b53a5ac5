//! Integration tests for content hash determinism

use bale::manifest::{hash_contents, FileNode, GroupNode, Metadata, Node};
use serde_json::json;

fn file(hex: &str) -> Node {
    Node::File(FileNode::from_hex(&[hex], Metadata::new()).unwrap())
}

/// Insertion order never changes the identity.
#[test]
fn test_insertion_order_independent() {
    let mut forward = GroupNode::new();
    forward.insert("a", file("1111")).unwrap();
    forward.insert("b", file("2222")).unwrap();

    let mut reverse = GroupNode::new();
    reverse.insert("b", file("2222")).unwrap();
    reverse.insert("a", file("1111")).unwrap();

    assert_eq!(
        hash_contents(&Node::Root(forward)),
        hash_contents(&Node::Root(reverse))
    );
}

/// Attaching or removing metadata anywhere leaves the identity unchanged.
#[test]
fn test_metadata_never_affects_identity() {
    let mut plain = GroupNode::new();
    plain.insert("data", file("abcd")).unwrap();
    let plain_hash = hash_contents(&Node::Root(plain.clone()));

    let mut leaf = file("abcd");
    leaf.metadata_mut()
        .insert("description".to_string(), json!("all the widgets"));
    let mut annotated = GroupNode::with_metadata(
        [("author".to_string(), json!("alice"))].into_iter().collect(),
    );
    annotated.insert("data", leaf).unwrap();

    assert_eq!(plain_hash, hash_contents(&Node::Root(annotated)));

    // Removing metadata again is equally invisible.
    let mut stripped = plain;
    stripped.metadata.clear();
    assert_eq!(plain_hash, hash_contents(&Node::Root(stripped)));
}

/// The empty root hashes to a fixed value across runs and
/// implementations of the digest protocol.
#[test]
fn test_empty_root_fixed_value() {
    assert_eq!(
        hash_contents(&Node::Root(GroupNode::new())),
        "3e659fce4c878d0ad00f6df85ca1aef2aa1bcef25137f030312f01f39d256a82"
    );
}

/// Structural differences always show in the identity.
#[test]
fn test_structure_changes_identity() {
    let mut one = GroupNode::new();
    one.insert("a", file("1111")).unwrap();
    let one_hash = hash_contents(&Node::Root(one.clone()));

    // Different leaf content.
    let mut other_content = GroupNode::new();
    other_content.insert("a", file("9999")).unwrap();
    assert_ne!(one_hash, hash_contents(&Node::Root(other_content)));

    // Different child name.
    let mut other_name = GroupNode::new();
    other_name.insert("b", file("1111")).unwrap();
    assert_ne!(one_hash, hash_contents(&Node::Root(other_name)));

    // Extra child.
    let mut extra = one;
    extra.insert("c", file("cccc")).unwrap();
    assert_ne!(one_hash, hash_contents(&Node::Root(extra)));
}

/// Nesting level is part of the identity.
#[test]
fn test_nesting_changes_identity() {
    let mut flat = GroupNode::new();
    flat.insert("x", file("aa")).unwrap();

    let mut inner = GroupNode::new();
    inner.insert("x", file("aa")).unwrap();
    let mut nested = GroupNode::new();
    nested.insert("x", Node::Group(inner)).unwrap();

    assert_ne!(
        hash_contents(&Node::Root(flat)),
        hash_contents(&Node::Root(nested))
    );
}
