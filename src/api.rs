//! Package API
//!
//! The operation surface consumed by CLI, SDK, and registry layers. Thin
//! wrappers over the manifest and package modules, so collaborators can
//! depend on one flat set of functions.

use crate::error::{TreeError, ValidationError};
use crate::manifest::node::{Node, ObjectHash, TableFormat};
use crate::manifest::walker::Preorder;
use crate::manifest::{codec, hasher, walker};
use crate::package::filter::Filter;
use crate::package::node::{Package, SetValue};
use crate::store::{ContentStore, ObjectSink};
use std::path::Path;
use std::sync::Arc;

/// Start an empty package tree for authoring.
pub fn build_tree() -> Package {
    Package::new()
}

/// Attach an in-memory leaf at `path`; see [`Package::set`].
pub fn set(
    pkg: &mut Package,
    path: &[&str],
    value: SetValue,
    build_root: &Path,
) -> Result<(), TreeError> {
    pkg.set(path, value, build_root)
}

/// The deterministic lowercase-hex content identity of a tree.
pub fn hash_contents(root: &Node) -> String {
    hasher::hash_contents(root)
}

/// Encode a manifest tree into its JSON wire form.
pub fn encode(root: &Node) -> serde_json::Value {
    codec::encode(root)
}

/// Decode a wire-form manifest back into a typed tree.
pub fn decode(wire: &serde_json::Value) -> Result<Node, ValidationError> {
    codec::decode(wire)
}

/// Filter a package tree; see [`Package::filter`].
pub fn filter(pkg: &Package, filter: &Filter) -> Package {
    pkg.filter(filter)
}

/// Depth-first preorder traversal; see [`walker::preorder`].
pub fn preorder(node: &Node, sorted: bool) -> Preorder<'_> {
    walker::preorder(node, sorted)
}

/// Every object hash referenced by a tree; see
/// [`walker::find_object_hashes`].
pub fn find_object_hashes(root: &Node) -> impl Iterator<Item = &ObjectHash> {
    walker::find_object_hashes(root)
}

/// Publish an authored tree as a canonical manifest; see
/// [`Package::to_manifest`].
pub fn publish(
    pkg: &Package,
    sink: &dyn ObjectSink,
    default_format: TableFormat,
) -> Result<Node, TreeError> {
    pkg.to_manifest(sink, default_format)
}

/// Wrap a decoded manifest for consumption; see
/// [`Package::from_manifest`].
pub fn open(manifest: &Node, store: Arc<dyn ContentStore>) -> Result<Package, TreeError> {
    Package::from_manifest(manifest, store)
}
