//! Bale: Content-Addressable Data Package Manifests
//!
//! A package manifest is an immutable tree describing a versioned dataset:
//! groups of named tables and files, each leaf backed by one or more
//! content hashes. Bale models that tree, derives its deterministic
//! content identity (the "top hash"), serializes it to a JSON wire form,
//! and exposes a runtime view for authoring, lazy materialization, and
//! structural filtering.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod package;
pub mod store;

pub use error::{TreeError, ValidationError};
pub use manifest::{GroupNode, Metadata, Node, ObjectHash, TableFormat};
pub use package::{Filter, Package, Payload, SetValue, TableData};
pub use store::{ContentStore, ObjectSink};
