//! Runtime Package Tree
//!
//! The mutable, user-facing view of a package: navigation over groups and
//! leaves, authoring via `set`, lazy leaf materialization through a
//! content-store collaborator, and structural filtering.

pub mod filter;
pub mod node;
pub mod value;

pub use filter::Filter;
pub use node::{Package, PackageEntry, PackageGroup, PackageLeaf, SetValue};
pub use value::{Payload, TableData};
