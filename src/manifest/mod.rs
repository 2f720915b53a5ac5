//! Package Manifest Model
//!
//! The canonical tree describing one dataset snapshot: typed nodes,
//! the JSON wire codec, the deterministic content hash, and traversal.

pub mod codec;
pub mod hasher;
pub mod node;
pub mod walker;

pub use codec::{decode, decode_str, encode, encode_string};
pub use hasher::hash_contents;
pub use node::{
    is_node_name, FileNode, GroupNode, Metadata, Node, ObjectHash, TableFormat, TableNode,
};
pub use walker::{find_object_hashes, preorder, Preorder};
