//! Canonical content hash ("top hash") for manifest trees
//!
//! One SHA-256 digest identifies a tree's structure: type tags, leaf hash
//! lists, and child names, streamed depth-first into a single context.
//! Children are visited sorted ascending by name, so the identity is
//! independent of insertion order. Metadata is never fed into the digest.
//!
//! Byte protocol: integers (counts, lengths) are written as 4-byte
//! big-endian values; a string is written as its length followed by its
//! UTF-8 bytes; leaf hash values are written in lowercase-hex string form.

use crate::manifest::node::Node;
use sha2::{Digest, Sha256};

struct TreeDigest(Sha256);

impl TreeDigest {
    fn new() -> Self {
        TreeDigest(Sha256::new())
    }

    fn write_u32(&mut self, value: u32) {
        self.0.update(value.to_be_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.0.update(s.as_bytes());
    }

    fn write_node(&mut self, node: &Node) {
        self.write_str(node.type_tag());
        match node {
            Node::Root(group) | Node::Group(group) => {
                self.write_u32(group.len() as u32);
                let mut entries: Vec<_> = group.children().iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                for (name, child) in entries {
                    self.write_str(name);
                    self.write_node(child);
                }
            }
            Node::Table(_) | Node::File(_) => {
                let hashes = node.object_hashes();
                self.write_u32(hashes.len() as u32);
                for hash in hashes {
                    self.write_str(&hash.to_hex());
                }
            }
        }
    }

    fn finish(self) -> String {
        hex::encode(self.0.finalize())
    }
}

/// Compute the deterministic lowercase-hex content hash of a tree.
///
/// Two trees with identical type tags, identical ordered leaf-hash lists,
/// and identical recursively-named children hash identically, regardless
/// of insertion order or metadata.
pub fn hash_contents(root: &Node) -> String {
    let mut digest = TreeDigest::new();
    digest.write_node(root);
    digest.finish()
}
