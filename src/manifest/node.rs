//! Manifest node model
//!
//! A closed set of node variants describing one dataset snapshot:
//! groups (named branches), the root group, and table/file leaves backed
//! by content hashes. Construction validates names, hashes, and formats
//! up front, so any tree that builds is always hashable and encodable.

use crate::error::ValidationError;
use std::fmt;

/// Arbitrary key/value metadata attached to a node.
///
/// Metadata never participates in content hashing.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Check whether a string is a valid child name.
///
/// Names follow identifier syntax: an ASCII letter, then ASCII letters,
/// digits, or underscores. Names starting with an underscore are reserved
/// for internal use and never hold children.
pub fn is_node_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_node_name(name: &str) -> Result<(), ValidationError> {
    if is_node_name(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName(name.to_string()))
    }
}

/// A single content digest carried by a table or file leaf.
///
/// Stored as raw bytes; lowercase hex on the wire. Input hex is accepted
/// case-insensitively and must be non-empty with an even length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHash(Vec<u8>);

impl ObjectHash {
    /// Parse a hex digest string into raw bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self, ValidationError> {
        if hex_str.is_empty() {
            return Err(ValidationError::MalformedHash(hex_str.to_string()));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|_| ValidationError::MalformedHash(hex_str.to_string()))?;
        Ok(ObjectHash(bytes))
    }

    /// Wrap raw digest bytes. Empty digests are rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::MalformedHash(String::new()));
        }
        Ok(ObjectHash(bytes))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex form, as emitted on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Serialization format of a table leaf's shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Hdf5,
    Parquet,
}

impl TableFormat {
    /// The wire tag for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Hdf5 => "HDF5",
            TableFormat::Parquet => "PARQUET",
        }
    }

    /// Parse a wire tag into a format.
    pub fn parse(tag: &str) -> Result<Self, ValidationError> {
        match tag {
            "HDF5" => Ok(TableFormat::Hdf5),
            "PARQUET" => Ok(TableFormat::Parquet),
            other => Err(ValidationError::UnknownFormat(other.to_string())),
        }
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        TableFormat::Parquet
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a manifest tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The package itself: a group at the top of traversal.
    Root(GroupNode),
    /// A named branch.
    Group(GroupNode),
    /// A tabular leaf: one or more data shards in a known format.
    Table(TableNode),
    /// An opaque file leaf: one or more byte shards.
    File(FileNode),
}

impl Node {
    /// The wire type tag of this node.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Node::Root(_) => "ROOT",
            Node::Group(_) => "GROUP",
            Node::Table(_) => "TABLE",
            Node::File(_) => "FILE",
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Node::Root(g) | Node::Group(g) => &g.metadata,
            Node::Table(t) => &t.metadata,
            Node::File(f) => &f.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Node::Root(g) | Node::Group(g) => &mut g.metadata,
            Node::Table(t) => &mut t.metadata,
            Node::File(f) => &mut f.metadata,
        }
    }

    /// Child entries in native (insertion) order. Empty for leaves.
    pub fn children(&self) -> &[(String, Node)] {
        match self {
            Node::Root(g) | Node::Group(g) => g.children(),
            _ => &[],
        }
    }

    /// Object hashes carried by this node. Empty for groups.
    pub fn object_hashes(&self) -> &[ObjectHash] {
        match self {
            Node::Table(t) => t.hashes(),
            Node::File(f) => f.hashes(),
            _ => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Table(_) | Node::File(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Root(_) | Node::Group(_))
    }
}

/// A named branch holding uniquely-named children in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupNode {
    /// Arbitrary metadata; excluded from content hashing.
    pub metadata: Metadata,
    children: Vec<(String, Node)>,
}

impl GroupNode {
    pub fn new() -> Self {
        GroupNode::default()
    }

    pub fn with_metadata(metadata: Metadata) -> Self {
        GroupNode {
            metadata,
            children: Vec::new(),
        }
    }

    /// Attach a child under `name`, validating the name.
    ///
    /// An existing child of the same name is replaced in place, keeping
    /// its position in the native order.
    pub fn insert(&mut self, name: &str, node: Node) -> Result<(), ValidationError> {
        validate_node_name(name)?;
        if let Some(slot) = self.children.iter_mut().find(|(n, _)| n == name) {
            slot.1 = node;
        } else {
            self.children.push((name.to_string(), node));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        let idx = self.children.iter().position(|(n, _)| n == name)?;
        Some(self.children.remove(idx).1)
    }

    /// Child entries in native (insertion) order.
    pub fn children(&self) -> &[(String, Node)] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A tabular leaf: ordered data shards plus their serialization format.
#[derive(Debug, Clone, PartialEq)]
pub struct TableNode {
    pub metadata: Metadata,
    format: TableFormat,
    hashes: Vec<ObjectHash>,
}

impl TableNode {
    /// Build a table leaf. The hash list must be non-empty.
    pub fn new(
        hashes: Vec<ObjectHash>,
        format: TableFormat,
        metadata: Metadata,
    ) -> Result<Self, ValidationError> {
        if hashes.is_empty() {
            return Err(ValidationError::EmptyHashes);
        }
        Ok(TableNode {
            metadata,
            format,
            hashes,
        })
    }

    /// Build a table leaf from wire hex hash strings.
    pub fn from_hex(
        hashes: &[&str],
        format: TableFormat,
        metadata: Metadata,
    ) -> Result<Self, ValidationError> {
        let parsed = hashes
            .iter()
            .map(|h| ObjectHash::from_hex(h))
            .collect::<Result<Vec<_>, _>>()?;
        TableNode::new(parsed, format, metadata)
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    pub fn hashes(&self) -> &[ObjectHash] {
        &self.hashes
    }
}

/// An opaque file leaf: ordered byte shards.
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub metadata: Metadata,
    hashes: Vec<ObjectHash>,
}

impl FileNode {
    /// Build a file leaf. The hash list must be non-empty.
    pub fn new(hashes: Vec<ObjectHash>, metadata: Metadata) -> Result<Self, ValidationError> {
        if hashes.is_empty() {
            return Err(ValidationError::EmptyHashes);
        }
        Ok(FileNode { metadata, hashes })
    }

    /// Build a file leaf from wire hex hash strings.
    pub fn from_hex(hashes: &[&str], metadata: Metadata) -> Result<Self, ValidationError> {
        let parsed = hashes
            .iter()
            .map(|h| ObjectHash::from_hex(h))
            .collect::<Result<Vec<_>, _>>()?;
        FileNode::new(parsed, metadata)
    }

    pub fn hashes(&self) -> &[ObjectHash] {
        &self.hashes
    }
}
