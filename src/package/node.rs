//! Runtime package tree
//!
//! One concrete entry per loaded or attached child. Group entries hold
//! uniquely-named children in insertion order; leaf entries are either
//! **persisted** (hashes plus a content-store handle, payload fetched
//! lazily and cached) or **in-memory** (payload attached during authoring,
//! not yet persisted).

use crate::error::{TreeError, ValidationError};
use crate::manifest::node::{
    is_node_name, FileNode, GroupNode, Metadata, Node, ObjectHash, TableFormat, TableNode,
};
use crate::package::filter::Filter;
use crate::package::value::{Payload, TableData};
use crate::store::{ContentStore, ObjectSink};
use parking_lot::Mutex;
use serde_json::json;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// A value attached during authoring via [`Package::set`].
pub enum SetValue {
    /// Tabular data, attached directly.
    Table(TableData),
    /// A source file path, relative to the build root.
    Path(String),
}

/// The runtime view of one package: a root group plus authoring,
/// publishing, and filtering operations.
#[derive(Debug, Clone, Default)]
pub struct Package {
    root: PackageGroup,
}

/// One child of a group: a nested group or a leaf.
#[derive(Debug, Clone)]
pub enum PackageEntry {
    Group(PackageGroup),
    Leaf(PackageLeaf),
}

impl PackageEntry {
    pub fn is_group(&self) -> bool {
        matches!(self, PackageEntry::Group(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PackageEntry::Leaf(_))
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            PackageEntry::Group(g) => &g.metadata,
            PackageEntry::Leaf(l) => &l.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            PackageEntry::Group(g) => &mut g.metadata,
            PackageEntry::Leaf(l) => &mut l.metadata,
        }
    }

    pub fn as_group(&self) -> Option<&PackageGroup> {
        match self {
            PackageEntry::Group(g) => Some(g),
            PackageEntry::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&PackageLeaf> {
        match self {
            PackageEntry::Leaf(l) => Some(l),
            PackageEntry::Group(_) => None,
        }
    }

    /// Attach a child, which is only defined for group entries.
    pub fn insert_child(&mut self, name: &str, entry: PackageEntry) -> Result<(), TreeError> {
        match self {
            PackageEntry::Group(g) => g.insert(name, entry),
            PackageEntry::Leaf(_) => Err(TreeError::InvalidAssignment(name.to_string())),
        }
    }
}

/// A runtime branch: metadata plus uniquely-named children.
#[derive(Debug, Clone, Default)]
pub struct PackageGroup {
    /// Arbitrary metadata; carried through filtering and publishing.
    pub metadata: Metadata,
    children: Vec<(String, PackageEntry)>,
}

impl PackageGroup {
    pub fn new() -> Self {
        PackageGroup::default()
    }

    pub fn with_metadata(metadata: Metadata) -> Self {
        PackageGroup {
            metadata,
            children: Vec::new(),
        }
    }

    /// Look up a child, failing on unknown names.
    pub fn child(&self, name: &str) -> Result<&PackageEntry, TreeError> {
        self.get(name)
            .ok_or_else(|| TreeError::UnknownChild(name.to_string()))
    }

    pub fn child_mut(&mut self, name: &str) -> Result<&mut PackageEntry, TreeError> {
        let slot = self
            .children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry);
        slot.ok_or_else(|| TreeError::UnknownChild(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
    }

    /// Attach a child under `name`, validating the name. An existing child
    /// of the same name is replaced in place.
    pub fn insert(&mut self, name: &str, entry: PackageEntry) -> Result<(), TreeError> {
        if !is_node_name(name) {
            return Err(ValidationError::InvalidName(name.to_string()).into());
        }
        self.push_entry(name.to_string(), entry);
        Ok(())
    }

    /// Attach without re-validating; callers hold names that already
    /// passed validation (filter copies, manifest decode).
    pub(crate) fn push_entry(&mut self, name: String, entry: PackageEntry) {
        if let Some(slot) = self.children.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = entry;
        } else {
            self.children.push((name, entry));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PackageEntry> {
        let idx = self.children.iter().position(|(n, _)| n == name)?;
        Some(self.children.remove(idx).1)
    }

    pub fn children(&self) -> &[(String, PackageEntry)] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Merge the payloads of every descendant leaf into one aggregate.
    ///
    /// Defined only when every persisted leaf's backing store supports
    /// per-leaf random access and every leaf is tabular; anything else
    /// fails with `NotSupported`.
    pub fn data(&self) -> Result<Payload, TreeError> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        if leaves.is_empty() {
            return Err(TreeError::NotSupported(
                "group has no leaves to merge".to_string(),
            ));
        }
        for leaf in &leaves {
            if let Some(store) = leaf.store() {
                if !store.supports_random_access() {
                    return Err(TreeError::NotSupported(
                        "backing store does not support per-leaf random access".to_string(),
                    ));
                }
            }
            if !leaf.is_tabular() {
                return Err(TreeError::NotSupported(
                    "group merge is defined only over tabular leaves".to_string(),
                ));
            }
        }

        let mut merged: Option<Payload> = None;
        for leaf in leaves {
            let payload = leaf.data()?;
            match &mut merged {
                None => merged = Some((*payload).clone()),
                Some(acc) => acc.append(&payload)?,
            }
        }
        merged.ok_or_else(|| TreeError::NotSupported("group has no leaves to merge".to_string()))
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a PackageLeaf>) {
        for (_, entry) in &self.children {
            match entry {
                PackageEntry::Leaf(leaf) => out.push(leaf),
                PackageEntry::Group(group) => group.collect_leaves(out),
            }
        }
    }
}

enum LeafSource {
    /// Backed by the content store; payload fetched at most once.
    Persisted {
        hashes: Vec<ObjectHash>,
        format: Option<TableFormat>,
        store: Arc<dyn ContentStore>,
        cache: Mutex<Option<Arc<Payload>>>,
    },
    /// Attached during authoring; not yet persisted.
    InMemory { data: Arc<Payload> },
}

/// A runtime leaf: a table or file whose payload is held directly or
/// materialized on first read.
pub struct PackageLeaf {
    /// Arbitrary metadata; carried through filtering and publishing.
    pub metadata: Metadata,
    source: LeafSource,
}

impl PackageLeaf {
    /// A leaf holding its payload directly (authoring phase).
    pub fn in_memory(data: Payload, metadata: Metadata) -> Self {
        PackageLeaf {
            metadata,
            source: LeafSource::InMemory {
                data: Arc::new(data),
            },
        }
    }

    /// A leaf backed by the content store (consumption phase). Tables
    /// carry their format; files pass `None`.
    pub fn persisted(
        hashes: Vec<ObjectHash>,
        format: Option<TableFormat>,
        metadata: Metadata,
        store: Arc<dyn ContentStore>,
    ) -> Result<Self, TreeError> {
        if hashes.is_empty() {
            return Err(ValidationError::EmptyHashes.into());
        }
        Ok(PackageLeaf {
            metadata,
            source: LeafSource::Persisted {
                hashes,
                format,
                store,
                cache: Mutex::new(None),
            },
        })
    }

    /// Whether a read would return without fetching.
    pub fn is_materialized(&self) -> bool {
        match &self.source {
            LeafSource::InMemory { .. } => true,
            LeafSource::Persisted { cache, .. } => cache.lock().is_some(),
        }
    }

    /// Whether this leaf holds tabular data.
    pub fn is_tabular(&self) -> bool {
        match &self.source {
            LeafSource::InMemory { data } => matches!(data.as_ref(), Payload::Table(_)),
            LeafSource::Persisted { format, .. } => format.is_some(),
        }
    }

    /// Object hashes backing this leaf; empty while in memory.
    pub fn hashes(&self) -> &[ObjectHash] {
        match &self.source {
            LeafSource::Persisted { hashes, .. } => hashes,
            LeafSource::InMemory { .. } => &[],
        }
    }

    /// The leaf's payload, fetching and caching it on first read.
    ///
    /// The cache lock is held across the fetch, so concurrent first
    /// readers block on the same in-flight fetch instead of issuing their
    /// own: at most one fetch per shard per leaf instance. Store failures
    /// propagate unmodified and leave the leaf unmaterialized.
    pub fn data(&self) -> Result<Arc<Payload>, TreeError> {
        match &self.source {
            LeafSource::InMemory { data } => Ok(Arc::clone(data)),
            LeafSource::Persisted {
                hashes,
                store,
                cache,
                ..
            } => {
                let mut slot = cache.lock();
                if let Some(cached) = slot.as_ref() {
                    return Ok(Arc::clone(cached));
                }
                trace!(shards = hashes.len(), "Materializing leaf");
                let mut merged: Option<Payload> = None;
                for hash in hashes {
                    let shard = store.fetch(hash).map_err(TreeError::Store)?;
                    match &mut merged {
                        None => merged = Some(shard),
                        Some(acc) => acc.append(&shard)?,
                    }
                }
                let payload = Arc::new(merged.ok_or(ValidationError::EmptyHashes)?);
                *slot = Some(Arc::clone(&payload));
                Ok(payload)
            }
        }
    }

    fn store(&self) -> Option<&Arc<dyn ContentStore>> {
        match &self.source {
            LeafSource::Persisted { store, .. } => Some(store),
            LeafSource::InMemory { .. } => None,
        }
    }
}

impl Clone for PackageLeaf {
    fn clone(&self) -> Self {
        let source = match &self.source {
            LeafSource::InMemory { data } => LeafSource::InMemory {
                data: Arc::clone(data),
            },
            LeafSource::Persisted {
                hashes,
                format,
                store,
                cache,
            } => LeafSource::Persisted {
                hashes: hashes.clone(),
                format: *format,
                store: Arc::clone(store),
                // The clone keeps whatever is already materialized.
                cache: Mutex::new(cache.lock().clone()),
            },
        };
        PackageLeaf {
            metadata: self.metadata.clone(),
            source,
        }
    }
}

impl fmt::Debug for PackageLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            LeafSource::InMemory { .. } => f.debug_struct("PackageLeaf").field("state", &"in-memory").finish(),
            LeafSource::Persisted { hashes, cache, .. } => f
                .debug_struct("PackageLeaf")
                .field("shards", &hashes.len())
                .field("materialized", &cache.lock().is_some())
                .finish(),
        }
    }
}

impl Package {
    /// Start an empty package tree for authoring.
    pub fn new() -> Self {
        Package::default()
    }

    pub fn root(&self) -> &PackageGroup {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut PackageGroup {
        &mut self.root
    }

    /// Navigate a path of child names from the root.
    pub fn entry(&self, path: &[&str]) -> Result<&PackageEntry, TreeError> {
        let (first, rest) = match path.split_first() {
            Some(parts) => parts,
            None => return Err(ValidationError::InvalidName(String::new()).into()),
        };
        let mut entry = self.root.child(first)?;
        for name in rest {
            entry = match entry {
                PackageEntry::Group(g) => g.child(name)?,
                PackageEntry::Leaf(_) => return Err(TreeError::UnknownChild(name.to_string())),
            };
        }
        Ok(entry)
    }

    /// Create and attach an in-memory leaf at `path`.
    ///
    /// Missing intermediate groups are created; existing groups are
    /// reused; a leaf sitting at an intermediate name is replaced by a
    /// fresh group. A `SetValue::Path` must be relative: it is resolved
    /// against `build_root` only to read the source bytes, and the
    /// original relative path is retained in leaf metadata under
    /// `filepath`, so manifests never embed build-machine paths.
    pub fn set(
        &mut self,
        path: &[&str],
        value: SetValue,
        build_root: &Path,
    ) -> Result<(), TreeError> {
        if path.is_empty() {
            return Err(ValidationError::InvalidName(String::new()).into());
        }
        for segment in path {
            if !is_node_name(segment) {
                return Err(ValidationError::InvalidName(segment.to_string()).into());
            }
        }

        let (payload, metadata) = match value {
            SetValue::Table(table) => (Payload::Table(table), Metadata::new()),
            SetValue::Path(relative) => {
                if Path::new(&relative).is_absolute() {
                    return Err(ValidationError::AbsolutePath(relative).into());
                }
                let bytes = std::fs::read(build_root.join(&relative))?;
                let mut metadata = Metadata::new();
                metadata.insert("filepath".to_string(), json!(relative));
                metadata.insert("transform".to_string(), json!("id"));
                (Payload::Bytes(bytes), metadata)
            }
        };

        debug!(path = %path.join("/"), "Attaching in-memory leaf");
        set_at(&mut self.root, path, PackageLeaf::in_memory(payload, metadata))
    }

    /// Produce a new tree containing only matching leaves plus the
    /// minimal group scaffolding to reach them.
    ///
    /// A matching group includes all its descendants unconditionally. The
    /// root itself is never subject to the filter. When nothing matches,
    /// the result is an empty root, never a null result.
    pub fn filter(&self, filter: &Filter) -> Package {
        Package {
            root: filter_group(&self.root, filter, false),
        }
    }

    /// Wrap a decoded manifest for consumption: every leaf becomes a
    /// persisted leaf backed by `store`, materialized on demand.
    pub fn from_manifest(
        manifest: &Node,
        store: Arc<dyn ContentStore>,
    ) -> Result<Package, TreeError> {
        let group = match manifest {
            Node::Root(g) | Node::Group(g) => g,
            leaf => return Err(ValidationError::RootNotGroup(leaf.type_tag()).into()),
        };
        Ok(Package {
            root: open_group(group, &store)?,
        })
    }

    /// Publish the authored tree as a canonical manifest.
    ///
    /// In-memory payloads are written through `sink` and become TABLE
    /// (with `default_format`) or FILE leaves; persisted leaves keep their
    /// hashes and formats.
    pub fn to_manifest(
        &self,
        sink: &dyn ObjectSink,
        default_format: TableFormat,
    ) -> Result<Node, TreeError> {
        debug!("Publishing package tree");
        Ok(Node::Root(publish_group(&self.root, sink, default_format)?))
    }
}

fn set_at(group: &mut PackageGroup, path: &[&str], leaf: PackageLeaf) -> Result<(), TreeError> {
    let (head, rest) = match path.split_first() {
        Some(parts) => parts,
        None => return Err(ValidationError::InvalidName(String::new()).into()),
    };
    if rest.is_empty() {
        return group.insert(head, PackageEntry::Leaf(leaf));
    }
    if !matches!(group.get(head), Some(PackageEntry::Group(_))) {
        group.insert(head, PackageEntry::Group(PackageGroup::new()))?;
    }
    match group.child_mut(head)? {
        PackageEntry::Group(child) => set_at(child, rest, leaf),
        PackageEntry::Leaf(_) => Err(TreeError::InvalidAssignment(head.to_string())),
    }
}

fn filter_group(group: &PackageGroup, filter: &Filter, forced: bool) -> PackageGroup {
    let mut out = PackageGroup::with_metadata(group.metadata.clone());
    for (name, child) in group.children() {
        let matched = forced || filter.matches(child, name);
        match child {
            PackageEntry::Leaf(leaf) => {
                if matched {
                    out.push_entry(name.clone(), PackageEntry::Leaf(leaf.clone()));
                }
            }
            PackageEntry::Group(inner) => {
                let kept = filter_group(inner, filter, matched);
                if matched || !kept.is_empty() {
                    out.push_entry(name.clone(), PackageEntry::Group(kept));
                }
            }
        }
    }
    out
}

fn open_group(
    group: &GroupNode,
    store: &Arc<dyn ContentStore>,
) -> Result<PackageGroup, TreeError> {
    let mut out = PackageGroup::with_metadata(group.metadata.clone());
    for (name, child) in group.children() {
        let entry = match child {
            Node::Root(g) | Node::Group(g) => PackageEntry::Group(open_group(g, store)?),
            Node::Table(t) => PackageEntry::Leaf(PackageLeaf::persisted(
                t.hashes().to_vec(),
                Some(t.format()),
                t.metadata.clone(),
                Arc::clone(store),
            )?),
            Node::File(f) => PackageEntry::Leaf(PackageLeaf::persisted(
                f.hashes().to_vec(),
                None,
                f.metadata.clone(),
                Arc::clone(store),
            )?),
        };
        out.push_entry(name.clone(), entry);
    }
    Ok(out)
}

fn publish_group(
    group: &PackageGroup,
    sink: &dyn ObjectSink,
    default_format: TableFormat,
) -> Result<GroupNode, TreeError> {
    let mut out = GroupNode::with_metadata(group.metadata.clone());
    for (name, entry) in group.children() {
        let node = match entry {
            PackageEntry::Group(inner) => {
                Node::Group(publish_group(inner, sink, default_format)?)
            }
            PackageEntry::Leaf(leaf) => publish_leaf(leaf, sink, default_format)?,
        };
        out.insert(name, node)?;
    }
    Ok(out)
}

fn publish_leaf(
    leaf: &PackageLeaf,
    sink: &dyn ObjectSink,
    default_format: TableFormat,
) -> Result<Node, TreeError> {
    match &leaf.source {
        LeafSource::Persisted { hashes, format, .. } => Ok(match format {
            Some(fmt) => Node::Table(TableNode::new(hashes.clone(), *fmt, leaf.metadata.clone())?),
            None => Node::File(FileNode::new(hashes.clone(), leaf.metadata.clone())?),
        }),
        LeafSource::InMemory { data } => {
            let hash = sink.put(data).map_err(TreeError::Store)?;
            Ok(match data.as_ref() {
                Payload::Table(_) => Node::Table(TableNode::new(
                    vec![hash],
                    default_format,
                    leaf.metadata.clone(),
                )?),
                Payload::Bytes(_) => {
                    Node::File(FileNode::new(vec![hash], leaf.metadata.clone())?)
                }
            })
        }
    }
}
