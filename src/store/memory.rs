//! In-memory object store
//!
//! Keeps payloads in a map keyed by their content hash. Used by tests and
//! for ephemeral authoring sessions that never touch disk.

use crate::manifest::node::ObjectHash;
use crate::package::value::Payload;
use crate::store::{ContentStore, ObjectSink};
use anyhow::anyhow;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// An object store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<Vec<u8>, Payload>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of distinct objects held.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectSink for MemoryStore {
    fn put(&self, payload: &Payload) -> anyhow::Result<ObjectHash> {
        let bytes = bincode::serialize(payload)?;
        let digest = Sha256::digest(&bytes).to_vec();
        self.objects
            .write()
            .insert(digest.clone(), payload.clone());
        ObjectHash::from_bytes(digest).map_err(anyhow::Error::new)
    }
}

impl ContentStore for MemoryStore {
    fn fetch(&self, hash: &ObjectHash) -> anyhow::Result<Payload> {
        self.objects
            .read()
            .get(hash.as_bytes())
            .cloned()
            .ok_or_else(|| anyhow!("object {} not found", hash))
    }

    fn exists(&self, hash: &ObjectHash) -> anyhow::Result<bool> {
        Ok(self.objects.read().contains_key(hash.as_bytes()))
    }
}
