//! Filesystem object store
//!
//! Content-addressed payload storage using a fan-out directory layout:
//! `{root}/objects/{hex[0..2]}/{hex}.obj`, with manifests stored as wire
//! JSON at `{root}/manifests/{top_hash}.json`. Objects are written
//! atomically (tmp file + rename) and verified against their digest on
//! read, so corruption surfaces as an error instead of bad data.

use crate::manifest::codec;
use crate::manifest::hasher;
use crate::manifest::node::{Node, ObjectHash};
use crate::package::value::Payload;
use crate::store::{ContentStore, ObjectSink};
use anyhow::{anyhow, Context};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Content-addressed object and manifest storage on the local filesystem.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (or create) a store rooted at the given directory.
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("objects"))
            .with_context(|| format!("failed to create object directory under {:?}", root))?;
        fs::create_dir_all(root.join("manifests"))
            .with_context(|| format!("failed to create manifest directory under {:?}", root))?;
        Ok(FsObjectStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, hash: &ObjectHash) -> PathBuf {
        let hex = hash.to_hex();
        let fanout = &hex[..hex.len().min(2)];
        self.root
            .join("objects")
            .join(fanout)
            .join(format!("{}.obj", hex))
    }

    fn manifest_path(&self, top_hash: &str) -> PathBuf {
        self.root.join("manifests").join(format!("{}.json", top_hash))
    }

    /// Persist an encoded manifest under its top hash and return the hash.
    pub fn save_manifest(&self, root: &Node) -> anyhow::Result<String> {
        let top_hash = hasher::hash_contents(root);
        let wire = codec::encode_string(root)?;
        let path = self.manifest_path(&top_hash);
        write_atomic(&path, wire.as_bytes())?;
        debug!(top_hash = %top_hash, "Saved manifest");
        Ok(top_hash)
    }

    /// Load a manifest previously saved under a top hash.
    pub fn load_manifest(&self, top_hash: &str) -> anyhow::Result<Node> {
        let path = self.manifest_path(top_hash);
        let wire = fs::read_to_string(&path)
            .with_context(|| format!("manifest {} not found in store", top_hash))?;
        Ok(codec::decode_str(&wire)?)
    }

    /// List the top hashes of every stored manifest.
    pub fn list_manifests(&self) -> anyhow::Result<Vec<String>> {
        let mut hashes = Vec::new();
        for entry in fs::read_dir(self.root.join("manifests"))? {
            let path = entry?.path();
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                hashes.push(stem.to_string());
            }
        }
        hashes.sort();
        Ok(hashes)
    }
}

impl ObjectSink for FsObjectStore {
    fn put(&self, payload: &Payload) -> anyhow::Result<ObjectHash> {
        let bytes = bincode::serialize(payload).context("failed to serialize payload")?;
        let digest = Sha256::digest(&bytes);
        let hash = ObjectHash::from_bytes(digest.to_vec()).map_err(anyhow::Error::new)?;

        let path = self.object_path(&hash);
        if path.exists() {
            // Same hash, same bytes: deduplicated.
            trace!(hash = %hash, "Object already stored");
            return Ok(hash);
        }
        write_atomic(&path, &bytes)?;
        debug!(hash = %hash, size = bytes.len(), "Stored object");
        Ok(hash)
    }
}

impl ContentStore for FsObjectStore {
    fn fetch(&self, hash: &ObjectHash) -> anyhow::Result<Payload> {
        let path = self.object_path(hash);
        let bytes = fs::read(&path).with_context(|| format!("object {} not found", hash))?;

        let digest = Sha256::digest(&bytes);
        if digest.as_slice() != hash.as_bytes() {
            return Err(anyhow!(
                "object {} failed digest verification: stored bytes hash to {}",
                hash,
                hex::encode(digest)
            ));
        }

        let payload: Payload =
            bincode::deserialize(&bytes).with_context(|| format!("object {} is malformed", hash))?;
        trace!(hash = %hash, "Fetched object");
        Ok(payload)
    }

    fn exists(&self, hash: &ObjectHash) -> anyhow::Result<bool> {
        Ok(self.object_path(hash).exists())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path {:?} has no parent directory", path))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {:?}", parent))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to rename {:?} into place", tmp))?;
    Ok(())
}
