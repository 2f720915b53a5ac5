//! Object store collaborators
//!
//! The package tree never performs network or disk I/O itself; leaf
//! payloads are fetched from and written to a store collaborator behind
//! these traits. A store's retry/backoff policy is its own responsibility;
//! its failures propagate to callers unmodified.

pub mod fs;
pub mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryStore;

use crate::manifest::node::ObjectHash;
use crate::package::value::Payload;

/// Read half: consumed by the package tree during leaf materialization.
pub trait ContentStore: Send + Sync {
    /// Fetch the payload stored under an object hash.
    fn fetch(&self, hash: &ObjectHash) -> anyhow::Result<Payload>;

    /// Report whether an object exists without fetching it.
    fn exists(&self, hash: &ObjectHash) -> anyhow::Result<bool>;

    /// Whether individual objects can be fetched independently.
    ///
    /// Archive-style stores that only stream a whole package cannot, and
    /// group materialization is undefined over them.
    fn supports_random_access(&self) -> bool {
        true
    }
}

/// Write half: consumed when publishing an authored tree.
pub trait ObjectSink {
    /// Store a payload and return its content hash.
    fn put(&self, payload: &Payload) -> anyhow::Result<ObjectHash>;
}
