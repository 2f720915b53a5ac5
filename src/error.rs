//! Error types for the package manifest model.

use thiserror::Error;

/// Errors raised while constructing or decoding manifest trees.
///
/// Every variant is raised synchronously at construction, mutation, or
/// decoding time, so a tree that builds successfully is always hashable
/// and encodable.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid node name: {0:?}")]
    InvalidName(String),

    #[error("malformed object hash: {0:?}")]
    MalformedHash(String),

    #[error("table and file nodes require at least one object hash")]
    EmptyHashes,

    #[error("unknown node type: {0:?}")]
    UnknownNodeType(String),

    #[error("unknown table format: {0:?}")]
    UnknownFormat(String),

    #[error("expected a relative path, but received {0:?}")]
    AbsolutePath(String),

    #[error("manifest root must be a group node, got {0}")]
    RootNotGroup(&'static str),

    #[error("row has {actual} values, table has {expected} columns")]
    RowShape { expected: usize, actual: usize },

    #[error("unexpected key in filter spec: {0:?}")]
    InvalidFilter(String),

    #[error("malformed manifest wire form: {0}")]
    Wire(String),

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runtime errors raised by the package tree and its collaborators.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no child named {0:?}")]
    UnknownChild(String),

    #[error("cannot attach {0:?} under a leaf node")]
    InvalidAssignment(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    /// A content-store collaborator failure, propagated unmodified as the
    /// error source so callers can distinguish storage failures from
    /// manifest-model failures.
    #[error("object store failure")]
    Store(#[source] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for TreeError {
    fn from(err: config::ConfigError) -> Self {
        TreeError::Config(err.to_string())
    }
}
