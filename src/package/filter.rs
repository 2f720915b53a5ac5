//! Structural filters
//!
//! A tagged filter evaluated by one recursive matcher: exact name match,
//! nested metadata submap match, an arbitrary predicate capability, and
//! boolean combinators. The declarative JSON spec form `{name?, meta?}`
//! parses into the same representation.

use crate::error::ValidationError;
use crate::manifest::node::Metadata;
use crate::package::node::PackageEntry;
use serde_json::Value;
use std::fmt;

/// Predicate over a candidate entry and its name within the parent group.
pub type Predicate = dyn Fn(&PackageEntry, &str) -> bool + Send + Sync;

/// A filter over package entries.
pub enum Filter {
    /// Matches entries with exactly this name.
    ByName(String),
    /// Matches entries whose metadata contains this submapping: every
    /// declared key must be present and equal, recursing into nested
    /// objects.
    ByMetadata(Metadata),
    /// An arbitrary predicate capability.
    Predicate(Box<Predicate>),
    /// Matches when every inner filter matches. Empty matches everything.
    And(Vec<Filter>),
    /// Matches when any inner filter matches. Empty matches nothing.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Filter::ByName(name.into())
    }

    pub fn by_metadata(meta: Metadata) -> Self {
        Filter::ByMetadata(meta)
    }

    pub fn predicate(f: impl Fn(&PackageEntry, &str) -> bool + Send + Sync + 'static) -> Self {
        Filter::Predicate(Box::new(f))
    }

    /// Parse the declarative spec form: a JSON object with optional
    /// `name` (string) and `meta` (object) keys. Unknown keys are
    /// rejected. An empty spec matches everything.
    pub fn from_spec(spec: &Value) -> Result<Self, ValidationError> {
        let obj = spec
            .as_object()
            .ok_or_else(|| ValidationError::Wire("filter spec must be an object".to_string()))?;

        let mut parts = Vec::new();
        for (key, value) in obj {
            match key.as_str() {
                "name" => {
                    let name = value.as_str().ok_or_else(|| {
                        ValidationError::Wire("filter name must be a string".to_string())
                    })?;
                    parts.push(Filter::ByName(name.to_string()));
                }
                "meta" => {
                    let meta = value.as_object().ok_or_else(|| {
                        ValidationError::Wire("filter meta must be an object".to_string())
                    })?;
                    parts.push(Filter::ByMetadata(meta.clone()));
                }
                other => return Err(ValidationError::InvalidFilter(other.to_string())),
            }
        }
        Ok(Filter::And(parts))
    }

    /// Evaluate this filter against one entry and its name.
    pub fn matches(&self, entry: &PackageEntry, name: &str) -> bool {
        match self {
            Filter::ByName(expected) => name == expected,
            Filter::ByMetadata(expected) => meta_matches(entry.metadata(), expected),
            Filter::Predicate(pred) => pred(entry, name),
            Filter::And(parts) => parts.iter().all(|f| f.matches(entry, name)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(entry, name)),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            Filter::ByMetadata(meta) => f.debug_tuple("ByMetadata").field(meta).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
            Filter::And(parts) => f.debug_tuple("And").field(parts).finish(),
            Filter::Or(parts) => f.debug_tuple("Or").field(parts).finish(),
        }
    }
}

fn meta_matches(actual: &Metadata, expected: &Metadata) -> bool {
    expected
        .iter()
        .all(|(key, value)| value_matches(actual.get(key), value))
}

fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Object(exp) => match actual {
            Some(Value::Object(act)) => exp
                .iter()
                .all(|(key, value)| value_matches(act.get(key), value)),
            _ => false,
        },
        other => actual == Some(other),
    }
}
