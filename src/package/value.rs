//! Leaf payloads
//!
//! Materialized leaf content is either raw bytes (file leaves) or a small
//! tabular value (table leaves). Multi-shard leaves concatenate their
//! shards in stored order; group materialization merges descendant tables.

use crate::error::{TreeError, ValidationError};
use serde::{Deserialize, Serialize};

/// Materialized content of a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Raw file bytes.
    Bytes(Vec<u8>),
    /// Tabular data.
    Table(TableData),
}

impl Payload {
    /// Append another shard of the same payload kind.
    pub fn append(&mut self, other: &Payload) -> Result<(), TreeError> {
        match (self, other) {
            (Payload::Bytes(dst), Payload::Bytes(src)) => {
                dst.extend_from_slice(src);
                Ok(())
            }
            (Payload::Table(dst), Payload::Table(src)) => dst.concat(src),
            _ => Err(TreeError::NotSupported(
                "cannot combine tabular and byte shards".to_string(),
            )),
        }
    }
}

/// A minimal tabular value: named columns and rows of JSON values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableData {
    columns: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
}

impl TableData {
    pub fn new(columns: Vec<String>) -> Self {
        TableData {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; its arity must match the column count.
    pub fn push_row(&mut self, row: Vec<serde_json::Value>) -> Result<(), ValidationError> {
        if row.len() != self.columns.len() {
            return Err(ValidationError::RowShape {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append all rows of another table with identical columns.
    pub fn concat(&mut self, other: &TableData) -> Result<(), TreeError> {
        if self.columns != other.columns {
            return Err(TreeError::NotSupported(format!(
                "cannot merge tables with mismatched columns: {:?} vs {:?}",
                self.columns, other.columns
            )));
        }
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<serde_json::Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
