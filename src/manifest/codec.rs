//! JSON wire codec for manifest nodes
//!
//! One JSON object per node: `type` plus `children` for groups or
//! `format`/`hashes` for leaves. The `metadata` key is omitted when the
//! metadata map is empty; old consumers reject an empty metadata object,
//! so one is never emitted.

use crate::error::ValidationError;
use crate::manifest::node::{FileNode, GroupNode, Node, TableFormat, TableNode};
use serde_json::{json, Map, Value};

/// Encode a node (and its subtree) into the wire form.
pub fn encode(node: &Node) -> Value {
    let mut wire = Map::new();
    wire.insert("type".to_string(), json!(node.type_tag()));
    if !node.metadata().is_empty() {
        wire.insert("metadata".to_string(), Value::Object(node.metadata().clone()));
    }
    match node {
        Node::Root(group) | Node::Group(group) => {
            let children: Map<String, Value> = group
                .children()
                .iter()
                .map(|(name, child)| (name.clone(), encode(child)))
                .collect();
            wire.insert("children".to_string(), Value::Object(children));
        }
        Node::Table(table) => {
            wire.insert("format".to_string(), json!(table.format().as_str()));
            let hashes: Vec<Value> = table.hashes().iter().map(|h| json!(h.to_hex())).collect();
            wire.insert("hashes".to_string(), Value::Array(hashes));
        }
        Node::File(file) => {
            let hashes: Vec<Value> = file.hashes().iter().map(|h| json!(h.to_hex())).collect();
            wire.insert("hashes".to_string(), Value::Array(hashes));
        }
    }
    Value::Object(wire)
}

/// Encode a node into a wire JSON string.
pub fn encode_string(node: &Node) -> Result<String, ValidationError> {
    Ok(serde_json::to_string(&encode(node))?)
}

/// Decode a wire object back into a typed node.
///
/// Fails with `UnknownNodeType` on an unrecognized `type` tag and with
/// the usual construction errors on malformed names, hashes, or formats.
pub fn decode(wire: &Value) -> Result<Node, ValidationError> {
    let obj = wire
        .as_object()
        .ok_or_else(|| ValidationError::Wire("expected a JSON object".to_string()))?;

    let type_tag = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::Wire("missing type tag".to_string()))?;

    let metadata = match obj.get("metadata") {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(ValidationError::Wire("metadata must be an object".to_string())),
    };

    match type_tag {
        "ROOT" | "GROUP" => {
            let mut group = GroupNode::with_metadata(metadata);
            if let Some(children) = obj.get("children") {
                let children = children.as_object().ok_or_else(|| {
                    ValidationError::Wire("children must be an object".to_string())
                })?;
                for (name, child) in children {
                    group.insert(name, decode(child)?)?;
                }
            }
            Ok(if type_tag == "ROOT" {
                Node::Root(group)
            } else {
                Node::Group(group)
            })
        }
        "TABLE" => {
            let format = obj
                .get("format")
                .and_then(Value::as_str)
                .ok_or_else(|| ValidationError::Wire("table missing format".to_string()))?;
            let hashes = decode_hashes(obj)?;
            Ok(Node::Table(TableNode::from_hex(
                &hashes,
                TableFormat::parse(format)?,
                metadata,
            )?))
        }
        "FILE" => {
            let hashes = decode_hashes(obj)?;
            Ok(Node::File(FileNode::from_hex(&hashes, metadata)?))
        }
        other => Err(ValidationError::UnknownNodeType(other.to_string())),
    }
}

/// Decode a wire JSON string back into a typed node.
pub fn decode_str(wire: &str) -> Result<Node, ValidationError> {
    let value: Value = serde_json::from_str(wire)?;
    decode(&value)
}

fn decode_hashes(obj: &Map<String, Value>) -> Result<Vec<&str>, ValidationError> {
    let hashes = obj
        .get("hashes")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::Wire("leaf missing hashes list".to_string()))?;
    hashes
        .iter()
        .map(|h| {
            h.as_str()
                .ok_or_else(|| ValidationError::Wire("hashes must be strings".to_string()))
        })
        .collect()
}
