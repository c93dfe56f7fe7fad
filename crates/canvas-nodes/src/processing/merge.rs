//! Merge node
//!
//! Two-input equi-join over record arrays. The `key` parameter names the
//! join field; `left=right` syntax joins differing field names. Keys are
//! compared by string coercion, matching the loosely typed record model.

use std::collections::HashMap;
use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::Value;

pub struct MergeNode;

impl MergeNode {
    pub const TYPE: &'static str = "merge";
    pub const SOCKET_LEFT: &'static str = "left";
    pub const SOCKET_RIGHT: &'static str = "right";
    pub const SOCKET_RECORDS: &'static str = "records";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Merge".to_string(),
            description: "Equi-joins two record arrays on a key field".to_string(),
            inputs: vec![
                SocketMetadata::required(Self::SOCKET_LEFT, "Left", SocketType::Records),
                SocketMetadata::required(Self::SOCKET_RIGHT, "Right", SocketType::Records),
            ],
            outputs: vec![SocketMetadata::optional(
                Self::SOCKET_RECORDS,
                "Records",
                SocketType::Records,
            )],
        }
    }
}

impl NodeProcessor for MergeNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let left = ctx.require_records(Self::SOCKET_LEFT)?;
        let right = ctx.require_records(Self::SOCKET_RIGHT)?;

        let key = ctx.param_or("key", "");
        if key.trim().is_empty() {
            return Err(ProcessorError::bad_parameter("join key is required"));
        }
        let (left_key, right_key) = match key.split_once('=') {
            Some((l, r)) => (l.trim(), r.trim()),
            None => (key.trim(), key.trim()),
        };
        if left_key.is_empty() || right_key.is_empty() {
            return Err(ProcessorError::bad_parameter(format!(
                "malformed join key '{}'",
                key
            )));
        }

        // Index the right side by key string
        let mut by_key: HashMap<String, Vec<&Value>> = HashMap::new();
        for record in right {
            if let Some(value) = record.get(right_key) {
                by_key.entry(key_string(value)).or_default().push(record);
            }
        }

        let mut joined = Vec::new();
        for record in left {
            let Some(value) = record.get(left_key) else {
                continue;
            };
            let Some(matches) = by_key.get(&key_string(value)) else {
                continue;
            };
            for partner in matches {
                joined.push(merge_records(record, partner));
            }
        }

        let status = format!("joined {} row(s)", joined.len());
        Ok(ProcessorOutput::empty()
            .with(Self::SOCKET_RECORDS, Value::Array(joined))
            .with_status(status))
    }
}

/// Left fields first; right fields win on collision
fn merge_records(left: &Value, right: &Value) -> Value {
    let mut object = match left {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    if let Value::Object(map) = right {
        for (key, value) in map {
            object.insert(key.clone(), value.clone());
        }
    }
    Value::Object(object)
}

/// Join keys compare by their text-field rendering, so `1` joins `"1"`
fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

inventory::submit!(ProcessorRegistration::new(MergeNode::descriptor, || {
    Arc::new(MergeNode) as Arc<dyn NodeProcessor>
}));
