//! JSON node
//!
//! Converts between JSON text and structured values. `mode` selects the
//! direction: `parse` (the default) turns text into a value, `stringify`
//! renders a value back to pretty-printed text.

use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::{json, Value};

pub struct JsonNode;

impl JsonNode {
    pub const TYPE: &'static str = "json";
    pub const SOCKET_TEXT: &'static str = "text";
    pub const SOCKET_DATA: &'static str = "data";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "JSON".to_string(),
            description: "Parses JSON text, or stringifies a structured value".to_string(),
            inputs: vec![
                SocketMetadata::optional(Self::SOCKET_TEXT, "Text", SocketType::Text),
                SocketMetadata::optional(Self::SOCKET_DATA, "Data", SocketType::Json),
            ],
            outputs: vec![
                SocketMetadata::optional(Self::SOCKET_DATA, "Data", SocketType::Json),
                SocketMetadata::optional(Self::SOCKET_TEXT, "Text", SocketType::Text),
            ],
        }
    }
}

impl NodeProcessor for JsonNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        match ctx.param_or("mode", "parse") {
            "parse" => {
                // Connected text wins over the node's own text area
                let text = match ctx.input(Self::SOCKET_TEXT) {
                    Some(value) => value.as_str().map(str::to_string).ok_or_else(|| {
                        ProcessorError::invalid_input("input 'text' is not text")
                    })?,
                    None => ctx.param_or(Self::SOCKET_TEXT, "").to_string(),
                };
                if text.trim().is_empty() {
                    return Err(ProcessorError::MissingInput(Self::SOCKET_TEXT.to_string()));
                }
                let data: Value = serde_json::from_str(&text)
                    .map_err(|e| ProcessorError::invalid_input(format!("invalid JSON: {}", e)))?;
                let summary = summarize(&data);
                Ok(ProcessorOutput::empty()
                    .with(Self::SOCKET_DATA, data)
                    .with_status(summary))
            }
            "stringify" => {
                let data = ctx.require_input(Self::SOCKET_DATA)?;
                let text = serde_json::to_string_pretty(data)
                    .map_err(|e| ProcessorError::invalid_input(format!("unserializable value: {}", e)))?;
                Ok(ProcessorOutput::empty().with(Self::SOCKET_TEXT, json!(text)))
            }
            other => Err(ProcessorError::bad_parameter(format!(
                "unknown mode '{}'",
                other
            ))),
        }
    }
}

fn summarize(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(map) => format!("object with {} key(s)", map.len()),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Null => "null".to_string(),
    }
}

inventory::submit!(ProcessorRegistration::new(JsonNode::descriptor, || {
    Arc::new(JsonNode) as Arc<dyn NodeProcessor>
}));
