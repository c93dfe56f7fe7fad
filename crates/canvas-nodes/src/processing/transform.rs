//! Transform node
//!
//! Maps every record through an expression. An object result replaces the
//! record wholesale; any other result is written to the `field` parameter
//! (default `"value"`) on a copy of the record.

use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::Value;

use crate::expr::Expr;

pub struct TransformNode;

impl TransformNode {
    pub const TYPE: &'static str = "transform";
    pub const SOCKET_RECORDS: &'static str = "records";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Transform".to_string(),
            description: "Maps each record through an expression".to_string(),
            inputs: vec![SocketMetadata::required(
                Self::SOCKET_RECORDS,
                "Records",
                SocketType::Records,
            )],
            outputs: vec![SocketMetadata::optional(
                Self::SOCKET_RECORDS,
                "Records",
                SocketType::Records,
            )],
        }
    }
}

impl NodeProcessor for TransformNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let records = ctx.require_records(Self::SOCKET_RECORDS)?;
        let source = ctx.param_or("expr", "");
        if source.trim().is_empty() {
            return Err(ProcessorError::bad_parameter("expression is required"));
        }
        let field = ctx.param_or("field", "value");

        let expr = Expr::parse(source)
            .map_err(|e| ProcessorError::bad_parameter(format!("invalid expression: {}", e)))?;

        let mut mapped = Vec::with_capacity(records.len());
        for record in records {
            let result = expr
                .eval(record)
                .map_err(|e| ProcessorError::bad_parameter(format!("expression failed: {}", e)))?;
            mapped.push(apply(record, field, result));
        }

        let status = format!("mapped {} record(s)", mapped.len());
        Ok(ProcessorOutput::empty()
            .with(Self::SOCKET_RECORDS, Value::Array(mapped))
            .with_status(status))
    }
}

/// Fold an expression result back into the record
fn apply(record: &Value, field: &str, result: Value) -> Value {
    match result {
        Value::Object(_) => result,
        other => {
            let mut object = match record {
                Value::Object(map) => map.clone(),
                _ => serde_json::Map::new(),
            };
            object.insert(field.to_string(), other);
            Value::Object(object)
        }
    }
}

inventory::submit!(ProcessorRegistration::new(
    TransformNode::descriptor,
    || Arc::new(TransformNode) as Arc<dyn NodeProcessor>
));
