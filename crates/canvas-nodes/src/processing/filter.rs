//! Filter node
//!
//! Keeps the records matching a predicate expression. The predicate uses
//! the safe expression language from [`crate::expr`], with the record's
//! fields in scope.

use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::Value;

use crate::expr::Expr;

pub struct FilterNode;

impl FilterNode {
    pub const TYPE: &'static str = "filter";
    pub const SOCKET_RECORDS: &'static str = "records";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Filter".to_string(),
            description: "Keeps records matching a predicate expression".to_string(),
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

impl NodeProcessor for FilterNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let records = ctx.require_records(Self::SOCKET_RECORDS)?;
        let source = ctx.param_or("predicate", "");
        if source.trim().is_empty() {
            // No predicate keeps everything
            return Ok(ProcessorOutput::empty()
                .with(Self::SOCKET_RECORDS, Value::Array(records.clone()))
                .with_status(format!("kept {} of {}", records.len(), records.len())));
        }

        let predicate = Expr::parse(source)
            .map_err(|e| ProcessorError::bad_parameter(format!("invalid predicate: {}", e)))?;

        let total = records.len();
        let mut kept = Vec::new();
        for record in records {
            let matches = predicate
                .matches(record)
                .map_err(|e| ProcessorError::bad_parameter(format!("predicate failed: {}", e)))?;
            if matches {
                kept.push(record.clone());
            }
        }

        let status = format!("kept {} of {}", kept.len(), total);
        Ok(ProcessorOutput::empty()
            .with(Self::SOCKET_RECORDS, Value::Array(kept))
            .with_status(status))
    }
}

inventory::submit!(ProcessorRegistration::new(FilterNode::descriptor, || {
    Arc::new(FilterNode) as Arc<dyn NodeProcessor>
}));
