//! CSV node
//!
//! Parses CSV text into an array of string-keyed records. The header row
//! defines the keys; every field stays a string, matching the loosely
//! typed record model downstream nodes coerce from.

use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::Value;

pub struct CsvNode;

impl CsvNode {
    pub const TYPE: &'static str = "csv";
    pub const SOCKET_TEXT: &'static str = "text";
    pub const SOCKET_RECORDS: &'static str = "records";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "CSV".to_string(),
            description: "Parses CSV text into records keyed by the header row".to_string(),
            inputs: vec![SocketMetadata::required(
                Self::SOCKET_TEXT,
                "Text",
                SocketType::Text,
            )],
            outputs: vec![SocketMetadata::optional(
                Self::SOCKET_RECORDS,
                "Records",
                SocketType::Records,
            )],
        }
    }

    fn parse(text: &str) -> Result<Vec<Value>, ProcessorError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ProcessorError::invalid_input(format!("malformed CSV: {}", e)))?
            .clone();

        let mut records = Vec::new();
        for result in reader.records() {
            let row =
                result.map_err(|e| ProcessorError::invalid_input(format!("malformed CSV: {}", e)))?;
            let mut object = serde_json::Map::new();
            for (index, field) in row.iter().enumerate() {
                let key = headers
                    .get(index)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("column_{}", index + 1));
                object.insert(key, Value::String(field.to_string()));
            }
            records.push(Value::Object(object));
        }
        Ok(records)
    }
}

impl NodeProcessor for CsvNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let text = ctx.require_text(Self::SOCKET_TEXT)?;
        let records = Self::parse(text)?;
        let count = records.len();
        Ok(ProcessorOutput::empty()
            .with(Self::SOCKET_RECORDS, Value::Array(records))
            .with_status(format!("{} row(s)", count)))
    }
}

inventory::submit!(ProcessorRegistration::new(CsvNode::descriptor, || {
    Arc::new(CsvNode) as Arc<dyn NodeProcessor>
}));
