//! Text node
//!
//! The basic source node: emits its user-edited `text` parameter. When
//! another node is wired into its input, the connected value passes
//! through instead, so text nodes double as inline viewers.

use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::json;

pub struct TextNode;

impl TextNode {
    pub const TYPE: &'static str = "text";
    /// Socket name for both the optional input and the output
    pub const SOCKET_TEXT: &'static str = "text";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Input,
            label: "Text".to_string(),
            description: "Emits its text content, or passes a connected value through".to_string(),
            inputs: vec![SocketMetadata::optional(
                Self::SOCKET_TEXT,
                "Text",
                SocketType::Text,
            )],
            outputs: vec![SocketMetadata::optional(
                Self::SOCKET_TEXT,
                "Text",
                SocketType::Text,
            )],
        }
    }
}

impl NodeProcessor for TextNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let text = match ctx.input(Self::SOCKET_TEXT) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => serde_json::to_string(other).unwrap_or_default(),
            None => ctx.param_or(Self::SOCKET_TEXT, "").to_string(),
        };
        Ok(ProcessorOutput::empty().with(Self::SOCKET_TEXT, json!(text)))
    }
}

inventory::submit!(ProcessorRegistration::new(TextNode::descriptor, || {
    Arc::new(TextNode) as Arc<dyn NodeProcessor>
}));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_emits_parameter() {
        let node = testing::node(TextNode::TYPE, json!({"text": "hello"}));
        let output = testing::run(&TextNode, &node, testing::inputs(&[])).unwrap();
        assert_eq!(output.outputs.get("text").unwrap(), &json!("hello"));
    }

    #[test]
    fn test_connected_input_takes_precedence() {
        let node = testing::node(TextNode::TYPE, json!({"text": "own"}));
        let output = testing::run(
            &TextNode,
            &node,
            testing::inputs(&[("text", json!("wired"))]),
        )
        .unwrap();
        assert_eq!(output.outputs.get("text").unwrap(), &json!("wired"));
    }

    #[test]
    fn test_structured_input_is_stringified() {
        let node = testing::node(TextNode::TYPE, json!({}));
        let output = testing::run(
            &TextNode,
            &node,
            testing::inputs(&[("text", json!({"a": 1}))]),
        )
        .unwrap();
        assert_eq!(output.outputs.get("text").unwrap(), &json!("{\"a\":1}"));
    }

    #[test]
    fn test_empty_without_parameter() {
        let node = testing::node(TextNode::TYPE, json!({}));
        let output = testing::run(&TextNode, &node, testing::inputs(&[])).unwrap();
        assert_eq!(output.outputs.get("text").unwrap(), &json!(""));
    }
}
