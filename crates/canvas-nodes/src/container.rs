//! Group container node
//!
//! The one container type: holds an ordered list of children that the
//! engine lays out as a vertical stack. Carries no data sockets; its
//! status line summarizes the child count.

use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata};

pub struct GroupNode;

impl GroupNode {
    pub const TYPE: &'static str = "group";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Container,
            label: "Group".to_string(),
            description: "Stacks nested nodes vertically".to_string(),
            inputs: vec![],
            outputs: vec![],
        }
    }
}

impl NodeProcessor for GroupNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let count = ctx.node().children.len();
        Ok(ProcessorOutput::empty().with_status(format!("{} item(s)", count)))
    }
}

inventory::submit!(ProcessorRegistration::new(GroupNode::descriptor, || {
    Arc::new(GroupNode) as Arc<dyn NodeProcessor>
}));
