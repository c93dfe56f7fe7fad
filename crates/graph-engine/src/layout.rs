//! Container layout
//!
//! Container-type nodes hold an ordered `children` list and lay their
//! children out with a single algorithm: a vertical stack at fixed
//! padding, with the container's height growing to fit. Reflow runs on
//! child resize, reparenting, and container resize.

use crate::error::{EngineError, Result};
use crate::graph::Graph;
use crate::registry::NodeRegistry;
use crate::types::{NodeId, Position};

/// Layout tuning for container nodes
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Gap between the container edge and children, and between children
    pub padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { padding: 16.0 }
    }
}

/// Re-stack a container's children top-to-bottom and grow it to fit
///
/// Children keep their own sizes; only positions change. If the
/// container's height changes and it is itself nested, the parent reflows
/// too, so growth bubbles up the containment chain.
pub fn reflow(graph: &mut Graph, container_id: &str, config: &LayoutConfig) {
    let Some(container) = graph.node(container_id) else {
        return;
    };
    let children: Vec<NodeId> = container.children.clone();
    if children.is_empty() {
        return;
    }
    let origin = container.position;
    let container_parent = container.parent_id.clone();
    let old_height = container.size.height;

    let mut y = origin.y + config.padding;
    let mut nested_containers = Vec::new();
    for child_id in &children {
        if let Some(child) = graph.node_mut(child_id) {
            child.position = Position::new(origin.x + config.padding, y);
            y += child.size.height + config.padding;
            if !child.children.is_empty() {
                nested_containers.push(child_id.clone());
            }
        }
    }

    // Moved containers carry their own children with them
    for nested in nested_containers {
        reflow(graph, &nested, config);
    }

    let needed_height = y - origin.y;
    if let Some(container) = graph.node_mut(container_id) {
        container.size.height = needed_height;
    }
    if (needed_height - old_height).abs() > f64::EPSILON {
        if let Some(parent_id) = container_parent {
            reflow(graph, &parent_id, config);
        }
    }
}

/// Move a node into a container (or to the root with `None`)
///
/// Detaches the node from its previous parent, reflowing it, then appends
/// to the new parent's `children` and reflows that container. Rejects
/// reparenting a container into itself or one of its own descendants.
pub fn set_parent(
    graph: &mut Graph,
    child_id: &str,
    new_parent: Option<&str>,
    config: &LayoutConfig,
) -> Result<()> {
    if graph.node(child_id).is_none() {
        return Err(EngineError::UnknownNode(child_id.to_string()));
    }
    if let Some(parent_id) = new_parent {
        if graph.node(parent_id).is_none() {
            return Err(EngineError::UnknownNode(parent_id.to_string()));
        }
        if parent_id == child_id || is_descendant(graph, child_id, parent_id) {
            return Err(EngineError::InvalidReparent(format!(
                "'{}' cannot contain its own ancestor '{}'",
                parent_id, child_id
            )));
        }
    }

    // Detach from the previous parent
    let old_parent = graph
        .node(child_id)
        .and_then(|n| n.parent_id.clone());
    if let Some(old_parent_id) = &old_parent {
        if let Some(parent) = graph.node_mut(old_parent_id) {
            parent.children.retain(|c| c != child_id);
        }
    }

    match new_parent {
        Some(parent_id) => {
            if let Some(child) = graph.node_mut(child_id) {
                child.parent_id = Some(parent_id.to_string());
            }
            if let Some(parent) = graph.node_mut(parent_id) {
                parent.children.push(child_id.to_string());
            }
        }
        None => {
            if let Some(child) = graph.node_mut(child_id) {
                child.parent_id = None;
            }
        }
    }

    if let Some(old_parent_id) = &old_parent {
        reflow(graph, old_parent_id, config);
    }
    if let Some(parent_id) = new_parent {
        reflow(graph, parent_id, config);
    }
    Ok(())
}

/// Reparent a node by its dropped position
///
/// If the node's center lies inside a container's bounds, the node moves
/// into that container; otherwise it detaches to the root. When several
/// containers overlap the drop point, the last one in table order wins
/// (the one rendered on top). Returns whether the parent changed.
pub fn reparent_at(
    graph: &mut Graph,
    registry: &NodeRegistry,
    node_id: &str,
    config: &LayoutConfig,
) -> Result<bool> {
    let Some(node) = graph.node(node_id) else {
        return Err(EngineError::UnknownNode(node_id.to_string()));
    };
    let center = node.center();
    let current_parent = node.parent_id.clone();

    let target: Option<NodeId> = graph
        .nodes()
        .iter()
        .filter(|candidate| {
            candidate.id != node_id
                && registry.is_container(&candidate.node_type)
                && candidate.contains_point(center)
                && !is_descendant(graph, node_id, &candidate.id)
        })
        .map(|candidate| candidate.id.clone())
        .last();

    if target == current_parent {
        return Ok(false);
    }
    set_parent(graph, node_id, target.as_deref(), config)?;
    Ok(true)
}

/// Whether `node_id` sits somewhere below `ancestor_id` in the containment
/// tree
fn is_descendant(graph: &Graph, ancestor_id: &str, node_id: &str) -> bool {
    let mut current = graph.node(node_id).and_then(|n| n.parent_id.clone());
    while let Some(id) = current {
        if id == ancestor_id {
            return true;
        }
        current = graph.node(&id).and_then(|n| n.parent_id.clone());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::descriptor::{NodeCategory, NodeMetadata};
    use crate::registry::ProcessorOutput;
    use crate::types::Position;

    fn registry_with_group() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register_fn(
            NodeMetadata {
                node_type: "group".to_string(),
                category: NodeCategory::Container,
                label: "Group".to_string(),
                description: String::new(),
                inputs: vec![],
                outputs: vec![],
            },
            |_ctx| Ok(ProcessorOutput::empty()),
        );
        registry
    }

    fn stacked_graph() -> Graph {
        GraphBuilder::new()
            .node("g", "group", Position::new(100.0, 100.0))
            .with_size(300.0, 80.0)
            .node("a", "text", Position::new(500.0, 0.0))
            .with_size(220.0, 100.0)
            .node("b", "text", Position::new(600.0, 0.0))
            .with_size(220.0, 60.0)
            .child_of("a", "g")
            .child_of("b", "g")
            .build()
    }

    #[test]
    fn test_reflow_stacks_children_vertically() {
        let mut graph = stacked_graph();
        let config = LayoutConfig::default();
        reflow(&mut graph, "g", &config);

        let a = graph.node("a").unwrap();
        assert_eq!(a.position, Position::new(116.0, 116.0));

        let b = graph.node("b").unwrap();
        assert_eq!(b.position, Position::new(116.0, 232.0));

        // padding + 100 + padding + 60 + padding
        let g = graph.node("g").unwrap();
        assert_eq!(g.size.height, 208.0);
    }

    #[test]
    fn test_reflow_bubbles_up_through_nested_containers() {
        let mut graph = GraphBuilder::new()
            .node("outer", "group", Position::new(0.0, 0.0))
            .with_size(400.0, 100.0)
            .node("inner", "group", Position::new(0.0, 0.0))
            .with_size(300.0, 50.0)
            .node("a", "text", Position::new(0.0, 0.0))
            .with_size(220.0, 120.0)
            .child_of("inner", "outer")
            .child_of("a", "inner")
            .build();

        let config = LayoutConfig::default();
        reflow(&mut graph, "inner", &config);

        // inner grew to fit "a"; outer grew to fit inner
        let inner = graph.node("inner").unwrap();
        assert_eq!(inner.size.height, 152.0);
        let outer = graph.node("outer").unwrap();
        assert_eq!(outer.size.height, 184.0);
    }

    #[test]
    fn test_set_parent_moves_between_containers() {
        let mut graph = GraphBuilder::new()
            .node("g1", "group", Position::new(0.0, 0.0))
            .node("g2", "group", Position::new(500.0, 0.0))
            .node("a", "text", Position::new(10.0, 10.0))
            .child_of("a", "g1")
            .build();

        let config = LayoutConfig::default();
        set_parent(&mut graph, "a", Some("g2"), &config).unwrap();

        assert!(graph.node("g1").unwrap().children.is_empty());
        assert_eq!(graph.node("g2").unwrap().children, vec!["a".to_string()]);
        assert_eq!(graph.node("a").unwrap().parent_id.as_deref(), Some("g2"));
    }

    #[test]
    fn test_set_parent_rejects_containment_cycle() {
        let mut graph = GraphBuilder::new()
            .node("outer", "group", Position::new(0.0, 0.0))
            .node("inner", "group", Position::new(10.0, 10.0))
            .child_of("inner", "outer")
            .build();

        let config = LayoutConfig::default();
        let result = set_parent(&mut graph, "outer", Some("inner"), &config);
        assert!(matches!(result, Err(EngineError::InvalidReparent(_))));
    }

    #[test]
    fn test_reparent_at_drops_into_container_under_center() {
        let mut graph = GraphBuilder::new()
            .node("g", "group", Position::new(0.0, 0.0))
            .with_size(400.0, 300.0)
            .node("a", "text", Position::new(50.0, 50.0))
            .with_size(100.0, 60.0)
            .build();
        let registry = registry_with_group();
        let config = LayoutConfig::default();

        let changed = reparent_at(&mut graph, &registry, "a", &config).unwrap();
        assert!(changed);
        assert_eq!(graph.node("a").unwrap().parent_id.as_deref(), Some("g"));

        // Dropping far outside detaches back to the root
        graph.node_mut("a").unwrap().position = Position::new(1000.0, 1000.0);
        let changed = reparent_at(&mut graph, &registry, "a", &config).unwrap();
        assert!(changed);
        assert_eq!(graph.node("a").unwrap().parent_id, None);
    }

    #[test]
    fn test_reparent_at_keeps_current_parent_when_unmoved() {
        let mut graph = GraphBuilder::new()
            .node("g", "group", Position::new(0.0, 0.0))
            .with_size(400.0, 300.0)
            .node("a", "text", Position::new(50.0, 50.0))
            .with_size(100.0, 60.0)
            .child_of("a", "g")
            .build();
        let registry = registry_with_group();
        let config = LayoutConfig::default();

        let changed = reparent_at(&mut graph, &registry, "a", &config).unwrap();
        assert!(!changed);
    }
}
