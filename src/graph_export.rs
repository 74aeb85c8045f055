//! Graph export for inspecting a provider before it is built.
//!
//! [`Provider::describe`](crate::Provider::describe) and
//! [`AsyncProvider::describe`](crate::AsyncProvider::describe) return a
//! [`ProviderGraph`]: one node per pending factory (in registration order)
//! followed by one node per seed value (in key order). The DOT rendering is
//! always available; JSON requires the `graph-export` feature.

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::shape::ProducerShape;

/// Whether a node still has to be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "graph-export", serde(rename_all = "snake_case"))]
pub enum NodeState {
    /// A registered factory not yet invoked
    Pending,
    /// A fixed value supplied up front
    Seeded,
}

/// A key of the provider together with what is known about it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Display form of the key
    pub key: String,
    pub state: NodeState,
    /// Display forms of the input keys, in parameter order
    pub inputs: Vec<String>,
    /// Producer shape; `None` for seeded values
    pub shape: Option<ProducerShape>,
}

/// Snapshot of a provider's pending factories and seed values.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{NodeState, Provider};
/// use std::sync::Arc;
///
/// struct Settings;
/// struct Database;
///
/// let mut provider = Provider::new().with_value(Settings);
/// provider.include(|_: Arc<Settings>| Database).unwrap();
///
/// let graph = provider.describe();
/// assert_eq!(graph.nodes.len(), 2);
/// assert_eq!(graph.nodes[0].state, NodeState::Pending);
/// assert_eq!(graph.edges().count(), 1);
/// assert!(graph.to_dot().contains("->"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct ProviderGraph {
    pub nodes: Vec<GraphNode>,
}

impl ProviderGraph {
    /// Node for the key displayed as `key`.
    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    /// Dependency edges as `(dependent, dependency)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|n| n.inputs.iter().map(move |i| (n.key.as_str(), i.as_str())))
    }

    /// Input keys that no node provides; a build would fail on them.
    pub fn missing_inputs(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .edges()
            .map(|(_, dependency)| dependency)
            .filter(|dependency| self.node(dependency).is_none())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph Provider {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in &self.nodes {
            let (style, label) = match (node.state, node.shape) {
                (NodeState::Seeded, _) => ("dashed", "seeded".to_string()),
                (NodeState::Pending, Some(shape)) => ("solid", format!("{:?}", shape)),
                (NodeState::Pending, None) => ("solid", "pending".to_string()),
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n({})\", style={}];\n",
                node.key, node.key, label, style
            ));
        }

        output.push('\n');

        for (from, to) in self.edges() {
            output.push_str(&format!("  \"{}\" -> \"{}\";\n", from, to));
        }

        output.push_str("}\n");
        output
    }

    /// Serialises the graph as pretty-printed JSON.
    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> crate::DiResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::DiError::Configuration(format!("graph serialization failed: {}", e)))
    }
}
