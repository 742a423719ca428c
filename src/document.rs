//! Graph document parsing structures
//!
//! A YAML description of a provenance graph:
//!
//! ```yaml
//! schema: graph2tab/graph@0.1
//! nodes:
//!   - { id: A, rank: 0 }
//!   - { id: B, rank: 1, label: Sample }
//! edges:
//!   - source: A
//!     target: [B]
//! frontier: [B]
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::Graph2TabError;
use crate::graph::{NodeId, NodeKey, ProvenanceGraph};
use crate::limits::TraversalLimits;

pub const SCHEMA: &str = "graph2tab/graph@0.1";

/// Graph document parsed from YAML
#[derive(Debug, Deserialize)]
pub struct GraphDocument {
    pub schema: String,
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    /// Node ids to start sink discovery from; every node when absent
    #[serde(default)]
    pub frontier: Option<Vec<String>>,
    #[serde(default)]
    pub limits: TraversalLimits,
}

#[derive(Debug, Deserialize)]
pub struct NodeDef {
    pub id: String,
    pub rank: u32,
    /// Table cell text, defaults to the id
    #[serde(default)]
    pub label: Option<String>,
}

impl NodeDef {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct EdgeDef {
    pub source: EdgeEndpoint,
    pub target: EdgeEndpoint,
}

/// Handles string OR array for source/target
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EdgeEndpoint {
    Single(String),
    Multiple(Vec<String>),
}

impl EdgeEndpoint {
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            EdgeEndpoint::Single(s) => vec![s.as_str()],
            EdgeEndpoint::Multiple(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// A validated document: the graph plus its frontier
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: ProvenanceGraph,
    pub frontier: Vec<NodeId>,
    pub limits: TraversalLimits,
    ids: FxHashMap<Arc<str>, NodeId>,
}

impl BuiltGraph {
    /// Resolve a document node id
    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }
}

impl GraphDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self, Graph2TabError> {
        let document: GraphDocument = serde_yaml::from_str(yaml)?;
        if document.schema != SCHEMA {
            return Err(Graph2TabError::InvalidSchema {
                expected: SCHEMA.to_string(),
                actual: document.schema,
            });
        }
        Ok(document)
    }

    /// Validate references and ranks, then build the graph
    pub fn build(&self) -> Result<BuiltGraph, Graph2TabError> {
        let mut graph = ProvenanceGraph::new();
        let mut ids: FxHashMap<Arc<str>, NodeId> =
            FxHashMap::with_capacity_and_hasher(self.nodes.len(), Default::default());
        let mut owners: FxHashMap<NodeKey, &str> = FxHashMap::default();

        for def in &self.nodes {
            if ids.contains_key(def.id.as_str()) {
                return Err(Graph2TabError::DuplicateNodeId { id: def.id.clone() });
            }

            let key = NodeKey::new(def.rank, def.label());
            if let Some(first) = owners.get(&key) {
                return Err(Graph2TabError::DuplicateNodeKey {
                    key,
                    first: first.to_string(),
                    second: def.id.clone(),
                });
            }

            let node = graph.add_node(def.rank, Arc::clone(&key.label));
            owners.insert(key, &def.id);
            ids.insert(Arc::from(def.id.as_str()), node);
        }

        let resolve = |id: &str, context: &str| -> Result<NodeId, Graph2TabError> {
            ids.get(id).copied().ok_or_else(|| Graph2TabError::UnknownNode {
                id: id.to_string(),
                context: context.to_string(),
            })
        };

        let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
        for edge in &self.edges {
            for source in edge.source.as_vec() {
                for target in edge.target.as_vec() {
                    let from = resolve(source, "edge source")?;
                    let to = resolve(target, "edge target")?;

                    let (source_rank, target_rank) = (graph.key(from).rank, graph.key(to).rank);
                    if source_rank >= target_rank {
                        return Err(Graph2TabError::RankOrder {
                            source_id: source.to_string(),
                            target_id: target.to_string(),
                            source_rank,
                            target_rank,
                        });
                    }
                    edges.push((from, to));
                }
            }
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }

        let frontier = match &self.frontier {
            Some(list) => list
                .iter()
                .map(|id| resolve(id, "frontier"))
                .collect::<Result<Vec<_>, _>>()?,
            None => graph.node_ids().collect(),
        };

        Ok(BuiltGraph {
            graph,
            frontier,
            limits: self.limits,
            ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAMOND: &str = r#"
schema: graph2tab/graph@0.1
nodes:
  - { id: A, rank: 0 }
  - { id: B, rank: 1 }
  - { id: E, rank: 1 }
  - { id: C, rank: 2 }
  - { id: D, rank: 3 }
edges:
  - source: A
    target: [B, E]
  - source: B
    target: C
  - source: [C, E]
    target: D
frontier: [D]
"#;

    #[test]
    fn parses_and_builds_diamond() {
        let document = GraphDocument::from_yaml(DIAMOND).unwrap();
        assert_eq!(document.nodes.len(), 5);

        let built = document.build().unwrap();
        assert_eq!(built.graph.len(), 5);
        assert_eq!(built.graph.edge_count(), 5);

        let d = built.node("D").unwrap();
        assert_eq!(built.frontier, vec![d]);
        assert_eq!(built.graph.inputs(d).len(), 2);
        assert_eq!(built.limits, TraversalLimits::default());
    }

    #[test]
    fn frontier_defaults_to_every_node() {
        let yaml = DIAMOND.replace("frontier: [D]\n", "");
        let built = GraphDocument::from_yaml(&yaml).unwrap().build().unwrap();
        assert_eq!(built.frontier.len(), 5);
    }

    #[test]
    fn label_defaults_to_id() {
        let yaml = r#"
schema: graph2tab/graph@0.1
nodes:
  - { id: s1, rank: 0, label: "Source 1" }
  - { id: x, rank: 1 }
edges:
  - { source: s1, target: x }
limits:
  max_visits: 50
"#;
        let built = GraphDocument::from_yaml(yaml).unwrap().build().unwrap();
        let s1 = built.node("s1").unwrap();
        assert_eq!(built.graph.key(s1).label.as_ref(), "Source 1");
        assert_eq!(built.graph.key(built.node("x").unwrap()).label.as_ref(), "x");
        assert_eq!(built.limits.max_visits, 50);
    }

    #[test]
    fn rejects_wrong_schema() {
        let yaml = DIAMOND.replace("graph2tab/graph@0.1", "graph2tab/graph@9.9");
        let err = GraphDocument::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("G2T-001"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = r#"
schema: graph2tab/graph@0.1
nodes:
  - { id: A, rank: 0 }
  - { id: A, rank: 1 }
"#;
        let err = GraphDocument::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, Graph2TabError::DuplicateNodeId { ref id } if id == "A"));
    }

    #[test]
    fn rejects_duplicate_identity() {
        let yaml = r#"
schema: graph2tab/graph@0.1
nodes:
  - { id: a1, rank: 0, label: Same }
  - { id: a2, rank: 0, label: Same }
"#;
        let err = GraphDocument::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("G2T-011"));
    }

    #[test]
    fn rejects_unknown_references() {
        let yaml = DIAMOND.replace("target: [B, E]", "target: [B, Q]");
        let err = GraphDocument::from_yaml(&yaml).unwrap().build().unwrap_err();
        assert!(
            matches!(err, Graph2TabError::UnknownNode { ref id, ref context } if id == "Q" && context == "edge target")
        );

        let yaml = DIAMOND.replace("frontier: [D]", "frontier: [Z]");
        let err = GraphDocument::from_yaml(&yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, Graph2TabError::UnknownNode { ref context, .. } if context == "frontier"));
    }

    #[test]
    fn rejects_edges_that_do_not_advance_rank() {
        let yaml = DIAMOND.replace("{ id: C, rank: 2 }", "{ id: C, rank: 1 }");
        let err = GraphDocument::from_yaml(&yaml).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            Graph2TabError::RankOrder { source_rank: 1, target_rank: 1, .. }
        ));
    }
}
