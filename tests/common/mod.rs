//! Test fixtures and helpers
#![allow(dead_code)]

use graph2tab::{FlowManager, NodeId, ProvenanceGraph};

/// Build a graph from `(label, rank)` nodes and `(from, to)` label pairs
pub fn graph_from(nodes: &[(&str, u32)], edges: &[(&str, &str)]) -> ProvenanceGraph {
    let mut graph = ProvenanceGraph::new();
    for &(label, rank) in nodes {
        graph.add_node(rank, label);
    }
    for &(from, to) in edges {
        let (from, to) = (id(&graph, from), id(&graph, to));
        graph.add_edge(from, to);
    }
    graph
}

/// Find a node by label (labels are unique in test graphs)
pub fn id(graph: &ProvenanceGraph, label: &str) -> NodeId {
    graph
        .node_ids()
        .find(|&n| graph.key(n).label.as_ref() == label)
        .unwrap_or_else(|| panic!("no node labelled {label}"))
}

pub fn labels(graph: &ProvenanceGraph, ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(|&n| graph.key(n).label.to_string()).collect()
}

pub fn flow(flows: &FlowManager<'_>, from: &str, to: &str) -> u32 {
    let graph = flows.graph();
    flows.get_flow(id(graph, from), id(graph, to))
}

/// Diamond: A -> B -> C -> D and A -> E -> D
pub fn diamond() -> ProvenanceGraph {
    graph_from(
        &[("A", 0), ("B", 1), ("E", 1), ("C", 2), ("D", 3)],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("A", "E"), ("E", "D")],
    )
}

/// Minimal valid graph document
pub fn diamond_yaml() -> &'static str {
    r#"
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
"#
}
