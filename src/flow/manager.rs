//! FlowManager - per-edge flow counters and on-demand deficits
//!
//! Untouched edges read as zero flow. Deficits are recomputed from the
//! node's current edges on every query, never cached.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::FlowError;
use crate::graph::{NodeId, NodeKey, ProvenanceGraph};

/// One edge and its flow, as reported by `FlowManager::edge_flows`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeFlow {
    pub from: NodeKey,
    pub to: NodeKey,
    pub flow: u32,
}

/// Owns the edge -> flow mapping for one graph
#[derive(Debug, Clone)]
pub struct FlowManager<'g> {
    graph: &'g ProvenanceGraph,
    flows: FxHashMap<(NodeId, NodeId), u32>,
}

impl<'g> FlowManager<'g> {
    pub fn new(graph: &'g ProvenanceGraph) -> Self {
        Self {
            graph,
            flows: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn graph(&self) -> &'g ProvenanceGraph {
        self.graph
    }

    /// Flow on `from -> to`, 0 for edges never touched
    #[inline]
    pub fn get_flow(&self, from: NodeId, to: NodeId) -> u32 {
        self.flows.get(&(from, to)).copied().unwrap_or(0)
    }

    /// Unconditional set, used to seed the minimum of 1
    pub fn set_flow(&mut self, from: NodeId, to: NodeId, value: u32) {
        self.flows.insert((from, to), value);
    }

    /// Add `delta` to `from -> to`; fails without touching the edge if the
    /// result does not fit in a `u32`
    pub fn increase_flow(&mut self, from: NodeId, to: NodeId, delta: u64) -> Result<(), FlowError> {
        if delta == 0 {
            return Ok(());
        }

        let current = u64::from(self.get_flow(from, to));
        let flow = current
            .checked_add(delta)
            .and_then(|sum| u32::try_from(sum).ok())
            .ok_or_else(|| FlowError::FlowOverflow {
                from: self.graph.key(from).clone(),
                to: self.graph.key(to).clone(),
            })?;

        self.flows.insert((from, to), flow);
        Ok(())
    }

    /// Sum of flows on the node's incoming edges
    pub fn inflow(&self, node: NodeId) -> u64 {
        self.graph
            .inputs(node)
            .iter()
            .map(|&input| u64::from(self.get_flow(input, node)))
            .sum()
    }

    /// Sum of flows on the node's outgoing edges
    pub fn outflow(&self, node: NodeId) -> u64 {
        self.graph
            .outputs(node)
            .iter()
            .map(|&output| u64::from(self.get_flow(node, output)))
            .sum()
    }

    /// outflow - inflow; zero means balanced
    pub fn deficit(&self, node: NodeId) -> i64 {
        self.outflow(node) as i64 - self.inflow(node) as i64
    }

    /// Every edge with non-zero flow, ordered by (from key, to key)
    pub fn edge_flows(&self) -> Vec<EdgeFlow> {
        let mut edges: Vec<EdgeFlow> = self
            .flows
            .iter()
            .filter(|(_, flow)| **flow > 0)
            .map(|(&(from, to), &flow)| EdgeFlow {
                from: self.graph.key(from).clone(),
                to: self.graph.key(to).clone(),
                flow,
            })
            .collect();
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        edges
    }

    /// Sum of flow over all edges
    pub fn total_flow(&self) -> u64 {
        self.flows.values().map(|&f| u64::from(f)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A -> C, B -> C, C -> D
    fn merge_graph() -> (ProvenanceGraph, [NodeId; 4]) {
        let mut graph = ProvenanceGraph::new();
        let a = graph.add_node(0, "A");
        let b = graph.add_node(0, "B");
        let c = graph.add_node(1, "C");
        let d = graph.add_node(2, "D");
        graph.add_edge(a, c);
        graph.add_edge(b, c);
        graph.add_edge(c, d);
        (graph, [a, b, c, d])
    }

    #[test]
    fn untouched_edges_read_zero() {
        let (graph, [a, _, c, d]) = merge_graph();
        let flows = FlowManager::new(&graph);

        assert_eq!(flows.get_flow(a, c), 0);
        // not even an edge
        assert_eq!(flows.get_flow(a, d), 0);
        assert_eq!(flows.deficit(c), 0);
        assert_eq!(flows.total_flow(), 0);
    }

    #[test]
    fn set_and_increase() {
        let (graph, [a, _, c, _]) = merge_graph();
        let mut flows = FlowManager::new(&graph);

        flows.set_flow(a, c, 1);
        flows.increase_flow(a, c, 2).unwrap();
        flows.increase_flow(a, c, 0).unwrap();
        assert_eq!(flows.get_flow(a, c), 3);

        flows.set_flow(a, c, 1);
        assert_eq!(flows.get_flow(a, c), 1);
    }

    #[test]
    fn increase_past_u32_is_an_error_and_leaves_the_edge() {
        let (graph, [a, _, c, _]) = merge_graph();
        let mut flows = FlowManager::new(&graph);

        flows.set_flow(a, c, u32::MAX - 1);
        flows.increase_flow(a, c, 1).unwrap();
        assert_eq!(flows.get_flow(a, c), u32::MAX);

        let err = flows.increase_flow(a, c, 1).unwrap_err();
        assert_eq!(
            err,
            FlowError::FlowOverflow {
                from: graph.key(a).clone(),
                to: graph.key(c).clone(),
            }
        );
        assert_eq!(flows.get_flow(a, c), u32::MAX);

        assert!(flows.increase_flow(a, c, u64::MAX).is_err());
    }

    #[test]
    fn deficit_tracks_current_edges() {
        let (graph, [a, b, c, d]) = merge_graph();
        let mut flows = FlowManager::new(&graph);

        flows.set_flow(c, d, 1);
        assert_eq!(flows.deficit(c), 1);

        flows.set_flow(a, c, 1);
        flows.set_flow(b, c, 1);
        assert_eq!(flows.inflow(c), 2);
        assert_eq!(flows.outflow(c), 1);
        assert_eq!(flows.deficit(c), -1);

        // sink: no outputs, deficit is minus its inflow
        assert_eq!(flows.deficit(d), -1);
        // source: no inputs
        assert_eq!(flows.deficit(a), 1);
    }

    #[test]
    fn edge_flows_are_sorted_and_skip_zero() {
        let (graph, [a, b, c, d]) = merge_graph();
        let mut flows = FlowManager::new(&graph);
        flows.set_flow(c, d, 2);
        flows.set_flow(b, c, 1);
        flows.set_flow(a, c, 1);
        flows.set_flow(a, d, 0);

        let rendered: Vec<String> = flows
            .edge_flows()
            .iter()
            .map(|e| format!("{}->{}={}", e.from.label, e.to.label, e.flow))
            .collect();
        assert_eq!(rendered, vec!["A->C=1", "B->C=1", "C->D=2"]);
        assert_eq!(flows.total_flow(), 4);
    }
}
