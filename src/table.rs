//! Path decomposition of an initialised flow into a rank-columned table
//!
//! Each row is one source-to-sink path. An edge carrying flow k shows up as
//! two adjacent cells in exactly k rows.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::Graph2TabError;
use crate::flow::FlowInitialiser;
use crate::graph::{NodeId, ProvenanceGraph};

/// Rows of node labels laid out on rank columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    columns: Vec<u32>,
    paths: Vec<Vec<NodeId>>,
    rows: Vec<Vec<Option<Arc<str>>>>,
}

impl PathTable {
    /// Ranks, one per column, ascending
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    /// Cells per row; `None` where the path skips a rank
    pub fn rows(&self) -> &[Vec<Option<Arc<str>>>] {
        &self.rows
    }

    /// The node sequence behind each row
    pub fn paths(&self) -> &[Vec<NodeId>] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if some row holds `from` and `to` in adjacent non-empty cells
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.rows.iter().any(|row| {
            let cells: Vec<&str> = row.iter().flatten().map(|c| c.as_ref()).collect();
            cells.windows(2).any(|w| w[0] == from && w[1] == to)
        })
    }

    /// Tab-separated rendering with a `rank <r>` header
    pub fn to_tsv(&self) -> String {
        let mut out = self
            .columns
            .iter()
            .map(|rank| format!("rank {rank}"))
            .collect::<Vec<_>>()
            .join("\t");
        out.push('\n');

        for row in &self.rows {
            let line = row
                .iter()
                .map(|cell| cell.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join("\t");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

pub struct TableBuilder;

impl TableBuilder {
    /// Decompose the initialiser's flow into rows
    ///
    /// Walks from each start node (node order) while it has residual
    /// outflow, always following the first output with residual flow.
    pub fn build(initialiser: &mut FlowInitialiser<'_>) -> Result<PathTable, Graph2TabError> {
        let graph = initialiser.graph();
        let start_nodes = initialiser.start_nodes()?.to_vec();
        let flows = initialiser.flow_manager()?;

        let mut residual: FxHashMap<(NodeId, NodeId), u32> = FxHashMap::default();
        for node in graph.node_ids() {
            for &output in graph.outputs(node) {
                let flow = flows.get_flow(node, output);
                if flow > 0 {
                    residual.insert((node, output), flow);
                }
            }
        }

        let mut paths: Vec<Vec<NodeId>> = Vec::new();
        for &start in &start_nodes {
            while let Some(path) = walk(graph, &mut residual, start)? {
                paths.push(path);
            }
        }

        if let Some((&(from, _), _)) = residual.iter().find(|(_, left)| **left > 0) {
            return Err(Graph2TabError::FlowNotConserved {
                node: graph.key(from).clone(),
            });
        }

        layout(graph, paths)
    }
}

/// One walk from `start`; `None` once `start` has no residual outflow
fn walk(
    graph: &ProvenanceGraph,
    residual: &mut FxHashMap<(NodeId, NodeId), u32>,
    start: NodeId,
) -> Result<Option<Vec<NodeId>>, Graph2TabError> {
    let mut path = vec![start];
    let mut current = start;

    loop {
        let outputs = graph.outputs(current);
        if outputs.is_empty() {
            return Ok(Some(path));
        }

        let next = outputs
            .iter()
            .copied()
            .find(|&out| residual.get(&(current, out)).is_some_and(|&left| left > 0));

        match next {
            Some(out) => {
                if let Some(left) = residual.get_mut(&(current, out)) {
                    *left -= 1;
                }
                path.push(out);
                current = out;
            }
            None if current == start => return Ok(None),
            None => {
                return Err(Graph2TabError::FlowNotConserved {
                    node: graph.key(current).clone(),
                })
            }
        }
    }
}

fn layout(graph: &ProvenanceGraph, paths: Vec<Vec<NodeId>>) -> Result<PathTable, Graph2TabError> {
    let mut columns: Vec<u32> = paths
        .iter()
        .flatten()
        .map(|&id| graph.key(id).rank)
        .collect();
    columns.sort_unstable();
    columns.dedup();

    let mut rows = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut row: Vec<Option<Arc<str>>> = vec![None; columns.len()];
        let mut owner: Vec<Option<NodeId>> = vec![None; columns.len()];

        for &id in path {
            let key = graph.key(id);
            // columns hold every rank seen on a path
            let col = columns.binary_search(&key.rank).unwrap_or_default();
            if let Some(first) = owner[col] {
                return Err(Graph2TabError::RankCollision {
                    rank: key.rank,
                    first: graph.key(first).clone(),
                    second: key.clone(),
                });
            }
            owner[col] = Some(id);
            row[col] = Some(Arc::clone(&key.label));
        }
        rows.push(row);
    }

    Ok(PathTable {
        columns,
        paths,
        rows,
    })
}
