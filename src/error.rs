//! Error types with fix suggestions (v0.1)

use thiserror::Error;

use crate::graph::NodeKey;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Failures of the flow initialisation core
///
/// `Clone` so an initialiser can latch a failure and report it on every
/// later query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Broken algorithm invariant: only `deficit <= 0` may reach the rightward pass
    #[error(
        "G2T-030: Internal error, node '{node}' has deficit {deficit} > 0 during the rightward pass"
    )]
    PositiveDeficit { node: NodeKey, deficit: i64 },

    #[error("G2T-031: Traversal exceeded the visit budget of {limit} node visits")]
    VisitBudgetExceeded { limit: usize },

    #[error("G2T-032: Flow on edge '{from}' -> '{to}' exceeds the per-edge maximum of 4294967295")]
    FlowOverflow { from: NodeKey, to: NodeKey },
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum Graph2TabError {
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Flow(#[from] FlowError),

    // ─────────────────────────────────────────────────────────────
    // Graph document errors (G2T-001 to G2T-013)
    // ─────────────────────────────────────────────────────────────
    #[error("G2T-001: Invalid schema: expected '{expected}', got '{actual}'")]
    InvalidSchema { expected: String, actual: String },

    #[error("G2T-010: Duplicate node id '{id}'")]
    DuplicateNodeId { id: String },

    #[error("G2T-011: Nodes '{first}' and '{second}' share the identity {key}")]
    DuplicateNodeKey {
        key: NodeKey,
        first: String,
        second: String,
    },

    #[error("G2T-012: {context} references unknown node '{id}'")]
    UnknownNode { id: String, context: String },

    #[error(
        "G2T-013: Edge '{source_id}' -> '{target_id}' must go to a higher rank ({source_rank} -> {target_rank})"
    )]
    RankOrder {
        source_id: String,
        target_id: String,
        source_rank: u32,
        target_rank: u32,
    },

    // ─────────────────────────────────────────────────────────────
    // Table decomposition errors (G2T-040 to G2T-041)
    // ─────────────────────────────────────────────────────────────
    #[error("G2T-040: Flow is not conserved at '{node}', a path stranded there")]
    FlowNotConserved { node: NodeKey },

    #[error("G2T-041: Path through '{first}' and '{second}' puts two nodes in rank column {rank}")]
    RankCollision {
        rank: u32,
        first: NodeKey,
        second: NodeKey,
    },
}

impl FixSuggestion for FlowError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FlowError::PositiveDeficit { .. } => {
                Some("This is a bug in flow initialisation; report it with the input graph")
            }
            FlowError::VisitBudgetExceeded { .. } => {
                Some("Raise limits.max_visits in the graph document or reduce merge fan-in")
            }
            FlowError::FlowOverflow { .. } => {
                Some("Split the graph: one edge would carry more paths than a table can hold")
            }
        }
    }
}

impl FixSuggestion for Graph2TabError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Graph2TabError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            Graph2TabError::Json(_) => None,
            Graph2TabError::Io(_) => Some("Check file path and permissions"),
            Graph2TabError::Flow(e) => e.fix_suggestion(),
            Graph2TabError::InvalidSchema { .. } => {
                Some("Start the document with: schema: graph2tab/graph@0.1")
            }
            Graph2TabError::DuplicateNodeId { .. } => Some("Give every node a unique id"),
            Graph2TabError::DuplicateNodeKey { .. } => {
                Some("Use a distinct label or rank for one of the nodes")
            }
            Graph2TabError::UnknownNode { .. } => {
                Some("Declare the node under nodes: before referencing it")
            }
            Graph2TabError::RankOrder { .. } => {
                Some("Ranks are table columns: a target must sit in a later column than its source")
            }
            Graph2TabError::FlowNotConserved { .. } => {
                Some("The flow assignment was altered after initialisation; rebuild it")
            }
            Graph2TabError::RankCollision { .. } => {
                Some("Give nodes on the same path distinct ranks")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_deficit_names_the_node() {
        let err = FlowError::PositiveDeficit {
            node: NodeKey::new(2, "C"),
            deficit: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("G2T-030"));
        assert!(msg.contains("C@2"));
        assert!(msg.contains("deficit 3"));
    }

    #[test]
    fn flow_overflow_names_the_edge() {
        let err = FlowError::FlowOverflow {
            from: NodeKey::new(0, "A"),
            to: NodeKey::new(1, "B"),
        };
        let msg = err.to_string();
        assert!(msg.contains("G2T-032"));
        assert!(msg.contains("'A@0' -> 'B@1'"));
        assert!(msg.contains("4294967295"));
        assert!(err.fix_suggestion().is_some());
    }

    #[test]
    fn flow_errors_are_transparent_when_wrapped() {
        let inner = FlowError::VisitBudgetExceeded { limit: 10 };
        let outer: Graph2TabError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
        assert_eq!(outer.fix_suggestion(), inner.fix_suggestion());
    }

    #[test]
    fn document_errors_have_suggestions() {
        let err = Graph2TabError::UnknownNode {
            id: "X".into(),
            context: "edge source".into(),
        };
        assert!(err.to_string().contains("G2T-012"));
        assert!(err.fix_suggestion().is_some());
    }
}
