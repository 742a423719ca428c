//! Event log for flow initialisation (v0.1)
//!
//! Structured, append-only record of what the two-pass algorithm did.
//! - Event: envelope with id + timestamp + kind
//! - EventKind: phase-level and per-node variants
//! - EventLog: thread-safe handle, also usable as a `DiagnosticsSink`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::DiagnosticsSink;
use crate::graph::NodeKey;

/// Single event in the initialisation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since the log was created (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// Which way a deficit was pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Over incoming edges, toward the sources
    Leftward,
    /// Over outgoing edges, toward the sinks
    Rightward,
}

/// All possible event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // PHASE LEVEL
    // ═══════════════════════════════════════════
    InitialisationStarted {
        frontier: Vec<NodeKey>,
    },
    EndNodesDiscovered {
        end_nodes: Vec<NodeKey>,
    },
    InitialisationCompleted {
        start_nodes: usize,
        queued: usize,
        visits: usize,
    },
    InitialisationFailed {
        error: String,
    },

    // ═══════════════════════════════════════════
    // NODE LEVEL
    // ═══════════════════════════════════════════
    StartNodeFound {
        node: NodeKey,
    },
    EdgeSeeded {
        from: NodeKey,
        to: NodeKey,
    },
    /// Node left unbalanced by the leftward pass, kept for the rightward one
    NodeQueued {
        node: NodeKey,
        deficit: i64,
    },
    /// `amount` spread over the node's edges; `increments` follow edge order
    FlowDistributed {
        node: NodeKey,
        direction: Direction,
        amount: u64,
        increments: Vec<u64>,
    },
}

impl EventKind {
    /// Extract the node key if the event is node-related
    pub fn node(&self) -> Option<&NodeKey> {
        match self {
            Self::StartNodeFound { node }
            | Self::NodeQueued { node, .. }
            | Self::FlowDistributed { node, .. } => Some(node),
            Self::EdgeSeeded { to, .. } => Some(to),
            Self::InitialisationStarted { .. }
            | Self::EndNodesDiscovered { .. }
            | Self::InitialisationCompleted { .. }
            | Self::InitialisationFailed { .. } => None,
        }
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event, returns its ID
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    /// Get all events (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Events about the node with this label (any rank)
    pub fn filter_node(&self, label: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.node().is_some_and(|k| k.label.as_ref() == label))
            .collect()
    }

    /// Serialize to JSON for debugging
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.events())
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink for EventLog {
    fn record(&self, kind: EventKind) {
        self.emit(kind);
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(rank: u32, label: &str) -> NodeKey {
        NodeKey::new(rank, label)
    }

    // ═══════════════════════════════════════════════════════════════
    // EventKind tests
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn eventkind_node_extraction() {
        let queued = EventKind::NodeQueued {
            node: key(1, "C"),
            deficit: -1,
        };
        assert_eq!(queued.node(), Some(&key(1, "C")));

        let seeded = EventKind::EdgeSeeded {
            from: key(0, "A"),
            to: key(1, "C"),
        };
        assert_eq!(seeded.node(), Some(&key(1, "C")));

        let started = EventKind::InitialisationStarted { frontier: vec![] };
        assert_eq!(started.node(), None);
    }

    #[test]
    fn eventkind_serializes_with_type_tag() {
        let kind = EventKind::FlowDistributed {
            node: key(1, "N"),
            direction: Direction::Rightward,
            amount: 5,
            increments: vec![2, 2, 1],
        };

        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "flow_distributed");
        assert_eq!(json["direction"], "rightward");
        assert_eq!(json["node"], json!({"rank": 1, "label": "N"}));
        assert_eq!(json["increments"], json!([2, 2, 1]));
    }

    #[test]
    fn eventkind_deserializes_from_tagged_json() {
        let json = json!({
            "type": "node_queued",
            "node": {"rank": 2, "label": "C"},
            "deficit": -3
        });

        let kind: EventKind = serde_json::from_value(json).unwrap();
        assert_eq!(
            kind,
            EventKind::NodeQueued {
                node: key(2, "C"),
                deficit: -3,
            }
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // EventLog tests
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn eventlog_emit_returns_monotonic_ids() {
        let log = EventLog::new();
        assert!(log.is_empty());

        let id1 = log.emit(EventKind::InitialisationStarted { frontier: vec![] });
        let id2 = log.emit(EventKind::StartNodeFound { node: key(0, "A") });

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn eventlog_filter_node_returns_only_matching() {
        let log = EventLog::new();
        log.record(EventKind::InitialisationStarted { frontier: vec![] });
        log.record(EventKind::StartNodeFound { node: key(0, "A") });
        log.record(EventKind::NodeQueued {
            node: key(1, "C"),
            deficit: -1,
        });
        log.record(EventKind::FlowDistributed {
            node: key(1, "C"),
            direction: Direction::Rightward,
            amount: 1,
            increments: vec![1],
        });

        assert_eq!(log.filter_node("C").len(), 2);
        assert_eq!(log.filter_node("A").len(), 1);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn eventlog_is_clone_and_shares_storage() {
        let log = EventLog::new();
        let cloned = log.clone();

        log.emit(EventKind::InitialisationFailed {
            error: "boom".into(),
        });
        assert_eq!(cloned.len(), 1);
    }

    #[test]
    fn eventlog_to_json() {
        let log = EventLog::new();
        log.emit(EventKind::EndNodesDiscovered {
            end_nodes: vec![key(3, "D")],
        });

        let json = log.to_json().unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["kind"]["type"], "end_nodes_discovered");
        assert_eq!(json[0]["kind"]["end_nodes"][0]["label"], "D");
    }
}
