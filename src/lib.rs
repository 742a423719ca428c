//! graph2tab - provenance DAG to path table conversion
//!
//! A graph is decomposed into source-to-sink paths (table rows). The number
//! of paths through each edge is an integer flow computed by
//! [`FlowInitialiser`]: conserved at every interior node and at least 1 on
//! every edge reached from the frontier.

pub mod diagnostics;
pub mod document;
pub mod error;
pub mod event_log;
pub mod flow;
pub mod graph;
pub mod limits;
pub mod table;

pub use diagnostics::{DiagnosticsSink, NullSink, TracingSink};
pub use document::{BuiltGraph, GraphDocument};
pub use error::{FixSuggestion, FlowError, Graph2TabError};
pub use event_log::{Direction, Event, EventKind, EventLog};
pub use flow::{EdgeFlow, FlowInitialiser, FlowManager, InitStats};
pub use graph::{Node, NodeId, NodeKey, ProvenanceGraph};
pub use limits::TraversalLimits;
pub use table::{PathTable, TableBuilder};
