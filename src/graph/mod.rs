//! Graph Module - provenance DAG primitives
//!
//! - `node`: ids, identity keys and adjacency of a single vertex
//! - `provenance`: the node arena with key-sorted edges
//!
//! The graph is built up front and only borrowed during flow initialisation.

mod node;
mod provenance;

pub use node::{Node, NodeId, NodeKey, NodeVec};
pub use provenance::ProvenanceGraph;
