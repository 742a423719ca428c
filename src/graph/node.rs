//! Node primitives: arena ids, ordered identity keys, adjacency
//!
//! `NodeKey` carries the identity and the total order used for every
//! deterministic choice in the crate (rank first, then label).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stack-allocated adjacency: most provenance nodes have 0-4 neighbours
pub type NodeVec = SmallVec<[NodeId; 4]>;

/// Dense index of a node inside its `ProvenanceGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node identity: structural rank (table column) plus label
///
/// Field order matters: the derived `Ord` compares `rank` before `label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub rank: u32,
    pub label: Arc<str>,
}

impl NodeKey {
    pub fn new(rank: u32, label: impl Into<Arc<str>>) -> Self {
        Self {
            rank,
            label: label.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.label, self.rank)
    }
}

/// A vertex with its sorted input and output lists
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) key: NodeKey,
    pub(crate) inputs: NodeVec,
    pub(crate) outputs: NodeVec,
}

impl Node {
    pub(crate) fn new(key: NodeKey) -> Self {
        Self {
            key,
            inputs: NodeVec::new(),
            outputs: NodeVec::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Predecessors, sorted by `NodeKey`
    #[inline]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Successors, sorted by `NodeKey`
    #[inline]
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Outputs but no inputs; isolated nodes are not sources
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty() && !self.outputs.is_empty()
    }
}
