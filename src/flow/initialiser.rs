//! FlowInitialiser - two-pass seeding of a feasible path flow
//!
//! Phase 0 discovers the sinks reachable from the frontier. Phase 1 walks
//! leftward from every sink, loading each edge with at least 1 and pushing
//! output excess onto inputs; nodes with more input than output are queued.
//! Phase 2 pops the queue (LIFO) and pushes input excess rightward toward
//! the sinks.
//!
//! Both passes run on explicit stacks. Neighbours are pushed in reverse node
//! order so the smallest input/output is popped first, which keeps the
//! depth-first visit order. A node whose in/out totals are unchanged since
//! its last leftward visit is not walked again, so per-edge flows can
//! differ from a walk without that skip. Conservation and the minimum of 1
//! hold either way.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::error::FlowError;
use crate::event_log::{Direction, EventKind};
use crate::graph::{NodeId, ProvenanceGraph};
use crate::limits::{TraversalLimits, VisitCounter};

use super::manager::FlowManager;
use super::quota::split_evenly;

#[derive(Debug, Clone)]
enum InitState {
    Pending,
    Done,
    Failed(FlowError),
}

/// Counters from the last initialisation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitStats {
    /// Node visits over both passes
    pub visits: usize,
    /// Worklist pushes during the leftward pass
    pub queued: usize,
}

/// Computes a conservation-respecting, ≥1-per-edge flow for the part of a
/// graph reachable from a frontier
///
/// Initialisation is lazy: the first query runs it, later queries reuse the
/// result. A failure is latched and returned again by every later query.
pub struct FlowInitialiser<'g> {
    graph: &'g ProvenanceGraph,
    frontier: Vec<NodeId>,
    flows: FlowManager<'g>,
    start_nodes: Vec<NodeId>,
    state: InitState,
    stats: InitStats,
    limits: TraversalLimits,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl<'g> FlowInitialiser<'g> {
    pub fn new(graph: &'g ProvenanceGraph, frontier: impl IntoIterator<Item = NodeId>) -> Self {
        let mut frontier: Vec<NodeId> = frontier.into_iter().collect();
        graph.sort_by_key(&mut frontier);
        frontier.dedup();

        Self {
            graph,
            frontier,
            flows: FlowManager::new(graph),
            start_nodes: Vec::new(),
            state: InitState::Pending,
            stats: InitStats::default(),
            limits: TraversalLimits::default(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn graph(&self) -> &'g ProvenanceGraph {
        self.graph
    }

    /// Frontier nodes, deduplicated and in node order
    pub fn frontier(&self) -> &[NodeId] {
        &self.frontier
    }

    pub fn is_initialised(&self) -> bool {
        matches!(self.state, InitState::Done)
    }

    pub fn stats(&self) -> InitStats {
        self.stats
    }

    /// Zero-input nodes reached by the leftward pass, in node order
    ///
    /// Computed once, cached afterwards.
    pub fn start_nodes(&mut self) -> Result<&[NodeId], FlowError> {
        self.initialise()?;
        Ok(&self.start_nodes)
    }

    /// Zero-output nodes reachable from the frontier, in node order
    ///
    /// Recomputed on every call.
    pub fn end_nodes(&mut self) -> Result<Vec<NodeId>, FlowError> {
        self.initialise()?;
        Ok(discover_end_nodes(self.graph, &self.frontier))
    }

    pub fn flow_manager(&mut self) -> Result<&FlowManager<'g>, FlowError> {
        self.initialise()?;
        Ok(&self.flows)
    }

    pub fn into_flow_manager(mut self) -> Result<FlowManager<'g>, FlowError> {
        self.initialise()?;
        Ok(self.flows)
    }

    /// Run phases 0-2 unless they already ran
    pub fn initialise(&mut self) -> Result<(), FlowError> {
        match &self.state {
            InitState::Done => return Ok(()),
            InitState::Failed(err) => return Err(err.clone()),
            InitState::Pending => {}
        }

        match self.run() {
            Ok(()) => {
                self.state = InitState::Done;
                Ok(())
            }
            Err(err) => {
                self.diagnostics.record(EventKind::InitialisationFailed {
                    error: err.to_string(),
                });
                self.state = InitState::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<(), FlowError> {
        let graph = self.graph;
        self.diagnostics.record(EventKind::InitialisationStarted {
            frontier: self.frontier.iter().map(|&id| graph.key(id).clone()).collect(),
        });

        let end_nodes = discover_end_nodes(graph, &self.frontier);
        tracing::debug!(
            frontier = self.frontier.len(),
            end_nodes = end_nodes.len(),
            "Starting leftward flow pass"
        );
        self.diagnostics.record(EventKind::EndNodesDiscovered {
            end_nodes: end_nodes.iter().map(|&id| graph.key(id).clone()).collect(),
        });

        let mut balancer = Balancer::new(
            graph,
            &mut self.flows,
            self.diagnostics.as_ref(),
            &self.limits,
        );

        for &end in &end_nodes {
            balancer.flow_left(end)?;
        }

        tracing::debug!(queued = balancer.worklist.len(), "Starting rightward flow pass");
        while let Some(node) = balancer.worklist.pop() {
            balancer.flow_right(node)?;
        }

        let mut start_nodes: Vec<NodeId> = balancer.start_nodes.into_iter().collect();
        graph.sort_by_key(&mut start_nodes);

        self.stats = InitStats {
            visits: balancer.visits.used(),
            queued: balancer.queued,
        };
        self.start_nodes = start_nodes;

        self.diagnostics.record(EventKind::InitialisationCompleted {
            start_nodes: self.start_nodes.len(),
            queued: self.stats.queued,
            visits: self.stats.visits,
        });
        tracing::debug!(
            start_nodes = self.start_nodes.len(),
            visits = self.stats.visits,
            total_flow = self.flows.total_flow(),
            "Flow initialised"
        );

        Ok(())
    }
}

impl std::fmt::Debug for FlowInitialiser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowInitialiser")
            .field("frontier", &self.frontier)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Zero-output nodes reachable from `frontier` by following outputs
///
/// Each node is expanded once, however many paths reach it.
fn discover_end_nodes(graph: &ProvenanceGraph, frontier: &[NodeId]) -> Vec<NodeId> {
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut stack: Vec<NodeId> = frontier.to_vec();
    let mut end_nodes: Vec<NodeId> = Vec::new();

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        let outputs = graph.outputs(node);
        if outputs.is_empty() {
            end_nodes.push(node);
        } else {
            stack.extend(outputs.iter().copied());
        }
    }

    graph.sort_by_key(&mut end_nodes);
    end_nodes
}

/// Mutable state shared by both passes of one run
struct Balancer<'a, 'g> {
    graph: &'g ProvenanceGraph,
    flows: &'a mut FlowManager<'g>,
    diagnostics: &'a dyn DiagnosticsSink,
    visits: VisitCounter,
    /// (inflow, outflow) at each node's last full leftward visit
    last_seen: FxHashMap<NodeId, (u64, u64)>,
    start_nodes: FxHashSet<NodeId>,
    worklist: Vec<NodeId>,
    queued: usize,
}

impl<'a, 'g> Balancer<'a, 'g> {
    fn new(
        graph: &'g ProvenanceGraph,
        flows: &'a mut FlowManager<'g>,
        diagnostics: &'a dyn DiagnosticsSink,
        limits: &TraversalLimits,
    ) -> Self {
        Self {
            graph,
            flows,
            diagnostics,
            visits: VisitCounter::new(limits),
            last_seen: FxHashMap::default(),
            start_nodes: FxHashSet::default(),
            worklist: Vec::new(),
            queued: 0,
        }
    }

    fn charge(&mut self) -> Result<(), FlowError> {
        if self.visits.charge() {
            Ok(())
        } else {
            Err(FlowError::VisitBudgetExceeded {
                limit: self.visits.limit(),
            })
        }
    }

    fn totals(&self, node: NodeId) -> (u64, u64) {
        (self.flows.inflow(node), self.flows.outflow(node))
    }

    /// Leftward pass from one end node
    fn flow_left(&mut self, end: NodeId) -> Result<(), FlowError> {
        let graph = self.graph;
        let mut stack = vec![end];

        while let Some(node) = stack.pop() {
            self.charge()?;

            let inputs = graph.inputs(node);
            let nouts = graph.outputs(node).len();

            if inputs.is_empty() {
                // Source ends the leftward walk; isolated nodes are ignored
                if nouts > 0 && self.start_nodes.insert(node) {
                    self.diagnostics.record(EventKind::StartNodeFound {
                        node: graph.key(node).clone(),
                    });
                }
                continue;
            }

            // Flows only grow: same totals as last time means nothing new to do
            if self.last_seen.get(&node) == Some(&self.totals(node)) {
                continue;
            }

            let changed = self.seed_inputs(node);

            if nouts > 0 {
                let deficit = self.flows.deficit(node);

                if !changed && deficit == 0 {
                    let totals = self.totals(node);
                    self.last_seen.insert(node, totals);
                    continue;
                }

                if deficit < 0 {
                    self.worklist.push(node);
                    self.queued += 1;
                    self.diagnostics.record(EventKind::NodeQueued {
                        node: graph.key(node).clone(),
                        deficit,
                    });
                } else if deficit > 0 {
                    self.distribute(node, inputs, deficit.unsigned_abs(), Direction::Leftward)?;
                }
            }

            let totals = self.totals(node);
            self.last_seen.insert(node, totals);
            stack.extend(inputs.iter().rev().copied());
        }

        Ok(())
    }

    /// Rightward pass from one queued node
    fn flow_right(&mut self, queued: NodeId) -> Result<(), FlowError> {
        let graph = self.graph;
        let mut stack = vec![queued];

        while let Some(node) = stack.pop() {
            self.charge()?;

            let deficit = self.flows.deficit(node);

            // Balanced since it was queued, by flow arriving on another path
            if deficit == 0 {
                continue;
            }

            if deficit > 0 {
                return Err(FlowError::PositiveDeficit {
                    node: graph.key(node).clone(),
                    deficit,
                });
            }

            let outputs = graph.outputs(node);
            // Sinks keep their negative deficit
            if outputs.is_empty() {
                continue;
            }

            self.distribute(node, outputs, deficit.unsigned_abs(), Direction::Rightward)?;
            stack.extend(outputs.iter().rev().copied());
        }

        Ok(())
    }

    /// Load every zero-flow incoming edge with 1; true if any was loaded
    fn seed_inputs(&mut self, node: NodeId) -> bool {
        let graph = self.graph;
        let mut changed = false;

        for &input in graph.inputs(node) {
            if self.flows.get_flow(input, node) == 0 {
                self.flows.set_flow(input, node, 1);
                changed = true;
                self.diagnostics.record(EventKind::EdgeSeeded {
                    from: graph.key(input).clone(),
                    to: graph.key(node).clone(),
                });
            }
        }

        changed
    }

    fn distribute(
        &mut self,
        node: NodeId,
        edges: &[NodeId],
        amount: u64,
        direction: Direction,
    ) -> Result<(), FlowError> {
        let increments: Vec<u64> = split_evenly(amount, edges.len()).collect();

        for (&other, &delta) in edges.iter().zip(&increments) {
            match direction {
                Direction::Leftward => self.flows.increase_flow(other, node, delta)?,
                Direction::Rightward => self.flows.increase_flow(node, other, delta)?,
            }
        }

        self.diagnostics.record(EventKind::FlowDistributed {
            node: self.graph.key(node).clone(),
            direction,
            amount,
            increments,
        });
        Ok(())
    }
}
