//! Traversal limits for flow initialisation
//!
//! Both passes may revisit a node once per changed path reaching it. On
//! graphs with many merge points that count can grow quickly, so every
//! node visit is charged against a budget.

use serde::Deserialize;

/// Limits applied by `FlowInitialiser`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraversalLimits {
    /// Maximum node visits across phases 1 and 2
    pub max_visits: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_visits: 10_000_000,
        }
    }
}

impl TraversalLimits {
    pub fn with_max_visits(mut self, max_visits: usize) -> Self {
        self.max_visits = max_visits;
        self
    }
}

/// Counts visits against a `TraversalLimits` budget
#[derive(Debug, Clone, Default)]
pub(crate) struct VisitCounter {
    limit: usize,
    used: usize,
}

impl VisitCounter {
    pub(crate) fn new(limits: &TraversalLimits) -> Self {
        Self {
            limit: limits.max_visits,
            used: 0,
        }
    }

    /// Charge one visit; `false` once the budget is spent
    #[inline]
    pub(crate) fn charge(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }
}
