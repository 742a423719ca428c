//! Diagnostics sinks for flow initialisation
//!
//! The algorithm reports what it does through an injected sink instead of a
//! global logger. Sinks carry no algorithmic state: dropping every event
//! does not change the computed flow.

use crate::event_log::EventKind;

/// Receiver of initialisation events
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, kind: EventKind);
}

/// Forwards events to `tracing` at TRACE level (default sink)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, kind: EventKind) {
        match &kind {
            EventKind::EdgeSeeded { from, to } => {
                tracing::trace!(%from, %to, "Seeding minimum flow");
            }
            EventKind::NodeQueued { node, deficit } => {
                tracing::trace!(%node, deficit, "Queued for rightward review");
            }
            EventKind::FlowDistributed {
                node,
                direction,
                amount,
                ..
            } => {
                tracing::trace!(%node, ?direction, amount, "Distributing deficit");
            }
            EventKind::InitialisationFailed { error } => {
                tracing::warn!(%error, "Flow initialisation failed");
            }
            other => tracing::trace!(event = ?other),
        }
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _kind: EventKind) {}
}
