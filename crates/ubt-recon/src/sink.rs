//! Progress and failure sinks for the reconciliation engine.
//!
//! The engine reports what it sees through an explicit sink instead of a
//! process-wide logger, so callers decide how to surface progress (CLI
//! printing, structured capture in tests, or nothing at all).

use crate::engine::ReconFailure;

/// Receiver for reconciliation progress events.
///
/// All methods have empty default bodies; implement only what you care about.
pub trait ReconSink {
    /// A check group was opened.
    fn group_opened(&mut self, _name: &str) {}

    /// A check group closed in the correct order.
    fn group_closed(&mut self, _name: &str) {}

    /// A result report matched the oldest pending diagnostic.
    fn check_matched(&mut self, _group: Option<&str>, _line: &str) {}

    /// The scan stopped on an inconsistency.
    fn failure(&mut self, _failure: &ReconFailure) {}
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReconSink for NullSink {}

/// Structured event record, as accumulated by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconEvent {
    GroupOpened(String),
    GroupClosed(String),
    CheckMatched {
        group: Option<String>,
        line: String,
    },
    Failure(ReconFailure),
}

/// Sink that accumulates every event for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<ReconEvent>,
}

impl ReconSink for RecordingSink {
    fn group_opened(&mut self, name: &str) {
        self.events.push(ReconEvent::GroupOpened(name.to_string()));
    }

    fn group_closed(&mut self, name: &str) {
        self.events.push(ReconEvent::GroupClosed(name.to_string()));
    }

    fn check_matched(&mut self, group: Option<&str>, line: &str) {
        self.events.push(ReconEvent::CheckMatched {
            group: group.map(String::from),
            line: line.to_string(),
        });
    }

    fn failure(&mut self, failure: &ReconFailure) {
        self.events.push(ReconEvent::Failure(failure.clone()));
    }
}
