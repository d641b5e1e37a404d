//! The reconciliation engine: a single forward pass over the transcript.
//!
//! Two structures carry the scan state. Open check groups live on a stack
//! (nesting must be strictly last-opened-first-closed) and raw sanitizer
//! diagnostics queue up FIFO until a harness result report consumes the
//! oldest one. The first inconsistency terminates the scan.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::debug;

use crate::markers::{
    GROUP_CLOSE_PREFIX, GROUP_CLOSE_SUFFIX, GROUP_NAME_SUFFIX_WIDTH, GROUP_OPEN_MARKER,
    PTR_PLACEHOLDER, UBSAN_MARKER, UBT_MARKER, WILDCARD,
};
use crate::sink::{NullSink, ReconSink};

/// Why a transcript failed reconciliation.
///
/// One structured record per failure; the scan stops at the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconFailure {
    /// A group close names a different group than the most recently opened.
    #[error("check group nesting order violated: expected '{expected}' to close, got '{found}'")]
    NestingViolation { expected: String, found: String },

    /// A group close arrived with no group open at all.
    #[error("check group '{group}' closed but no group is open")]
    UnbalancedClose { group: String },

    /// A result report arrived before any sanitizer diagnostic.
    #[error(
        "the sanitizer produced no diagnostic for a check in group '{}': {}",
        .group.as_deref().unwrap_or("<none open>"),
        .line
    )]
    MissingDiagnostic { group: Option<String>, line: String },

    /// The oldest pending diagnostic does not contain the reported content.
    #[error(
        "sanitizer diagnostic did not match the expected content in group '{}': {}",
        .group.as_deref().unwrap_or("<none open>"),
        .line
    )]
    ContentMismatch { group: Option<String>, line: String },
}

/// Terminal outcome of one transcript scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(ReconFailure),
}

impl Verdict {
    /// Whether the transcript reconciled cleanly.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// The failure record, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ReconFailure> {
        match self {
            Self::Pass => None,
            Self::Fail(f) => Some(f),
        }
    }
}

/// Reconcile a transcript, discarding progress events.
#[must_use]
pub fn reconcile(transcript: &str) -> Verdict {
    reconcile_with_sink(transcript, &mut NullSink)
}

/// Reconcile a transcript, reporting progress and the failure (if any)
/// through `sink`.
///
/// Lines are split on carriage returns and/or newlines; blank lines are
/// dropped. A line containing `UBT:` is evaluated as a harness event; a line
/// containing `UBSan:` feeds the pending-diagnostic queue. The two checks are
/// independent on purpose: a line carrying both markers runs both branches.
pub fn reconcile_with_sink(transcript: &str, sink: &mut dyn ReconSink) -> Verdict {
    let mut open_groups: Vec<String> = Vec::new();
    let mut pending: VecDeque<String> = VecDeque::new();

    for line in transcript.split(['\r', '\n']).filter(|l| !l.is_empty()) {
        if line.contains(UBT_MARKER) {
            if let Some(failure) = harness_event(line, &mut open_groups, &mut pending, sink) {
                sink.failure(&failure);
                return Verdict::Fail(failure);
            }
        }
        if line.contains(UBSAN_MARKER) {
            // Every segment after a marker counts; a line with several
            // markers contributes several diagnostics.
            let mut segments = line.split(UBSAN_MARKER);
            segments.next();
            for diag in segments {
                debug!(diag, "pending sanitizer diagnostic");
                pending.push_back(diag.to_string());
            }
        }
    }

    Verdict::Pass
}

/// Handle one `UBT:` line. Returns the failure that should terminate the
/// scan, or `None` to keep going.
fn harness_event(
    line: &str,
    open_groups: &mut Vec<String>,
    pending: &mut VecDeque<String>,
    sink: &mut dyn ReconSink,
) -> Option<ReconFailure> {
    if let Some(rest) = text_after(line, GROUP_OPEN_MARKER) {
        let name = strip_decoration(rest);
        debug!(group = name, "check group opened");
        sink.group_opened(name);
        open_groups.push(name.to_string());
        return None;
    }

    if let Some(name) = close_group_name(line) {
        return match open_groups.pop() {
            None => Some(ReconFailure::UnbalancedClose {
                group: name.to_string(),
            }),
            Some(top) if top != name => Some(ReconFailure::NestingViolation {
                expected: top,
                found: name.to_string(),
            }),
            Some(_) => {
                debug!(group = name, "check group closed");
                sink.group_closed(name);
                None
            }
        };
    }

    // Any other UBT: line asserts a result for the oldest pending diagnostic.
    let Some(diag) = pending.pop_front() else {
        return Some(ReconFailure::MissingDiagnostic {
            group: open_groups.last().cloned(),
            line: line.to_string(),
        });
    };

    let diag = diag.to_lowercase();
    let expected = observed_result(line)
        .to_lowercase()
        .replace(PTR_PLACEHOLDER, WILDCARD);

    for fragment in expected.split(WILDCARD) {
        if !diag.contains(fragment) {
            return Some(ReconFailure::ContentMismatch {
                group: open_groups.last().cloned(),
                line: line.to_string(),
            });
        }
    }

    debug!(line, "check matched");
    sink.check_matched(open_groups.last().map(String::as_str), line);
    None
}

/// Text following the first occurrence of `marker`, if present.
fn text_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| &line[idx + marker.len()..])
}

/// Group name enclosed by the close markers, if both are present.
fn close_group_name(line: &str) -> Option<&str> {
    if !line.contains(GROUP_CLOSE_SUFFIX) {
        return None;
    }
    let rest = text_after(line, GROUP_CLOSE_PREFIX)?;
    Some(rest.split_once(GROUP_CLOSE_SUFFIX).map_or(rest, |(name, _)| name))
}

/// Observed result text of a report line: everything after the `UBT:` prefix,
/// leading whitespace stripped.
fn observed_result(line: &str) -> &str {
    text_after(line, UBT_MARKER).unwrap_or(line).trim_start()
}

/// Strip the fixed-width decoration the transcript producer appends to a
/// group name in the open marker.
fn strip_decoration(name: &str) -> &str {
    let keep = name.chars().count().saturating_sub(GROUP_NAME_SUFFIX_WIDTH);
    match name.char_indices().nth(keep) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
