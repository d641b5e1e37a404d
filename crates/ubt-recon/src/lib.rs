//! Transcript reconciliation for UBSan firmware boot tests.
//!
//! A booted firmware image emits two interleaved streams on its console: the
//! test harness marks check-group boundaries and reports observed results
//! (`UBT:` lines), while the Undefined Behavior Sanitizer emits raw
//! diagnostics (`UBSan:` lines). This crate walks the captured transcript
//! once and decides whether every expected check fired, in the right nesting
//! order, with content matching the reported template.
//!
//! # Example
//!
//! ```
//! use ubt_recon::reconcile;
//!
//! let transcript = "\
//! UBT: Start testing cases with BOUNDS - \n\
//! UBSan: runtime error: index out of bounds\n\
//! UBT: index out of bounds\n\
//! UBT: Checks with BOUNDS are done\n";
//!
//! assert!(reconcile(transcript).passed());
//! ```

mod engine;
pub mod markers;
mod sink;

pub use engine::{ReconFailure, Verdict, reconcile, reconcile_with_sink};
pub use sink::{NullSink, ReconEvent, ReconSink, RecordingSink};
