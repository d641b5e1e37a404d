//! Offline reconciliation of already-captured transcripts.

use std::path::PathBuf;

use ubt::{ConsoleSink, colors};
use ubt_recon::{NullSink, ReconSink, Verdict, reconcile_with_sink};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Reconcile each transcript file and report per-file verdicts.
pub fn cmd_check(transcripts: &[PathBuf], quiet: bool) -> i32 {
    let mut failed = 0usize;

    for path in transcripts {
        let transcript = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                failed += 1;
                continue;
            }
        };

        let mut console = ConsoleSink;
        let mut null = NullSink;
        let sink: &mut dyn ReconSink = if quiet { &mut null } else { &mut console };

        match reconcile_with_sink(&transcript, sink) {
            Verdict::Pass => {
                println!(
                    "{}PASS{} {}",
                    colors::GREEN,
                    colors::RESET,
                    path.display()
                );
            }
            Verdict::Fail(failure) => {
                println!(
                    "{}FAIL{} {} ({failure})",
                    colors::RED,
                    colors::RESET,
                    path.display()
                );
                failed += 1;
            }
        }
    }

    if failed == 0 { EXIT_SUCCESS } else { EXIT_FAILURE }
}
