//! Integration tests over persisted transcript files.
//!
//! Exercises the offline path: transcripts written to disk, read back, and
//! reconciled the way the `check` command does it.

use std::path::Path;

use ubt::{HarnessConfig, RunStatus, TestGroup, persist_transcript, run_group};
use ubt_recon::{NullSink, ReconFailure, Verdict, reconcile};

/// Transcript of a clean UNDEFINED group run, as captured up to (but not
/// including) the terminal marker.
const CLEAN_TRANSCRIPT: &str = "\
UBT: Start testing cases with UNDEFINED - \r\n\
UBSan: load of value 3 which is not valid for type 'bool'\r\n\
UBT: load of value [[ptr:0x[0-9a-f]*]] which is not valid\r\n\
UBT: Checks with UNDEFINED are done\r\n";

fn reconcile_file(path: &Path) -> Verdict {
    let transcript = std::fs::read_to_string(path).expect("transcript should be readable");
    reconcile(&transcript)
}

#[test]
fn test_persisted_transcript_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = persist_transcript(dir.path(), TestGroup::Undefined, CLEAN_TRANSCRIPT).unwrap();
    assert!(reconcile_file(&path).passed());
}

#[test]
fn test_persisted_failure_is_detected() {
    let broken = "\
UBT: Start testing cases with INTEGER - \n\
UBT: signed integer overflow\n";

    let dir = tempfile::tempdir().unwrap();
    let path = persist_transcript(dir.path(), TestGroup::Integer, broken).unwrap();

    match reconcile_file(&path) {
        Verdict::Fail(ReconFailure::MissingDiagnostic { group, .. }) => {
            assert_eq!(group.as_deref(), Some("INTEGER"));
        }
        other => panic!("unexpected verdict: {other:?}"),
    }
}

#[test]
fn test_transcript_files_per_group_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let a = persist_transcript(dir.path(), TestGroup::Bounds, "a").unwrap();
    let b = persist_transcript(dir.path(), TestGroup::Nonnull, "b").unwrap();
    assert_ne!(a, b);
    assert_eq!(std::fs::read_to_string(a).unwrap(), "a");
    assert_eq!(std::fs::read_to_string(b).unwrap(), "b");
}

#[test]
fn test_run_group_fails_without_firmware() {
    // Whether QEMU is installed or not, booting a nonexistent image must
    // come back as a failing run, not a panic.
    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig::new(dir.path().join("missing.fd"), dir.path())
        .with_tests_dir(dir.path())
        .with_timeout(2);

    let run = run_group(TestGroup::Undefined, &config, &mut NullSink);
    assert_eq!(run.status, RunStatus::Fail);
    assert!(run.detail.is_some());
}
