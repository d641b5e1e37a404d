//! UBT - UBSan firmware boot-test harness.
//!
//! Boots a firmware image under QEMU, captures its console transcript until
//! the firmware announces that the sanitizer self-tests have finished, and
//! reconciles the transcript against the checks the test harness reported.
//!
//! # Example
//!
//! ```ignore
//! use ubt::{HarnessConfig, TestGroup, run_group};
//! use ubt_recon::NullSink;
//!
//! let config = HarnessConfig::new("firmware.fd", "build/esp");
//! let run = run_group(TestGroup::Undefined, &config, &mut NullSink);
//! assert!(run.status.is_pass());
//! ```

mod groups;
mod harness;
mod qemu;

pub use groups::TestGroup;
pub use harness::{
    ConsoleSink, GroupRun, HarnessConfig, RunObserver, RunStatus, RunSummary, TRANSCRIPTS_SUBDIR,
    colors, persist_transcript, print_result, print_summary, run_all, run_group,
};
pub use qemu::{BootConfig, BootOutcome, FwArch, QemuError, boot_and_capture};
