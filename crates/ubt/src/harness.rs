//! Per-group harness runner.
//!
//! Boots the firmware once per requested group, persists the captured
//! transcript, reconciles it, and reports pass/fail results.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use ubt_recon::{NullSink, ReconSink, Verdict, reconcile_with_sink};

use crate::groups::TestGroup;
use crate::qemu::{BootConfig, DEFAULT_TIMEOUT_SECS, FwArch, boot_and_capture};

/// Subdirectory of the tests dir that transcripts are saved under.
pub const TRANSCRIPTS_SUBDIR: &str = "ubsan_tests";

/// Outcome of one group run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pass,
    Fail,
}

impl RunStatus {
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Result of booting and reconciling one test group.
#[derive(Debug, Clone)]
pub struct GroupRun {
    pub group: TestGroup,
    pub status: RunStatus,
    /// Failure detail, if failed.
    pub detail: Option<String>,
}

impl GroupRun {
    /// Create a passing result.
    #[must_use]
    pub const fn pass(group: TestGroup) -> Self {
        Self {
            group,
            status: RunStatus::Pass,
            detail: None,
        }
    }

    /// Create a failing result.
    pub fn fail(group: TestGroup, detail: impl Into<String>) -> Self {
        Self {
            group,
            status: RunStatus::Fail,
            detail: Some(detail.into()),
        }
    }
}

/// Summary over all group runs.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<GroupRun>,
}

impl RunSummary {
    /// Total number of group runs.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Whether every group reconciled cleanly.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Add a result to the summary.
    pub fn add(&mut self, run: GroupRun) {
        match run.status {
            RunStatus::Pass => self.passed += 1,
            RunStatus::Fail => {
                self.failed += 1;
                self.failures.push(run);
            }
        }
    }
}

/// Configuration for running the harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Firmware image path.
    pub fw_path: PathBuf,
    /// ESP build directory exposed to the guest.
    pub esp_dir: PathBuf,
    /// Directory transcripts are persisted under (in [`TRANSCRIPTS_SUBDIR`]).
    pub tests_dir: PathBuf,
    /// Capture timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to enable the rdrand CPU flag.
    pub rdrand: bool,
    /// Firmware architecture.
    pub arch: FwArch,
}

impl HarnessConfig {
    /// Create a config with defaults for everything but the paths.
    pub fn new(fw_path: impl Into<PathBuf>, esp_dir: impl Into<PathBuf>) -> Self {
        Self {
            fw_path: fw_path.into(),
            esp_dir: esp_dir.into(),
            tests_dir: PathBuf::from("."),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rdrand: true,
            arch: FwArch::default(),
        }
    }

    /// Set the tests directory.
    #[must_use]
    pub fn with_tests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tests_dir = dir.into();
        self
    }

    /// Set the capture timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Toggle the rdrand CPU flag.
    #[must_use]
    pub fn with_rdrand(mut self, rdrand: bool) -> Self {
        self.rdrand = rdrand;
        self
    }

    /// Set the firmware architecture.
    #[must_use]
    pub fn with_arch(mut self, arch: FwArch) -> Self {
        self.arch = arch;
        self
    }

    /// Derive the boot configuration for one firmware run.
    #[must_use]
    pub fn boot_config(&self) -> BootConfig {
        BootConfig::new(&self.fw_path, &self.esp_dir)
            .with_timeout(self.timeout_secs)
            .with_rdrand(self.rdrand)
            .with_arch(self.arch)
    }
}

/// Sink that prints reconciliation progress to stdout, in the format the
/// transcript consumers expect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ReconSink for ConsoleSink {
    fn group_opened(&mut self, name: &str) {
        println!("{name} start ...");
    }

    fn group_closed(&mut self, name: &str) {
        println!("{name}: OK ...");
    }
}

/// Observer for the lifecycle of a group run.
///
/// Extends [`ReconSink`] with hooks around the boot, persist, and reconcile
/// steps, so callers can decorate the run (spinner, progress lines) without
/// duplicating the sequence itself. All methods have empty default bodies.
pub trait RunObserver: ReconSink {
    /// A group run is about to start.
    fn run_started(&mut self, _group: TestGroup, _index: usize, _total: usize) {}

    /// The emulator is about to boot.
    fn boot_started(&mut self, _config: &HarnessConfig) {}

    /// The boot produced no usable transcript (spawn error or timeout).
    fn boot_failed(&mut self, _detail: &str) {}

    /// The terminal marker appeared before the timeout.
    fn marker_reached(&mut self) {}

    /// The captured transcript was written to disk.
    fn transcript_persisted(&mut self, _path: &Path) {}

    /// The transcript could not be written. Not fatal to the run.
    fn persist_failed(&mut self, _error: &std::io::Error) {}

    /// Reconciliation of the captured transcript is about to start.
    fn reconcile_started(&mut self) {}

    /// A group run finished, pass or fail.
    fn run_finished(&mut self, _run: &GroupRun, _index: usize, _total: usize) {}
}

impl RunObserver for NullSink {}
impl RunObserver for ConsoleSink {}

/// Boot the firmware and reconcile the captured transcript for one group.
///
/// The transcript is persisted under `<tests_dir>/ubsan_tests/<group>.txt`
/// whenever the boot reached the terminal marker; failure to persist is
/// logged, not fatal. Progress flows through `observer`, which also serves
/// as the reconciliation sink.
#[must_use]
pub fn run_group<O: RunObserver>(
    group: TestGroup,
    config: &HarnessConfig,
    observer: &mut O,
) -> GroupRun {
    observer.boot_started(config);
    let outcome = match boot_and_capture(&config.boot_config()) {
        Ok(o) => o,
        Err(e) => {
            let detail = format!("boot failed: {e}");
            observer.boot_failed(&detail);
            return GroupRun::fail(group, detail);
        }
    };

    if !outcome.marker_seen {
        let detail = format!(
            "firmware did not reach the terminal marker within {}s",
            config.timeout_secs
        );
        observer.boot_failed(&detail);
        return GroupRun::fail(group, detail);
    }
    observer.marker_reached();

    let out_dir = config.tests_dir.join(TRANSCRIPTS_SUBDIR);
    match persist_transcript(&out_dir, group, &outcome.transcript) {
        Ok(path) => observer.transcript_persisted(&path),
        Err(e) => {
            warn!(group = %group, error = %e, "failed to persist transcript");
            observer.persist_failed(&e);
        }
    }

    observer.reconcile_started();
    match reconcile_with_sink(&outcome.transcript, observer) {
        Verdict::Pass => GroupRun::pass(group),
        Verdict::Fail(failure) => GroupRun::fail(group, failure.to_string()),
    }
}

/// Run every requested group in order and accumulate the summary.
#[must_use]
pub fn run_all<O: RunObserver>(
    groups: &[TestGroup],
    config: &HarnessConfig,
    observer: &mut O,
) -> RunSummary {
    let total = groups.len();
    let mut summary = RunSummary::default();
    for (i, &group) in groups.iter().enumerate() {
        observer.run_started(group, i + 1, total);
        let run = run_group(group, config, observer);
        observer.run_finished(&run, i + 1, total);
        summary.add(run);
    }
    summary
}

/// Write a captured transcript to `<dir>/<group lowercase>.txt`.
///
/// # Errors
///
/// Returns errors from directory creation or the file write.
pub fn persist_transcript(
    dir: &Path,
    group: TestGroup,
    transcript: &str,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(group.transcript_file_name());
    let mut file = std::fs::File::create(&path)?;
    file.write_all(transcript.as_bytes())?;
    Ok(path)
}

/// ANSI color codes.
pub mod colors {
    pub const RED: &str = "\x1b[0;31m";
    pub const GREEN: &str = "\x1b[0;32m";
    pub const RESET: &str = "\x1b[0m";
}

/// Print a group run result line.
pub fn print_result(run: &GroupRun, index: usize, total: usize) {
    match run.status {
        RunStatus::Pass => {
            println!(
                "[{}/{}] {}PASS{} {}",
                index,
                total,
                colors::GREEN,
                colors::RESET,
                run.group
            );
        }
        RunStatus::Fail => {
            let detail = run.detail.as_deref().unwrap_or("unknown");
            println!(
                "[{}/{}] {}FAIL{} {} ({})",
                index,
                total,
                colors::RED,
                colors::RESET,
                run.group,
                detail
            );
        }
    }
}

/// Print the run summary.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("================================");
    println!(
        "{}PASSED{}: {}",
        colors::GREEN,
        colors::RESET,
        summary.passed
    );
    println!("{}FAILED{}: {}", colors::RED, colors::RESET, summary.failed);
    println!();

    if !summary.failures.is_empty() {
        println!("Failures:");
        for failure in &summary.failures {
            let detail = failure.detail.as_deref().unwrap_or("unknown");
            println!("  {} ({})", failure.group, detail);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_creation() {
        let pass = GroupRun::pass(TestGroup::Bounds);
        assert_eq!(pass.status, RunStatus::Pass);
        assert!(pass.detail.is_none());

        let fail = GroupRun::fail(TestGroup::Integer, "nesting violated");
        assert_eq!(fail.status, RunStatus::Fail);
        assert_eq!(fail.detail.as_deref(), Some("nesting violated"));
    }

    #[test]
    fn test_summary_accounting() {
        let mut summary = RunSummary::default();
        summary.add(GroupRun::pass(TestGroup::Bounds));
        summary.add(GroupRun::pass(TestGroup::Integer));
        summary.add(GroupRun::fail(TestGroup::Nonnull, "boot failed"));

        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.all_passed());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].group, TestGroup::Nonnull);
    }

    #[test]
    fn test_persist_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist_transcript(dir.path(), TestGroup::Alignment, "UBT: line\n").unwrap();
        assert_eq!(path.file_name().unwrap(), "alignment.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "UBT: line\n");
    }

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl ReconSink for EventLog {}

    impl RunObserver for EventLog {
        fn run_started(&mut self, group: TestGroup, index: usize, total: usize) {
            self.events.push(format!("start {group} {index}/{total}"));
        }

        fn boot_failed(&mut self, _detail: &str) {
            self.events.push("boot failed".to_string());
        }

        fn run_finished(&mut self, run: &GroupRun, index: usize, total: usize) {
            self.events
                .push(format!("finish {} {}/{} {:?}", run.group, index, total, run.status));
        }
    }

    #[test]
    fn test_run_all_drives_each_group_through_the_observer() {
        // A nonexistent firmware image fails every group, whether the
        // emulator is installed or not.
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::new(dir.path().join("missing.fd"), dir.path())
            .with_tests_dir(dir.path())
            .with_timeout(1);

        let groups = [TestGroup::Bounds, TestGroup::Integer];
        let mut log = EventLog::default();
        let summary = run_all(&groups, &config, &mut log);

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(
            log.events,
            vec![
                "start BOUNDS 1/2",
                "boot failed",
                "finish BOUNDS 1/2 Fail",
                "start INTEGER 2/2",
                "boot failed",
                "finish INTEGER 2/2 Fail",
            ]
        );
    }

    #[test]
    fn test_boot_config_carries_harness_settings() {
        let config = HarnessConfig::new("fw.fd", "esp")
            .with_timeout(30)
            .with_rdrand(false)
            .with_arch(FwArch::Ia32);
        let boot = config.boot_config();
        assert_eq!(boot.timeout_secs, 30);
        assert!(!boot.rdrand);
        assert_eq!(boot.arch, FwArch::Ia32);
    }
}
