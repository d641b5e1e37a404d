//! Boot-and-reconcile command.

use std::path::Path;

use ubt::{
    ConsoleSink, GroupRun, HarnessConfig, RunObserver, RunStatus, TestGroup, print_result,
    print_summary, run_all,
};
use ubt_recon::ReconSink;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, FwArchArg};
use crate::terminal::Spinner;

/// Boot the firmware once per requested group and reconcile each transcript.
pub fn cmd_run(
    fw_path: &Path,
    build_path: &Path,
    tests_dir_path: &Path,
    fw_arch: FwArchArg,
    rdrand: bool,
    test_groups: &str,
    timeout: u64,
) -> i32 {
    // Validate the group selection before touching the emulator.
    let groups = match TestGroup::parse_list(test_groups) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FAILURE;
        }
    };

    if !fw_path.exists() {
        eprintln!("Error: firmware image not found: {}", fw_path.display());
        return EXIT_FAILURE;
    }
    if !build_path.exists() {
        eprintln!("Error: build directory not found: {}", build_path.display());
        return EXIT_FAILURE;
    }

    let config = HarnessConfig::new(fw_path, build_path)
        .with_tests_dir(tests_dir_path)
        .with_timeout(timeout)
        .with_rdrand(rdrand)
        .with_arch(fw_arch.into());

    let mut observer = TerminalObserver::default();
    let summary = run_all(&groups, &config, &mut observer);
    print_summary(&summary);

    if summary.all_passed() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// Observer decorating the run with a boot spinner and the progress lines
/// the transcript consumers expect.
#[derive(Default)]
struct TerminalObserver {
    spinner: Option<Spinner>,
    sink: ConsoleSink,
}

impl ReconSink for TerminalObserver {
    fn group_opened(&mut self, name: &str) {
        self.sink.group_opened(name);
    }

    fn group_closed(&mut self, name: &str) {
        self.sink.group_closed(name);
    }
}

impl RunObserver for TerminalObserver {
    fn run_started(&mut self, group: TestGroup, _index: usize, _total: usize) {
        println!("Checking a {group} group ...");
    }

    fn boot_started(&mut self, config: &HarnessConfig) {
        self.spinner = Some(Spinner::new(format!(
            "Booting {} ...",
            config.fw_path.display()
        )));
    }

    fn boot_failed(&mut self, detail: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_failure(detail);
        }
    }

    fn marker_reached(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_success("Firmware reached the terminal marker");
        }
    }

    fn transcript_persisted(&mut self, path: &Path) {
        println!("Transcript saved to {}", path.display());
    }

    fn persist_failed(&mut self, error: &std::io::Error) {
        eprintln!("Warning: failed to persist transcript: {error}");
    }

    fn reconcile_started(&mut self) {
        println!("Parsing result ...");
    }

    fn run_finished(&mut self, run: &GroupRun, index: usize, total: usize) {
        if run.status == RunStatus::Pass {
            println!("OK");
        }
        print_result(run, index, total);
    }
}
