//! Command implementations.
//!
//! Each submodule handles a specific CLI command.

mod check;
mod run;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Run { .. } => handle_run(cli),
        Commands::Check { .. } => handle_check(cli),
    }
}

fn handle_run(cli: &Cli) -> i32 {
    let Commands::Run {
        fw_path,
        build_path,
        tests_dir_path,
        fw_arch,
        no_rdrand,
        test_groups,
        timeout,
    } = &cli.command
    else {
        unreachable!("run command variant mismatch");
    };

    run::cmd_run(
        fw_path,
        build_path,
        tests_dir_path,
        *fw_arch,
        !no_rdrand,
        test_groups,
        *timeout,
    )
}

fn handle_check(cli: &Cli) -> i32 {
    let Commands::Check { transcripts, quiet } = &cli.command else {
        unreachable!("check command variant mismatch");
    };

    check::cmd_check(transcripts, *quiet)
}
