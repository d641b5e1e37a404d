//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ubt::FwArch;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "ubt")]
#[command(about = "QEMU-based UBSan firmware boot-test harness")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Boot the firmware under QEMU and reconcile its console transcript
    Run {
        /// Path to the firmware image
        #[arg(value_name = "FW")]
        fw_path: PathBuf,

        /// ESP build directory exposed to the guest as a FAT boot drive
        #[arg(long, value_name = "DIR")]
        build_path: PathBuf,

        /// Directory transcripts are saved under (in an ubsan_tests/ subdir)
        #[arg(long, value_name = "DIR", default_value = ".")]
        tests_dir_path: PathBuf,

        /// Firmware architecture
        #[arg(long, value_enum, default_value = "x64")]
        fw_arch: FwArchArg,

        /// Disable the rdrand CPU flag
        #[arg(long)]
        no_rdrand: bool,

        /// Test groups to check (comma-separated, or "all")
        #[arg(long = "test-ubsan-group", value_name = "GROUPS", default_value = "undefined")]
        test_groups: String,

        /// Console capture timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
    /// Reconcile already-captured transcript files
    Check {
        /// Transcript files to reconcile
        #[arg(value_name = "TRANSCRIPT", required = true)]
        transcripts: Vec<PathBuf>,

        /// Suppress per-group progress output
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Firmware architecture argument.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum FwArchArg {
    /// 64-bit x86 firmware (default)
    #[default]
    X64,
    /// 32-bit x86 firmware
    Ia32,
    /// 64-bit ARM firmware
    Aarch64,
}

impl From<FwArchArg> for FwArch {
    fn from(arg: FwArchArg) -> Self {
        match arg {
            FwArchArg::X64 => Self::X64,
            FwArchArg::Ia32 => Self::Ia32,
            FwArchArg::Aarch64 => Self::Aarch64,
        }
    }
}
