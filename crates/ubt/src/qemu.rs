//! QEMU boot capture.
//!
//! Boots the firmware image with the ESP directory exposed as a FAT boot
//! drive and streams the serial console through a pipe until the terminal
//! marker appears, the guest exits, or the timeout expires.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use ubt_recon::markers::ALL_TESTS_DONE_MARKER;

/// Default console capture timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Firmware architecture, selecting the QEMU system emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FwArch {
    #[default]
    X64,
    Ia32,
    Aarch64,
}

impl FwArch {
    /// QEMU system binary for this architecture.
    #[must_use]
    pub const fn qemu_system(self) -> &'static str {
        match self {
            Self::X64 => "qemu-system-x86_64",
            Self::Ia32 => "qemu-system-i386",
            Self::Aarch64 => "qemu-system-aarch64",
        }
    }

    /// CPU model argument enabling the rdrand instruction, where the
    /// architecture has one.
    #[must_use]
    pub const fn rdrand_cpu(self) -> Option<&'static str> {
        match self {
            Self::X64 => Some("qemu64,+rdrand"),
            Self::Ia32 => Some("qemu32,+rdrand"),
            Self::Aarch64 => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "X64",
            Self::Ia32 => "IA32",
            Self::Aarch64 => "AARCH64",
        }
    }
}

impl std::fmt::Display for FwArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boot capture errors.
#[derive(Error, Debug)]
pub enum QemuError {
    #[error("failed to spawn {emulator}: {source}")]
    Spawn {
        emulator: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("emulator stdout was not captured")]
    NoStdout,
    #[error("I/O error while capturing console: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for one firmware boot.
#[derive(Debug, Clone)]
pub struct BootConfig {
    /// Firmware image path.
    pub fw_path: PathBuf,
    /// ESP directory exposed to the guest as a FAT boot drive.
    pub esp_dir: PathBuf,
    /// Marker that signals capture completion.
    pub expected_marker: String,
    /// Capture timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to enable the rdrand CPU flag.
    pub rdrand: bool,
    /// Firmware architecture.
    pub arch: FwArch,
}

impl BootConfig {
    /// Create a config with defaults for everything but the paths.
    pub fn new(fw_path: impl Into<PathBuf>, esp_dir: impl Into<PathBuf>) -> Self {
        Self {
            fw_path: fw_path.into(),
            esp_dir: esp_dir.into(),
            expected_marker: ALL_TESTS_DONE_MARKER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rdrand: true,
            arch: FwArch::default(),
        }
    }

    /// Set the expected terminal marker.
    #[must_use]
    pub fn with_expected_marker(mut self, marker: impl Into<String>) -> Self {
        self.expected_marker = marker.into();
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

    /// Arguments passed to the QEMU system binary.
    #[must_use]
    pub fn qemu_args(&self) -> Vec<String> {
        let mut args = vec![
            "-nographic".to_string(),
            "-net".to_string(),
            "none".to_string(),
            "-bios".to_string(),
            self.fw_path.display().to_string(),
            "-hda".to_string(),
            format!("fat:rw:{}", self.esp_dir.display()),
        ];
        if self.rdrand {
            if let Some(cpu) = self.arch.rdrand_cpu() {
                args.push("-cpu".to_string());
                args.push(cpu.to_string());
            }
        }
        args
    }
}

/// Result of one boot capture: the success flag plus the full transcript.
#[derive(Debug, Clone)]
pub struct BootOutcome {
    /// Whether the terminal marker appeared before the timeout.
    pub marker_seen: bool,
    /// Everything captured from the console.
    pub transcript: String,
}

/// Kills the emulator when the capture is done with it.
struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Boot the firmware and capture its console until the expected marker,
/// guest exit, or timeout.
///
/// # Errors
///
/// Returns errors from spawning QEMU or wiring up the console pipe. A
/// timeout is not an error; it yields an outcome with `marker_seen` false.
pub fn boot_and_capture(config: &BootConfig) -> Result<BootOutcome, QemuError> {
    let emulator = config.arch.qemu_system();
    debug!(emulator, args = ?config.qemu_args(), "booting firmware");

    let mut cmd = Command::new(emulator);
    cmd.args(config.qemu_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|source| QemuError::Spawn { emulator, source })?;
    let stdout = child.stdout.take().ok_or(QemuError::NoStdout)?;
    let guard = KillOnDrop(child);

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(line.clone()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let deadline = Instant::now() + Duration::from_secs(config.timeout_secs);
    let mut transcript = String::new();
    let mut marker_seen = false;

    loop {
        let now = Instant::now();
        if now >= deadline {
            debug!("console capture timed out");
            break;
        }
        match rx.recv_timeout(deadline - now) {
            Ok(line) => {
                // The transcript ends where the marker begins; the marker
                // line itself is not part of it.
                if let Some(before) = text_before(&line, &config.expected_marker) {
                    transcript.push_str(before);
                    marker_seen = true;
                    break;
                }
                transcript.push_str(&line);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                debug!("console capture timed out");
                break;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Guest exited (or the pipe broke) before the marker.
                debug!("console stream ended before the terminal marker");
                break;
            }
        }
    }

    drop(guard);
    Ok(BootOutcome {
        marker_seen,
        transcript,
    })
}

/// Text preceding the first occurrence of `marker`, if the marker is there.
fn text_before<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| &line[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qemu_args_default() {
        let config = BootConfig::new("fw.fd", "build/esp");
        let args = config.qemu_args();
        assert_eq!(
            args,
            vec![
                "-nographic",
                "-net",
                "none",
                "-bios",
                "fw.fd",
                "-hda",
                "fat:rw:build/esp",
                "-cpu",
                "qemu64,+rdrand",
            ]
        );
    }

    #[test]
    fn test_qemu_args_no_rdrand() {
        let config = BootConfig::new("fw.fd", "esp").with_rdrand(false);
        assert!(!config.qemu_args().iter().any(|a| a == "-cpu"));
    }

    #[test]
    fn test_qemu_args_aarch64_has_no_rdrand_cpu() {
        let config = BootConfig::new("fw.fd", "esp").with_arch(FwArch::Aarch64);
        assert!(!config.qemu_args().iter().any(|a| a == "-cpu"));
        assert_eq!(config.arch.qemu_system(), "qemu-system-aarch64");
    }

    #[test]
    fn test_text_before_cuts_at_marker() {
        assert_eq!(
            text_before("noise UBT: All tests are done...\n", ALL_TESTS_DONE_MARKER),
            Some("noise ")
        );
        assert_eq!(
            text_before("UBT: Checks with BOUNDS are done", ALL_TESTS_DONE_MARKER),
            None
        );
    }

    #[test]
    fn test_default_marker_and_timeout() {
        let config = BootConfig::new("fw.fd", "esp");
        assert_eq!(config.expected_marker, ALL_TESTS_DONE_MARKER);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.rdrand);
    }
}
