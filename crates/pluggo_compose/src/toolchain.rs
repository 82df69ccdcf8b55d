//! Native build toolchain invocation.

use crate::target::MainTargetMetadata;
use log::info;
use pluggo_core::{COMPOSED_CFG, COMPOSITION_UNIT_ENV};
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

const RUSTFLAGS_ENV: &str = "RUSTFLAGS";
const ENCODED_RUSTFLAGS_ENV: &str = "CARGO_ENCODED_RUSTFLAGS";
const ENCODED_SEPARATOR: char = '\x1f';

/// One build of the main target with an active composition unit.
#[derive(Debug, Clone, Copy)]
pub struct BuildJob<'a> {
    pub main: &'a MainTargetMetadata,
    pub unit_path: &'a Path,
}

/// Exit status and combined output of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    pub status: Option<i32>,
    pub output: String,
}

/// Builds the main target; additional targets are reached through the unit.
pub trait Toolchain {
    /// Runs the build to completion. `Err` means the toolchain could not be
    /// run at all; a failed compile is an `Ok` outcome with `success = false`.
    fn build(&self, job: &BuildJob<'_>) -> io::Result<BuildOutcome>;
}

/// `cargo build` scoped to the main package's manifest.
#[derive(Debug, Clone)]
pub struct CargoToolchain {
    program: OsString,
}

impl CargoToolchain {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Prepares the cargo command for `job` without running it.
    pub fn command(&self, job: &BuildJob<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("build")
            .arg("--manifest-path")
            .arg(&job.main.manifest_path)
            .current_dir(&job.main.package_dir)
            .env(COMPOSITION_UNIT_ENV, job.unit_path);

        match std::env::var(ENCODED_RUSTFLAGS_ENV) {
            // Cargo ignores RUSTFLAGS whenever the encoded form is present.
            Ok(encoded) => {
                command.env(ENCODED_RUSTFLAGS_ENV, composed_encoded_rustflags(&encoded));
            }
            Err(_) => {
                let existing = std::env::var(RUSTFLAGS_ENV).ok();
                command.env(RUSTFLAGS_ENV, composed_rustflags(existing.as_deref()));
            }
        }
        command
    }
}

impl Default for CargoToolchain {
    fn default() -> Self {
        Self::new("cargo")
    }
}

impl Toolchain for CargoToolchain {
    fn build(&self, job: &BuildJob<'_>) -> io::Result<BuildOutcome> {
        let started_at = Instant::now();
        let output = self.command(job).output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        info!(
            "event=toolchain_build module=compose status={} exit_code={} duration_ms={}",
            if output.status.success() { "ok" } else { "error" },
            output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            started_at.elapsed().as_millis()
        );
        Ok(BuildOutcome {
            success: output.status.success(),
            status: output.status.code(),
            output: combined,
        })
    }
}

/// Appends the composition cfg to space-separated `RUSTFLAGS`.
pub fn composed_rustflags(existing: Option<&str>) -> String {
    match existing.map(str::trim) {
        Some(flags) if !flags.is_empty() => format!("{flags} --cfg {COMPOSED_CFG}"),
        _ => format!("--cfg {COMPOSED_CFG}"),
    }
}

/// Appends the composition cfg to `CARGO_ENCODED_RUSTFLAGS`.
pub fn composed_encoded_rustflags(existing: &str) -> String {
    let appended = format!("--cfg{ENCODED_SEPARATOR}{COMPOSED_CFG}");
    if existing.is_empty() {
        appended
    } else {
        format!("{existing}{ENCODED_SEPARATOR}{appended}")
    }
}
