//! The composition pipeline.
//!
//! # Responsibility
//! - Resolve targets, import the main target, synthesize and activate the
//!   composition unit, run the toolchain, remove the unit.
//!
//! # Invariants
//! - Every failure is fatal to the invocation; nothing is retried.
//! - The unit is removed on every path that created it, including the
//!   toolchain-failure path.
//! - No file is created before the main target imports successfully.
//!
//! # See also
//! - `pluggo_core::compose!`, the consumer side of the unit.

use crate::error::{ComposeError, ComposeResult};
use crate::target::{import_main_target, resolve_targets, MainTargetMetadata};
use crate::toolchain::{BuildJob, Toolchain};
use crate::unit::CompositionUnit;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Pipeline stages, in order. `Cleaned` is the only terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComposeStage {
    Start,
    TargetsResolved,
    MainImported,
    UnitWritten,
    UnitActivated,
    Built,
    Cleaned,
}

impl ComposeStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TargetsResolved => "targets_resolved",
            Self::MainImported => "main_imported",
            Self::UnitWritten => "unit_written",
            Self::UnitActivated => "unit_activated",
            Self::Built => "built",
            Self::Cleaned => "cleaned",
        }
    }
}

/// Summary of a successful composed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeReport {
    pub main: MainTargetMetadata,
    /// Crates linked into the main target, in registration order.
    pub linked: Vec<String>,
}

/// Links additional targets into a main target and builds it.
pub struct Composer<T: Toolchain> {
    toolchain: T,
    working_dir: PathBuf,
}

impl<T: Toolchain> Composer<T> {
    /// Creates a composer resolving relative targets against `working_dir`.
    pub fn new(toolchain: T, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            working_dir: working_dir.into(),
        }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Runs one invocation; `raw_targets[0]` is the main target.
    ///
    /// # Errors
    /// - `TargetResolution` when no target resolves.
    /// - `MainImport` when the main package cannot be read.
    /// - `TempFile` when the unit cannot be written or activated.
    /// - `Build` when the toolchain cannot run or the build fails.
    pub fn compose(&self, raw_targets: &[String]) -> ComposeResult<ComposeReport> {
        let started_at = Instant::now();
        info!(
            "event=compose module=compose status=start targets={}",
            raw_targets.len()
        );

        let mut stage = ComposeStage::Start;
        let result = self.run(raw_targets, &mut stage);
        match &result {
            Ok(report) => info!(
                "event=compose module=compose status=ok namespace={} linked={} duration_ms={}",
                report.main.namespace,
                report.linked.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=compose module=compose status=error stage={} error_code={} duration_ms={} error={}",
                stage.as_str(),
                err.code(),
                started_at.elapsed().as_millis(),
                first_line(&err.to_string())
            ),
        }
        enter(&mut stage, ComposeStage::Cleaned);
        result
    }

    fn run(&self, raw_targets: &[String], stage: &mut ComposeStage) -> ComposeResult<ComposeReport> {
        let request = resolve_targets(raw_targets, &self.working_dir)?;
        enter(stage, ComposeStage::TargetsResolved);

        let main = import_main_target(request.main())?;
        enter(stage, ComposeStage::MainImported);

        let unit = CompositionUnit::new(&main, request.additional());
        let staged = unit.stage(&main.source_dir)?;
        enter(stage, ComposeStage::UnitWritten);

        let active = staged.activate()?;
        enter(stage, ComposeStage::UnitActivated);

        let job = BuildJob {
            main: &main,
            unit_path: active.path(),
        };
        let built = self.toolchain.build(&job);

        let unit_path = active.path().to_path_buf();
        if let Err(err) = active.remove() {
            warn!(
                "event=unit_cleanup module=compose status=error path={} error={}",
                unit_path.display(),
                err
            );
        }

        let outcome = built.map_err(|err| ComposeError::Build {
            status: None,
            diagnostics: format!("failed to run build toolchain: {err}"),
        })?;
        if !outcome.success {
            return Err(ComposeError::Build {
                status: outcome.status,
                diagnostics: outcome.output,
            });
        }
        enter(stage, ComposeStage::Built);

        Ok(ComposeReport {
            linked: unit.references().to_vec(),
            main,
        })
    }
}

fn enter(stage: &mut ComposeStage, next: ComposeStage) {
    debug!(
        "event=compose_stage module=compose from={} to={}",
        stage.as_str(),
        next.as_str()
    );
    *stage = next;
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{first_line, ComposeStage};

    #[test]
    fn stages_are_ordered() {
        assert!(ComposeStage::Start < ComposeStage::TargetsResolved);
        assert!(ComposeStage::UnitActivated < ComposeStage::Built);
        assert!(ComposeStage::Built < ComposeStage::Cleaned);
        assert_eq!(ComposeStage::UnitWritten.as_str(), "unit_written");
    }

    #[test]
    fn first_line_trims_multiline_errors() {
        assert_eq!(first_line("build failed\nerror[E0432]"), "build failed");
        assert_eq!(first_line(""), "");
    }
}
