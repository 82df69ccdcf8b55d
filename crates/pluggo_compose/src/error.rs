//! Composition failures and their process exit codes.

use crate::target::manifest::ManifestError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type ComposeResult<T> = Result<T, ComposeError>;

/// Exit code for a missing or empty target list.
pub const EXIT_NO_TARGETS: i32 = -1;
/// Exit code for a main target that cannot be imported.
pub const EXIT_MAIN_IMPORT: i32 = -2;
/// Exit code for a composition unit that cannot be created or activated.
pub const EXIT_TEMP_FILE: i32 = -3;
/// Exit code for a failed toolchain build.
pub const EXIT_BUILD: i32 = -4;

/// Fatal error for one `multibuild` invocation.
#[derive(Debug)]
pub enum ComposeError {
    /// The raw targets resolved to no identifiers.
    TargetResolution(String),
    /// The main target could not be located or parsed.
    MainImport {
        target: String,
        reason: String,
        source: Option<ManifestError>,
    },
    /// The composition unit could not be written or made visible.
    TempFile { path: PathBuf, source: io::Error },
    /// The toolchain failed; `diagnostics` is its output, verbatim.
    Build {
        status: Option<i32>,
        diagnostics: String,
    },
}

impl ComposeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TargetResolution(_) => EXIT_NO_TARGETS,
            Self::MainImport { .. } => EXIT_MAIN_IMPORT,
            Self::TempFile { .. } => EXIT_TEMP_FILE,
            Self::Build { .. } => EXIT_BUILD,
        }
    }

    /// Stable identifier used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TargetResolution(_) => "target_resolution_failed",
            Self::MainImport { .. } => "main_import_failed",
            Self::TempFile { .. } => "temp_file_failed",
            Self::Build { .. } => "build_failed",
        }
    }
}

impl Display for ComposeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetResolution(message) => write!(f, "unable to resolve targets: {message}"),
            Self::MainImport { target, reason, .. } => {
                write!(f, "unable to import main package {target}: {reason}")
            }
            Self::TempFile { path, source } => write!(
                f,
                "unable to create temporary file in {}: {source}",
                path.display()
            ),
            Self::Build { status, diagnostics } => {
                match status {
                    Some(code) => write!(f, "build failed with exit status {code}")?,
                    None => write!(f, "build failed")?,
                }
                if !diagnostics.is_empty() {
                    write!(f, "\n{diagnostics}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ComposeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MainImport { source, .. } => {
                source.as_ref().map(|err| err as &(dyn Error + 'static))
            }
            Self::TempFile { source, .. } => Some(source),
            Self::TargetResolution(_) | Self::Build { .. } => None,
        }
    }
}
