//! Composition unit synthesis, activation and removal.
//!
//! # Responsibility
//! - Render the registration table linking additional targets into the main
//!   crate.
//! - Write it to a uniquely named, extensionless file in the main target's
//!   source directory, then rename it to `.rs` once fully written.
//! - Remove the unit on every exit path.
//!
//! # Invariants
//! - Entry-point calls follow request order; each crate appears once.
//! - A `.rs` unit is never visible while partially written.
//! - Activation never overwrites an existing file.

use crate::error::{ComposeError, ComposeResult};
use crate::target::{MainTargetMetadata, Target};
use log::{debug, warn};
use pluggo_core::ENTRY_POINT;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const UNIT_PREFIX: &str = "pluggo";
const UNIT_EXTENSION: &str = "rs";

/// Registration table for one composed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionUnit {
    namespace: String,
    references: Vec<String>,
}

impl CompositionUnit {
    /// Builds the unit for `main`, dropping repeated crates.
    pub fn new(main: &MainTargetMetadata, additional: &[Target]) -> Self {
        let mut seen = HashSet::new();
        let mut references = Vec::with_capacity(additional.len());
        for target in additional {
            if seen.insert(target.crate_name.as_str()) {
                references.push(target.crate_name.clone());
            } else {
                warn!(
                    "event=unit_render module=compose status=warn duplicate_target={} crate={}",
                    target.canonical, target.crate_name
                );
            }
        }
        Self {
            namespace: main.namespace.clone(),
            references,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Crates whose entry points the unit calls, in call order.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Renders the Rust source included by `pluggo_core::compose!`.
    pub fn render(&self) -> String {
        let mut source = String::new();
        source.push_str(&format!(
            "// Composition unit for crate `{}`, generated by multibuild.\n",
            self.namespace
        ));
        source.push_str("// Removed as soon as the build finishes.\n\n");
        source.push_str(&format!(
            "const _: () = assert_namespace(env!(\"CARGO_CRATE_NAME\"), \"{}\");\n\n",
            self.namespace
        ));
        source.push_str(
            "pub(super) fn compose(registry: &ExtensionRegistry) -> Result<(), RegistryError> {\n",
        );
        if self.references.is_empty() {
            source.push_str("    let _ = registry;\n");
        }
        for crate_name in &self.references {
            source.push_str(&format!("    ::{crate_name}::{ENTRY_POINT}(registry)?;\n"));
        }
        source.push_str("    Ok(())\n}\n");
        source
    }

    /// Writes the rendered unit to a fresh extensionless file in `dir`.
    ///
    /// # Errors
    /// - `TempFile` when the file cannot be created or written.
    pub fn stage(&self, dir: &Path) -> ComposeResult<StagedUnit> {
        let temp_file_error = |source: io::Error| ComposeError::TempFile {
            path: dir.to_path_buf(),
            source,
        };
        let mut file = tempfile::Builder::new()
            .prefix(UNIT_PREFIX)
            .tempfile_in(dir)
            .map_err(temp_file_error)?;
        file.write_all(self.render().as_bytes())
            .and_then(|()| file.flush())
            .map_err(temp_file_error)?;
        debug!(
            "event=unit_write module=compose status=ok path={}",
            file.path().display()
        );
        Ok(StagedUnit { file })
    }
}

/// Fully written unit the toolchain cannot see yet.
///
/// Dropping it deletes the file.
#[derive(Debug)]
pub struct StagedUnit {
    file: NamedTempFile,
}

impl StagedUnit {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Renames the unit to `<name>.rs`.
    ///
    /// # Errors
    /// - `TempFile` when the rename fails or the target name exists; the
    ///   staged file is removed in that case.
    pub fn activate(self) -> ComposeResult<ActiveUnit> {
        let active_path = with_extension_appended(self.file.path(), UNIT_EXTENSION);
        match self.file.persist_noclobber(&active_path) {
            Ok(_) => {
                debug!(
                    "event=unit_activate module=compose status=ok path={}",
                    active_path.display()
                );
                Ok(ActiveUnit {
                    path: active_path,
                    removed: false,
                })
            }
            Err(err) => Err(ComposeError::TempFile {
                path: active_path,
                source: err.error,
            }),
        }
    }
}

/// Activated unit; removed on [`remove`](Self::remove) or drop.
#[derive(Debug)]
pub struct ActiveUnit {
    path: PathBuf,
    removed: bool,
}

impl ActiveUnit {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the unit now, reporting the outcome.
    pub fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        std::fs::remove_file(&self.path)
    }
}

impl Drop for ActiveUnit {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(
                "event=unit_cleanup module=compose status=error path={} error={}",
                self.path.display(),
                err
            );
        }
    }
}

fn with_extension_appended(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
