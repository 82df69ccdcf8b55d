//! Target resolution: raw command-line strings to canonical targets.
//!
//! # Responsibility
//! - Expand `dir/...` patterns to every package directory below `dir`.
//! - Normalize path-like targets to absolute, lexically clean paths.
//! - Accept bare crate names for additional targets.
//!
//! # Invariants
//! - Output order follows input order; pattern matches are sorted by path.
//! - Resolution never touches the main target's manifest; import does.

use crate::error::{ComposeError, ComposeResult};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

pub mod manifest;

pub use manifest::{import_main_target, MainTargetMetadata};

static CRATE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid crate name regex"));

const PATTERN_SUFFIX: &str = "...";
const SKIPPED_DIRS: &[&str] = &["target"];

/// One canonical target identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Canonical spelling: the normalized path or the crate name.
    pub canonical: String,
    /// Identifier used to reference the target from Rust source.
    pub crate_name: String,
    /// Package directory, `None` for bare crate names.
    pub package_dir: Option<PathBuf>,
}

impl Target {
    /// `None` when neither the manifest nor the directory name yields a
    /// crate name, e.g. for `/`.
    fn from_package_dir(dir: PathBuf) -> Option<Self> {
        let crate_name = manifest::read_manifest(&dir)
            .ok()
            .and_then(|manifest| manifest.library_crate_name())
            .or_else(|| {
                dir.file_name()
                    .map(|name| manifest::normalize_crate_name(&name.to_string_lossy()))
            })
            .filter(|name| !name.is_empty())?;
        Some(Self {
            canonical: dir.display().to_string(),
            crate_name,
            package_dir: Some(dir),
        })
    }

    fn from_crate_name(name: &str) -> Self {
        Self {
            canonical: name.to_string(),
            crate_name: manifest::normalize_crate_name(name),
            package_dir: None,
        }
    }
}

/// Resolved targets of one invocation: the main target first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionRequest {
    targets: Vec<Target>,
}

impl CompositionRequest {
    pub fn main(&self) -> &Target {
        &self.targets[0]
    }

    pub fn additional(&self) -> &[Target] {
        &self.targets[1..]
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}

/// Resolves raw target strings relative to `working_dir`.
///
/// # Errors
/// - `TargetResolution` when no canonical target results.
pub fn resolve_targets(raw: &[String], working_dir: &Path) -> ComposeResult<CompositionRequest> {
    let mut targets = Vec::new();
    for value in raw {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if let Some(base) = pattern_base(value) {
            let matches = expand_pattern(&absolutize(base, working_dir));
            if matches.is_empty() {
                warn!("event=target_resolve module=compose status=warn pattern={value} reason=no_packages");
            }
            targets.extend(matches.into_iter().filter_map(|dir| package_target(value, dir)));
        } else if is_path_like(value, working_dir) {
            targets.extend(package_target(value, absolutize(value, working_dir)));
        } else if CRATE_NAME_RE.is_match(value) {
            targets.push(Target::from_crate_name(value));
        } else {
            warn!("event=target_resolve module=compose status=warn target={value} reason=invalid_identifier");
        }
    }

    if targets.is_empty() {
        return Err(ComposeError::TargetResolution(
            "no targets given".to_string(),
        ));
    }
    debug!(
        "event=target_resolve module=compose status=ok count={}",
        targets.len()
    );
    Ok(CompositionRequest { targets })
}

fn package_target(value: &str, dir: PathBuf) -> Option<Target> {
    let display = dir.display().to_string();
    let target = Target::from_package_dir(dir);
    if target.is_none() {
        warn!("event=target_resolve module=compose status=warn target={value} path={display} reason=no_crate_name");
    }
    target
}

/// Returns the directory part of a `dir/...` pattern.
fn pattern_base(value: &str) -> Option<&str> {
    if value == PATTERN_SUFFIX {
        return Some(".");
    }
    value
        .strip_suffix(PATTERN_SUFFIX)
        .and_then(|rest| rest.strip_suffix(['/', std::path::MAIN_SEPARATOR]))
        .map(|base| if base.is_empty() { "/" } else { base })
}

fn is_path_like(value: &str, working_dir: &Path) -> bool {
    value.starts_with('.')
        || value.contains('/')
        || value.contains(std::path::MAIN_SEPARATOR)
        || Path::new(value).is_absolute()
        || working_dir.join(value).is_dir()
}

fn absolutize(value: &str, working_dir: &Path) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&working_dir.join(path))
    }
}

/// Lexically removes `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Lists package directories at or below `base`, sorted by path.
fn expand_pattern(base: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_packages(base, &mut found);
    found.sort();
    found
}

fn collect_packages(dir: &Path, found: &mut Vec<PathBuf>) {
    if is_package_dir(dir) {
        found.push(dir.to_path_buf());
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
            continue;
        }
        if entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false) {
            collect_packages(&path, found);
        }
    }
}

fn is_package_dir(dir: &Path) -> bool {
    manifest::read_manifest(dir)
        .map(|manifest| manifest.package.is_some())
        .unwrap_or(false)
}
