//! Cargo manifest reading and main-target import.

use super::Target;
use crate::error::{ComposeError, ComposeResult};
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "Cargo.toml";
const DEFAULT_SOURCE_DIR: &str = "src";

/// Subset of `Cargo.toml` needed to place and name a composition unit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CargoManifest {
    pub package: Option<PackageSection>,
    pub lib: Option<TargetSection>,
    #[serde(default)]
    pub bin: Vec<TargetSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,
}

/// One `[lib]` or `[[bin]]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetSection {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
}

impl CargoManifest {
    pub fn parse(contents: &str) -> Result<Self, ManifestError> {
        toml::from_str(contents).map_err(ManifestError::Parse)
    }

    /// Name other crates use to refer to this package's library.
    pub fn library_crate_name(&self) -> Option<String> {
        self.lib
            .as_ref()
            .and_then(|lib| lib.name.clone())
            .or_else(|| self.package.as_ref().map(|package| package.name.clone()))
            .map(|name| normalize_crate_name(&name))
    }

    /// Crate name of the package's primary binary, or of the package itself.
    pub fn binary_crate_name(&self) -> Option<String> {
        self.bin
            .first()
            .and_then(|bin| bin.name.clone())
            .or_else(|| self.package.as_ref().map(|package| package.name.clone()))
            .map(|name| normalize_crate_name(&name))
    }
}

/// Manifest read/parse errors.
#[derive(Debug)]
pub enum ManifestError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read {MANIFEST_FILE}: {err}"),
            Self::Parse(err) => write!(f, "cannot parse {MANIFEST_FILE}: {err}"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Reads `<package_dir>/Cargo.toml`.
pub fn read_manifest(package_dir: &Path) -> Result<CargoManifest, ManifestError> {
    let contents =
        std::fs::read_to_string(package_dir.join(MANIFEST_FILE)).map_err(ManifestError::Io)?;
    CargoManifest::parse(&contents)
}

/// Converts a package or target name into the identifier Rust code uses.
pub fn normalize_crate_name(name: &str) -> String {
    name.trim().replace('-', "_")
}

/// Metadata of the main target a composition unit is linked into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainTargetMetadata {
    pub package_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Crate name the unit must be compiled as part of.
    pub namespace: String,
    /// Directory the composition unit is written to.
    pub source_dir: PathBuf,
}

/// Resolves namespace and source directory of the main target.
///
/// # Errors
/// - `MainImport` when the target is a bare crate name, the directory or its
///   manifest is missing, the manifest does not parse or has no `[package]`,
///   or the source directory does not exist.
pub fn import_main_target(target: &Target) -> ComposeResult<MainTargetMetadata> {
    let metadata = load_main_target(target)?;
    info!(
        "event=main_import module=compose status=ok namespace={} source_dir={}",
        metadata.namespace,
        metadata.source_dir.display()
    );
    Ok(metadata)
}

fn load_main_target(target: &Target) -> ComposeResult<MainTargetMetadata> {
    let fail = |reason: String| ComposeError::MainImport {
        target: target.canonical.clone(),
        reason,
        source: None,
    };
    let Some(package_dir) = target.package_dir.as_deref() else {
        return Err(fail(format!(
            "`{}` is a crate name; the main target must be a package directory",
            target.canonical
        )));
    };
    if !package_dir.is_dir() {
        return Err(fail(format!(
            "directory {} does not exist",
            package_dir.display()
        )));
    }

    let manifest = read_manifest(package_dir).map_err(|err| ComposeError::MainImport {
        target: target.canonical.clone(),
        reason: err.to_string(),
        source: Some(err),
    })?;
    if manifest.package.is_none() {
        return Err(fail(format!(
            "{} has no [package] section",
            package_dir.join(MANIFEST_FILE).display()
        )));
    }
    let namespace = manifest
        .binary_crate_name()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| fail("package name is empty".to_string()))?;

    let source_dir = manifest
        .bin
        .first()
        .and_then(|bin| bin.path.as_deref())
        .and_then(Path::parent)
        .map(|parent| package_dir.join(parent))
        .unwrap_or_else(|| package_dir.join(DEFAULT_SOURCE_DIR));
    if !source_dir.is_dir() {
        return Err(fail(format!(
            "source directory {} does not exist",
            source_dir.display()
        )));
    }

    Ok(MainTargetMetadata {
        package_dir: package_dir.to_path_buf(),
        manifest_path: package_dir.join(MANIFEST_FILE),
        namespace,
        source_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::{import_main_target, normalize_crate_name, CargoManifest, ManifestError};
    use crate::error::ComposeError;
    use crate::target::Target;
    use std::fs;

    fn package_target(dir: &std::path::Path) -> Target {
        Target {
            canonical: dir.display().to_string(),
            crate_name: "app".to_string(),
            package_dir: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn prefers_lib_name_for_library_references() {
        let manifest = CargoManifest::parse(
            "[package]\nname = \"hello-plugin\"\n\n[lib]\nname = \"hello_ext\"\n",
        )
        .expect("manifest should parse");
        assert_eq!(manifest.library_crate_name().as_deref(), Some("hello_ext"));
        assert_eq!(manifest.binary_crate_name().as_deref(), Some("hello_plugin"));
    }

    #[test]
    fn prefers_first_bin_name_for_namespace() {
        let manifest = CargoManifest::parse(
            "[package]\nname = \"app\"\n\n[[bin]]\nname = \"my-tool\"\npath = \"cmd/main.rs\"\n",
        )
        .expect("manifest should parse");
        assert_eq!(manifest.binary_crate_name().as_deref(), Some("my_tool"));
    }

    #[test]
    fn normalizes_hyphens() {
        assert_eq!(normalize_crate_name(" hello-app "), "hello_app");
    }

    #[test]
    fn imports_package_with_default_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"hello-app\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let metadata = import_main_target(&package_target(dir.path())).unwrap();
        assert_eq!(metadata.namespace, "hello_app");
        assert_eq!(metadata.source_dir, dir.path().join("src"));
        assert_eq!(metadata.manifest_path, dir.path().join("Cargo.toml"));
    }

    #[test]
    fn uses_custom_bin_path_parent_as_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"app\"\n\n[[bin]]\nname = \"app\"\npath = \"cmd/main.rs\"\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("cmd")).unwrap();

        let metadata = import_main_target(&package_target(dir.path())).unwrap();
        assert_eq!(metadata.source_dir, dir.path().join("cmd"));
    }

    #[test]
    fn rejects_missing_directory_and_broken_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = import_main_target(&package_target(&missing)).unwrap_err();
        assert!(matches!(err, ComposeError::MainImport { .. }));
        assert!(err.to_string().contains("does not exist"));

        fs::write(dir.path().join("Cargo.toml"), "[package\nname = ").unwrap();
        let err = import_main_target(&package_target(dir.path())).unwrap_err();
        assert_eq!(err.exit_code(), -2);
        assert!(err.to_string().contains("cannot parse"));
        let source = std::error::Error::source(&err).expect("manifest error is the source");
        assert!(matches!(
            source.downcast_ref::<ManifestError>(),
            Some(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn rejects_workspace_manifest_and_crate_name_targets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"a\"]\n",
        )
        .unwrap();
        let err = import_main_target(&package_target(dir.path())).unwrap_err();
        assert!(err.to_string().contains("[package]"));

        let crate_only = Target {
            canonical: "hello_app".to_string(),
            crate_name: "hello_app".to_string(),
            package_dir: None,
        };
        let err = import_main_target(&crate_only).unwrap_err();
        assert!(matches!(err, ComposeError::MainImport { .. }));
    }
}
