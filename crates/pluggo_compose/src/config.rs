//! Environment-driven configuration for `multibuild`.

use crate::logging::default_log_level;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// Log level override (`trace|debug|info|warn|error|off`).
pub const LOG_LEVEL_ENV: &str = "PLUGGO_LOG";
/// Absolute directory for rotating log files; stderr when unset.
pub const LOG_DIR_ENV: &str = "PLUGGO_LOG_DIR";
/// Cargo executable, as exported by cargo itself for subcommands.
pub const CARGO_ENV: &str = "CARGO";

const DEFAULT_CARGO: &str = "cargo";

/// Settings of one `multibuild` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeConfig {
    pub log_level: String,
    pub log_dir: Option<String>,
    pub cargo: OsString,
    /// Directory relative targets are resolved against.
    pub working_dir: PathBuf,
}

impl ComposeConfig {
    /// Reads the process environment and current directory.
    pub fn from_env() -> io::Result<Self> {
        let working_dir = std::env::current_dir()?;
        let cargo = std::env::var_os(CARGO_ENV).filter(|value| !value.is_empty());
        Ok(Self::from_lookup(
            |key| std::env::var(key).ok(),
            cargo,
            working_dir,
        ))
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cargo: Option<OsString>,
        working_dir: PathBuf,
    ) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            log_level: non_blank(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(LOG_DIR_ENV),
            cargo: cargo.unwrap_or_else(|| OsString::from(DEFAULT_CARGO)),
            working_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ComposeConfig, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn defaults_apply_when_variables_are_missing_or_blank() {
        let vars = HashMap::from([(LOG_DIR_ENV, "  ")]);
        let config = ComposeConfig::from_lookup(
            |key| vars.get(key).map(|value| value.to_string()),
            None,
            PathBuf::from("/work"),
        );
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
        assert_eq!(config.cargo, OsString::from("cargo"));
        assert_eq!(config.working_dir, PathBuf::from("/work"));
    }

    #[test]
    fn reads_overrides() {
        let vars = HashMap::from([(LOG_LEVEL_ENV, "debug"), (LOG_DIR_ENV, "/var/log/pluggo")]);
        let config = ComposeConfig::from_lookup(
            |key| vars.get(key).map(|value| value.to_string()),
            Some(OsString::from("/opt/cargo/bin/cargo")),
            PathBuf::from("/work"),
        );
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/pluggo"));
        assert_eq!(config.cargo, OsString::from("/opt/cargo/bin/cargo"));
    }
}
