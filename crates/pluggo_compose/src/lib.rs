//! Build-time composition of extension crates into a main crate.
//!
//! # Responsibility
//! - Drive the `multibuild` pipeline: resolve targets, synthesize the
//!   composition unit, build the main target, remove the unit.
//! - Own the tool's ambient concerns: logging and configuration.
//!
//! # See also
//! - `pluggo_core::compose!`, which includes the synthesized unit.

pub mod composer;
pub mod config;
pub mod error;
pub mod logging;
pub mod target;
pub mod toolchain;
pub mod unit;

pub use composer::{ComposeReport, ComposeStage, Composer};
pub use config::ComposeConfig;
pub use error::{
    ComposeError, ComposeResult, EXIT_BUILD, EXIT_MAIN_IMPORT, EXIT_NO_TARGETS, EXIT_TEMP_FILE,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use target::{
    import_main_target, resolve_targets, CompositionRequest, MainTargetMetadata, Target,
};
pub use toolchain::{BuildJob, BuildOutcome, CargoToolchain, Toolchain};
pub use unit::{ActiveUnit, CompositionUnit, StagedUnit};
