//! `multibuild`: builds a main package with extension packages linked in.
//!
//! # Responsibility
//! - Parse the command line and map composition outcomes to exit codes.
//! - Keep stdout limited to toolchain diagnostics and usage text.

use clap::{CommandFactory, Parser};
use log::warn;
use pluggo_compose::{
    init_logging, CargoToolchain, ComposeConfig, ComposeError, Composer, EXIT_BUILD,
    EXIT_NO_TARGETS,
};

const AFTER_HELP: &str = "\
<MAIN_PKG> is the package to build; the resulting binary keeps its crate name.
Each additional <PKG> must be a library exposing `pluggo_register`, listed as a
dependency of <MAIN_PKG>. Packages are directories (`dir/...` matches every
package below `dir`) or crate names. A <PKG> can't be a binary-only package.";

/// multibuild builds one or more packages and links them together
#[derive(Debug, Parser)]
#[command(
    name = "multibuild",
    override_usage = "multibuild <MAIN_PKG> [<PKG>...]",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Main package to build, followed by additional packages to link with it
    #[arg(value_name = "TARGET")]
    targets: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    if cli.targets.is_empty() {
        println!("missing arguments");
        print_usage();
        return EXIT_NO_TARGETS;
    }

    let config = match ComposeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("multibuild: unable to read the current directory: {err}");
            return EXIT_NO_TARGETS;
        }
    };
    if let Err(err) = init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("multibuild: logging disabled: {err}");
    }

    let composer = Composer::new(
        CargoToolchain::new(config.cargo.clone()),
        config.working_dir.clone(),
    );
    match composer.compose(&cli.targets) {
        Ok(_) => 0,
        Err(ComposeError::Build {
            status,
            diagnostics,
        }) => {
            print!("{diagnostics}");
            warn!(
                "event=cli_exit module=cli status=error error_code=build_failed toolchain_status={}",
                status.map(|code| code.to_string()).unwrap_or_else(|| "none".to_string())
            );
            EXIT_BUILD
        }
        Err(err) => {
            eprintln!("multibuild: {err}");
            if matches!(err, ComposeError::TargetResolution(_)) {
                print_usage();
            }
            err.exit_code()
        }
    }
}

fn print_usage() {
    let mut command = Cli::command();
    if let Err(err) = command.print_help() {
        eprintln!("multibuild: unable to print usage: {err}");
    }
}
