//! Plumbing shared by the `checkfile` and `seekfd` binaries.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Whether clap refused the command line only because of its shape.
///
/// A wrong number of arguments prints the usage and is not a failure; a
/// value that does not parse, or an option that does not exist, is.
pub fn is_usage_only(err: &clap::Error) -> bool {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        | ErrorKind::MissingRequiredArgument
        | ErrorKind::TooManyValues
        | ErrorKind::WrongNumberOfValues => true,
        ErrorKind::UnknownArgument => is_surplus_positional(err),
        _ => false,
    }
}

/// clap reports both extra positionals and unknown options as
/// `UnknownArgument`; only the former is a count problem.
fn is_surplus_positional(err: &clap::Error) -> bool {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(token)) => {
            !token.starts_with('-') || token.parse::<i64>().is_ok()
        }
        _ => false,
    }
}

/// Print a clap error (or the usage) and pick the exit code.
pub fn report_clap_error(err: clap::Error) -> ExitCode {
    let usage_only = is_usage_only(&err);
    let _ = err.print();
    if usage_only {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub fn fill_byte_arg(s: &str) -> Result<u8, String> {
    crate::patterns::parse_fill_byte(s).map_err(|e| e.to_string())
}
