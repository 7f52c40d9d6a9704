use clap::{Arg, ArgAction, Command};
use fillcheck::{cli, DescriptorSeeker};
use std::process::ExitCode;

fn build_cli() -> Command {
    Command::new("seekfd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Move an open file descriptor to an absolute offset, given in megabytes")
        .arg(
            Arg::new("offset-mb")
                .help("Offset from the start of the file, in MB (1 MB = 1048576 bytes)")
                .required(true)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("fd")
                .help("Already-open file descriptor to reposition")
                .required(true)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("More log output (repeatable)")
                .action(ArgAction::Count),
        )
}

fn main() -> ExitCode {
    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => return cli::report_clap_error(err),
    };

    cli::init_tracing(matches.get_count("verbose"));

    let (Some(&offset_mb), Some(&fd)) = (
        matches.get_one::<i64>("offset-mb"),
        matches.get_one::<i32>("fd"),
    ) else {
        return ExitCode::FAILURE;
    };

    match DescriptorSeeker::new().seek(fd, offset_mb) {
        Ok(position) => {
            tracing::info!(fd, position, "seek complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
