use clap::{Arg, ArgAction, ArgMatches, Command};
use fillcheck::{cli, config, RegionVerifier, TailPolicy, VerificationResult, ViewAccess};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;

fn build_cli() -> Command {
    Command::new("checkfile")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify that a region of an open file descriptor holds a single fill byte")
        .arg(
            Arg::new("offset")
                .help("Start of the region, in bytes")
                .required_unless_present("init-config")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("length")
                .help("Length of the region, in bytes")
                .required_unless_present("init-config")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("fd")
                .help("Already-open file descriptor to verify")
                .required_unless_present("init-config")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("fill")
                .help("Expected byte, decimal (170) or hex (0xAA)")
                .required_unless_present("init-config")
                .allow_negative_numbers(true)
                .value_parser(cli::fill_byte_arg),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .short('b')
                .help("Comparison block size in bytes")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("tail")
                .long("tail")
                .help("How to compare the last partial block")
                .value_parser(["clamp", "full-block"]),
        )
        .arg(
            Arg::new("read")
                .long("read")
                .help("Read the region into a buffer instead of mapping it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Show a progress bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("More log output (repeatable)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file to use instead of the default location")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("init-config")
                .long("init-config")
                .help("Create default config file and exit")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => return cli::report_clap_error(err),
    };

    cli::init_tracing(matches.get_count("verbose"));

    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    if matches.get_flag("init-config") {
        let config_path = match matches.get_one::<PathBuf>("config") {
            Some(path) => path.clone(),
            None => config::get_config_path()?,
        };
        config::create_default_config(&config_path)?;
        println!("Default configuration created at: {}", config_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config_file = match matches.get_one::<PathBuf>("config") {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config().unwrap_or_else(|e| {
            tracing::warn!("could not load config file: {e:#}, using defaults");
            config::ConfigFile::default()
        }),
    };

    // CLI arguments take precedence over the config file
    let mut settings = config_file.to_fillcheck_config();
    if let Some(block_size) = matches.get_one::<usize>("block-size") {
        settings.block_size = *block_size;
    }
    if let Some(tail) = matches.get_one::<String>("tail") {
        settings.tail = match tail.as_str() {
            "full-block" => TailPolicy::FullBlock,
            _ => TailPolicy::Clamp,
        };
    }
    if matches.get_flag("read") {
        settings.access = ViewAccess::Read;
    }
    settings.progress |= matches.get_flag("progress");

    let offset = *required::<i64>(matches, "offset")?;
    let length = *required::<i64>(matches, "length")?;
    let fd = *required::<i32>(matches, "fd")?;
    let fill = *required::<u8>(matches, "fill")?;

    tracing::info!(offset, length, fd, fill, "checkfile request");

    let mut verifier = RegionVerifier::from_config(&settings);
    if settings.progress {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes:>9}/{total_bytes:9} {msg}")?
                .progress_chars("##-"),
        );
        verifier = verifier.with_progress(pb);
    }

    match verifier.verify(fd, offset, length, fill)? {
        VerificationResult::Verified => Ok(ExitCode::SUCCESS),
        VerificationResult::Mismatch(mismatch) => {
            eprintln!("{mismatch}");
            println!("{}", mismatch.snippet());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn required<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    id: &str,
) -> anyhow::Result<&'a T> {
    matches
        .get_one::<T>(id)
        .ok_or_else(|| anyhow::anyhow!("missing argument <{id}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_positionals() {
        let matches = build_cli()
            .try_get_matches_from(["checkfile", "0", "4096", "3", "0xAA"])
            .unwrap();
        assert_eq!(matches.get_one::<i64>("offset"), Some(&0));
        assert_eq!(matches.get_one::<i64>("length"), Some(&4096));
        assert_eq!(matches.get_one::<i32>("fd"), Some(&3));
        assert_eq!(matches.get_one::<u8>("fill"), Some(&0xAA));
    }

    #[test]
    fn test_negative_offset_parses_as_value() {
        let matches = build_cli()
            .try_get_matches_from(["checkfile", "-5", "10", "3", "0"])
            .unwrap();
        assert_eq!(matches.get_one::<i64>("offset"), Some(&-5));
    }

    #[test]
    fn test_wrong_count_is_usage() {
        let err = build_cli()
            .try_get_matches_from(["checkfile", "0", "10"])
            .unwrap_err();
        assert!(cli::is_usage_only(&err));
    }

    #[test]
    fn test_bad_fill_is_failure() {
        let err = build_cli()
            .try_get_matches_from(["checkfile", "0", "10", "3", "0x1FF"])
            .unwrap_err();
        assert!(!cli::is_usage_only(&err));
    }

    #[test]
    fn test_negative_fill_is_failure() {
        let err = build_cli()
            .try_get_matches_from(["checkfile", "0", "16", "0", "-1"])
            .unwrap_err();
        assert!(!cli::is_usage_only(&err));
    }

    #[test]
    fn test_unknown_option_is_failure() {
        let err = build_cli()
            .try_get_matches_from(["checkfile", "0", "16", "0", "170", "--bogus"])
            .unwrap_err();
        assert!(!cli::is_usage_only(&err));
    }

    #[test]
    fn test_surplus_positional_is_usage() {
        let err = build_cli()
            .try_get_matches_from(["checkfile", "0", "16", "0", "170", "9"])
            .unwrap_err();
        assert!(cli::is_usage_only(&err));
    }

    #[test]
    fn test_init_config_needs_no_positionals() {
        let matches = build_cli()
            .try_get_matches_from(["checkfile", "--init-config"])
            .unwrap();
        assert!(matches.get_flag("init-config"));
    }
}
