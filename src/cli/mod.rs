//! The `brotest` command line: load settings, register the self-checks, run
//! them through the chosen sink, and turn the summary into an exit code.

use crate::cli::args::BrotestArgs;
use crate::config::{OutputFormat, RunnerConfig};
use crate::errors::ConfigError;
use crate::runner::{Registry, RunSummary};
use crate::sink::{ConsoleSink, JsonSink};
use crate::{logging, selftest};
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

pub mod args;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = BrotestArgs::parse();
    logging::init(&args.log_level);

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return ExitCode::from(2);
        }
    };
    debug!(target: "brotest", ?config, "configuration resolved");

    let summary = run_self_checks(&config);
    if summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Defaults, then the config file, then flags.
pub fn resolve_config(args: &BrotestArgs) -> Result<RunnerConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(filter) = &args.filter {
        config.filter = Some(filter.clone());
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.no_color {
        config.use_colors = false;
    }
    config.validate()?;
    Ok(config)
}

fn run_self_checks(config: &RunnerConfig) -> RunSummary {
    let mut registry = match config.format {
        OutputFormat::Pretty => Registry::with_config(ConsoleSink::stdout(config.use_colors), config),
        OutputFormat::Json => Registry::with_config(JsonSink::stdout(), config),
    };
    selftest::register(&mut registry);
    registry.run_blocking()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_the_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|e| panic!("{e}"));
        writeln!(file, "filter: equality\nformat: json\nuse_colors: true").unwrap_or_else(|e| panic!("{e}"));
        let path = file.path().to_string_lossy().into_owned();

        let args = BrotestArgs::parse_from(["brotest", "--config", path.as_str(), "--filter", "subset", "--no-color"]);
        let config = resolve_config(&args).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.filter.as_deref(), Some("subset"));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.use_colors);
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let args = BrotestArgs::parse_from(["brotest", "--config", "/nonexistent/brotest.yaml"]);
        assert!(matches!(resolve_config(&args), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn empty_filter_flag_is_rejected() {
        let args = BrotestArgs::parse_from(["brotest", "--filter", ""]);
        assert!(matches!(resolve_config(&args), Err(ConfigError::Invalid { field: "filter", .. })));
    }
}
