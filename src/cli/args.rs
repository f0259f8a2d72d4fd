//! Command-line arguments of the `brotest` binary.

use crate::config::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "brotest",
    version,
    about = "Runs the brotest self-check suite and reports the outcome."
)]
pub struct BrotestArgs {
    /// YAML file with run settings. Flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only run tests whose name contains this substring.
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable coloured output.
    #[arg(long)]
    pub no_color: bool,

    /// Log level for the `brotest` target when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = BrotestArgs::parse_from([
            "brotest",
            "--filter",
            "deep",
            "--format",
            "json",
            "--no-color",
        ]);
        assert_eq!(args.filter.as_deref(), Some("deep"));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.no_color);
        assert_eq!(args.log_level, "warn");
        assert!(args.config.is_none());
    }
}
