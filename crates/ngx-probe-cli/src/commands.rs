//! CLI command definitions using clap

use crate::config::ColorChoice;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ngx_probe::logging::LogFormat;
use std::path::PathBuf;

/// ngx-probe: resolve and select datepicker dates on the ngx-admin showcase
#[derive(Parser, Debug)]
#[command(name = "ngx-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the target date, expected label and month header for an offset
    Resolve(ResolveArgs),

    /// Open the Datepicker page and select a date relative to today
    Select(SelectArgs),

    /// Show the effective harness configuration
    Config(ConfigArgs),
}

/// Offsets shared by `resolve` and `select`
#[derive(Args, Debug, Clone)]
pub struct OffsetArgs {
    /// Day offset from today (start of the range with --end)
    #[arg(long, allow_hyphen_values = true)]
    pub offset: i64,

    /// End offset; selects a range in the range picker
    #[arg(long, allow_hyphen_values = true)]
    pub end: Option<i64>,

    /// Pin "today" (YYYY-MM-DD) instead of reading the local clock
    #[arg(long)]
    pub today: Option<String>,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Day offsets
    #[command(flatten)]
    pub offsets: OffsetArgs,
}

/// Arguments for the select command
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Day offsets
    #[command(flatten)]
    pub offsets: OffsetArgs,

    /// Forward-step cap for calendar navigation
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Drive a real Chromium instead of the in-memory showcase
    #[arg(long)]
    pub browser: bool,

    /// Base URL of the showcase (defaults to the configured environment)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Harness configuration file (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Harness configuration file (YAML); environment overrides otherwise
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_offset_parses() {
        let cli = Cli::parse_from(["ngx-probe", "resolve", "--offset", "-5"]);
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.offsets.offset, -5);
        assert_eq!(args.offsets.end, None);
    }

    #[test]
    fn test_select_flags() {
        let cli = Cli::parse_from([
            "ngx-probe",
            "-vv",
            "select",
            "--offset",
            "1",
            "--end",
            "4",
            "--max-steps",
            "3",
            "--today",
            "2024-06-01",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Select(args) = cli.command else {
            panic!("expected select");
        };
        assert_eq!(args.offsets.end, Some(4));
        assert_eq!(args.max_steps, Some(3));
        assert!(!args.browser);
    }

    #[test]
    fn test_log_format_is_global() {
        let cli = Cli::parse_from(["ngx-probe", "resolve", "--offset", "1", "--log-format", "json"]);
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Json);

        let cli = Cli::parse_from(["ngx-probe", "config"]);
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Pretty);
    }

    #[test]
    fn test_offset_is_required() {
        assert!(Cli::try_parse_from(["ngx-probe", "resolve"]).is_err());
    }
}
