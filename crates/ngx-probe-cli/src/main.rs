//! ngx-probe CLI
//!
//! ## Usage
//!
//! ```bash
//! ngx-probe resolve --offset 30                 # Expected label for today + 30
//! ngx-probe select --offset 1 --end 4           # Range selection on the showcase model
//! ngx-probe select --offset 10 --browser        # Same flow in Chromium
//! ngx-probe config --file harness.yaml          # Effective configuration
//! ngx-probe -v --log-format json select --offset 3   # JSON log lines on stderr
//! ```

use clap::Parser;
use ngx_probe::logging;
use ngx_probe_cli::{runner, Cli, CliConfig, CliResult, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    config.color.apply();
    logging::init(config.verbosity.level(), config.log_format)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Resolve(args) => runner::run_resolve(&args, &mut out),
        Commands::Select(args) => runner::run_select(&args, &mut out),
        Commands::Config(args) => runner::run_config(&args, &mut out),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(cli.log_format.into())
}
