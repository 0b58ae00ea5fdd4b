//! ngx-probe CLI library
//!
//! Command definitions and handlers behind the `ngx-probe` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, LogFormatArg, OffsetArgs, ResolveArgs, SelectArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
