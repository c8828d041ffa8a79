//! Rulepick CLI library
//!
//! Headless host for the picker: page snapshots stand in for a live
//! document, subcommands print rule text, selector inversions, node
//! descriptions and the scope ladder.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;

pub use commands::{
    Cli, Commands, DescribeArgs, OutputFormat, RuleArgs, RuleTypeArg, ScopeArgs, SelectorArgs,
    SelectorTypeArg, TargetArgs,
};
pub use config::{init_logging, load_picker_config, Verbosity};
pub use error::{CliError, CliResult};
