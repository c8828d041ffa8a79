//! Rulepick CLI: build content-blocking rules from page snapshots
//!
//! ## Usage
//!
//! ```bash
//! rulepick rule page.json --node 0/1              # STRICT_FULL hiding rule
//! rulepick rule page.json --node '#ad' -t url     # network rule
//! rulepick scope page.json --node 0/1             # rule at every scope
//! rulepick selector 'example.com##.banner'        # invert rule text
//! rulepick describe page.json --node 0/1          # element info as JSON
//! ```

use std::process::ExitCode;

use clap::Parser;
use rulepick_cli::{handlers, init_logging, load_picker_config, Cli, CliResult, Commands, Verbosity};

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
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    init_logging(verbosity);
    let config = load_picker_config(cli.config.as_deref())?;

    let output = match &cli.command {
        Commands::Rule(args) => handlers::rule(&config, args)?,
        Commands::Selector(args) => handlers::selector(args)?,
        Commands::Scope(args) => handlers::scope(&config, args)?,
        Commands::Describe(args) => handlers::describe(&config, args)?,
    };
    println!("{output}");
    Ok(())
}
