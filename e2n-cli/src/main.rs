//! e2n CLI
//!
//! Command-line interface for converting Enigma2 channel lists into Neutrino
//! zapit trees and ingesting source material.

mod cli_types;
mod commands;
mod error;

use std::io::Write;

use clap::Parser;
use log::Level;

use e2n_adapters::AdapterRegistry;

use cli_types::{Cli, Commands};
use error::CliError;

/// Install the logger: `info` by default, `debug` with `--verbose`, `warn`
/// with `--quiet`. `E2N_LOG` overrides all of them.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::new().filter_or("E2N_LOG", level));
    if !cli.verbose {
        builder.format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level.as_str().to_lowercase(), record.args()),
        });
    }
    builder.init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Convert(args) => commands::run_convert(args, cli.config.as_deref()),
        Commands::Ingest { sources, out, only } => commands::run_ingest(sources, out, only),
        Commands::Adapters => {
            commands::run_adapters(&AdapterRegistry::with_builtins());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        log::error!("{e}");
        std::process::exit(e.exit_code());
    }
}
