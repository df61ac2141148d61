//! Brokkr CLI - Module resolution for host startup
//!
//! This is the main entry point for the Brokkr command-line interface.

mod cli;
mod commands;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    // Run command
    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Resolve(args) => commands::resolve::run(args, cli.config.as_deref()),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Pack(args) => commands::pack::run(args),
    }
}

/// Initialize tracing with appropriate verbosity
///
/// Logs go to stderr so that `--json` output on stdout stays parseable.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
