//! CLI argument parsing with clap

use brokkr_core::types::DEFAULT_CAPABILITY;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Brokkr - Resolve, validate and activate host modules
#[derive(Parser, Debug)]
#[command(name = "brokkr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to brokkr.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Run a resolution pass over the module registry
    Resolve(ResolveArgs),

    /// Validate a module.yml manifest
    Validate(ValidateArgs),

    /// Show the manifest and entry points of an artifact
    Inspect(InspectArgs),

    /// Build an artifact from a module directory
    Pack(PackArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Output the report and load plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to module.yml
    pub manifest: Utf8PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the artifact
    pub artifact: Utf8PathBuf,

    /// Capability whose entry points are listed
    #[arg(long, default_value = DEFAULT_CAPABILITY)]
    pub capability: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Module directory containing module.yml
    pub dir: Utf8PathBuf,

    /// Output artifact path
    #[arg(short, long)]
    pub output: Utf8PathBuf,

    /// Capability the module's entry points are declared under
    #[arg(long, default_value = DEFAULT_CAPABILITY)]
    pub capability: String,
}
