use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths;

#[derive(Parser)]
#[command(name = "brewsync")]
#[command(version)]
#[command(about = "Converge Homebrew formulae and casks to a declared manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest file (default: ~/.config/brewsync/brewsync.toml)
    #[arg(short, long, global = true, env = paths::ENV_MANIFEST)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Uninstall obsolete packages, update Homebrew, install new packages
    Apply(ApplyArgs),

    /// Preview what apply would change
    Plan(PlanArgs),

    /// Show recorded vs declared packages
    Status,

    /// Write a starter manifest
    Init {
        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Print brew commands instead of running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,
}
