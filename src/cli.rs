use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nssync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declare OS user accounts and converge the system to match", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest to read instead of ~/.config/nssync/users.toml
    #[arg(short, long, global = true, env = "NSSYNC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show declared users with desired and actual values
    Status(StatusArgs),

    /// Preview what apply would change
    Diff(TargetArgs),

    /// Create and modify accounts to match the manifest
    Apply(ApplyArgs),

    /// List the attributes a user can declare
    Describe,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct TargetArgs {
    /// Only this target: `user` or `user.<name>`
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Only this target: `user` or `user.<name>`
    pub target: Option<String>,

    /// Print pending changes as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only this target: `user` or `user.<name>`
    pub target: Option<String>,

    /// Show what would change without touching accounts
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Parallel jobs for retrieving accounts
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,
}
