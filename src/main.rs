mod cli;
mod commands;
mod config;
mod engine;
mod sudo;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use commands::apply::ApplyOptions;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Manifest path given on the command line or through the environment
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    match cli.command {
        Command::Status(args) => commands::status::run(&ctx, args.target.as_deref(), args.json),
        Command::Diff(args) => commands::diff::run(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::apply::run(
            &ctx,
            &ApplyOptions {
                target: args.target.as_deref(),
                dry_run: args.dry_run,
                jobs: usize::from(args.jobs.max(1)),
                yes: args.yes,
            },
        ),
        Command::Describe => {
            commands::describe::run();
            Ok(())
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nssync", &mut io::stdout());
            Ok(())
        }
    }
}
