//! `nssync apply`

use super::{ensure_all_handled, plan_diffs, plan_users, retrieve_all};
use crate::Context;
use crate::engine::differ::{display_diff, display_sudo_boundary};
use crate::engine::{BarProgress, PromptConfirm};
use crate::sudo::SudoContext;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use declarative::{ExecuteOptions, ExecuteSummary, execute};

pub struct ApplyOptions<'a> {
    pub target: Option<&'a str>,
    pub dry_run: bool,
    pub jobs: usize,
    pub yes: bool,
}

pub fn run(ctx: &Context, opts: &ApplyOptions) -> Result<()> {
    let mut planned = plan_users(ctx, opts.target)?;
    let unreadable = retrieve_all(&mut planned.plan, opts.jobs)?;
    let invalid = planned.invalid.len();

    let diffs = plan_diffs(&planned.plan);
    if !ctx.quiet {
        display_diff(&diffs);

        let privileged: Vec<_> = diffs.iter().filter(|d| d.requires_sudo).collect();
        display_sudo_boundary(&privileged);
    }

    if diffs.is_empty() {
        return ensure_all_handled(unreadable + invalid);
    }

    if opts.dry_run {
        println!();
        ui::info("Dry run, no accounts were changed");
        return ensure_all_handled(unreadable + invalid);
    }

    println!();
    let mut progress = BarProgress::new(ctx.verbose > 0);
    let mut confirm = PromptConfirm::new(opts.yes);
    let mut summary = execute(
        planned.plan,
        ExecuteOptions {
            dry_run: false,
            jobs: opts.jobs,
            verbose: ctx.verbose > 0,
        },
        || SudoContext::acquire("Create and modify user accounts"),
        &mut progress,
        &mut confirm,
    )?;
    summary.failed += unreadable + invalid;

    print_summary(&summary);

    ensure_all_handled(summary.failed)
}

fn print_summary(summary: &ExecuteSummary) {
    println!();
    ui::header("Summary");
    ui::kv("created", &summary.created.to_string().green().to_string());
    ui::kv("modified", &summary.modified.to_string().yellow().to_string());
    ui::kv("unchanged", &summary.no_change.to_string());
    if summary.skipped > 0 {
        ui::kv("skipped", &summary.skipped.to_string().dimmed().to_string());
    }
    if summary.failed > 0 {
        ui::kv("failed", &summary.failed.to_string().red().to_string());
    }
    ui::kv("properties synced", &summary.properties_synced.to_string());

    if summary.is_success() && summary.total_changes() > 0 {
        ui::success("Accounts converged");
    }
}
