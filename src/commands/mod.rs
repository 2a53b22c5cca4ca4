//! Subcommand implementations
//!
//! - `status` - Show desired vs actual values of every declared user
//! - `diff` - Preview what apply would change
//! - `apply` - Make the accounts match the manifest
//! - `describe` - Document the user type

pub mod apply;
pub mod describe;
pub mod diff;
pub mod status;

use crate::Context;
use crate::config::Manifest;
use crate::engine::{PlannedUsers, build_plan};
use crate::sudo::running_as_root;
use crate::ui;
use anyhow::{Result, bail};
use declarative::{ApplyResult, ExecutionPlan, ResourceDiff, compute_diffs, retrieve_batch};
use nameservice::Platform;

/// Threads used to read accounts when no `--jobs` is given
const DEFAULT_JOBS: usize = 4;

/// Load the manifest and build the plan for `target`
fn plan_users(ctx: &Context, target: Option<&str>) -> Result<PlannedUsers> {
    let manifest = Manifest::load(ctx.config.as_deref())?;
    let planned = build_plan(&manifest, Platform::global(), running_as_root(), target);

    for (name, error) in &planned.invalid {
        ui::error(&format!("user {name}: {error}"));
    }
    Ok(planned)
}

/// Retrieve every planned user, reporting the ones that could not be read
///
/// Returns the number of users dropped from the plan.
fn retrieve_all(plan: &mut ExecutionPlan, jobs: usize) -> Result<usize> {
    let mut failures = retrieve_batch(&mut plan.unprivileged, jobs)?;
    failures.extend(retrieve_batch(&mut plan.privileged, jobs)?);

    for (id, result) in &failures {
        if let ApplyResult::Failed { error } = result {
            ui::error(&format!("user {id}: {error}"));
        }
    }
    Ok(failures.len())
}

/// Diffs of both privilege groups, unprivileged first
fn plan_diffs(plan: &ExecutionPlan) -> Vec<ResourceDiff> {
    let mut diffs = compute_diffs(&plan.unprivileged);
    diffs.extend(compute_diffs(&plan.privileged));
    diffs
}

/// Fail the command when some users could not be handled
fn ensure_all_handled(problems: usize) -> Result<()> {
    if problems > 0 {
        bail!(
            "{problems} user{} could not be processed",
            if problems == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
