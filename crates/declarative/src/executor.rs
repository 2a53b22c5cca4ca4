//! Execution engine - retrieves, diffs and converges resources with
//! parallelism and privilege batching

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback, SudoProvider};
use crate::diff::compute_diffs;
use crate::planner::ExecutionPlan;
use crate::resource::{BoxedResource, Resource};
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Context, Result};
use rayon::prelude::*;

/// Execute a plan with the given options and callbacks
///
/// Every resource is retrieved first. Resources that fail to retrieve are
/// reported as failed and dropped from the plan. If nothing is out of sync
/// the run ends there; otherwise the user is asked to confirm, unprivileged
/// resources are converged in parallel and privileged ones sequentially
/// after acquiring sudo once.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `sudo_provider` - Provider for privileged operations (called lazily if needed)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
pub fn execute<S, P, C>(
    mut plan: ExecutionPlan,
    opts: ExecuteOptions,
    sudo_provider: impl FnOnce() -> Result<S>,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    S: SudoProvider,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut summary = ExecuteSummary::default();

    for (id, result) in retrieve_batch(&mut plan.unprivileged, opts.jobs)?
        .into_iter()
        .chain(retrieve_batch(&mut plan.privileged, opts.jobs)?)
    {
        progress.on_resource_complete(&id, &result);
        summary.add_result(&result);
    }

    let unprivileged_diffs = compute_diffs(&plan.unprivileged);
    let privileged_diffs = compute_diffs(&plan.privileged);
    let total_changes = unprivileged_diffs.len() + privileged_diffs.len();
    let unchanged = plan.total_resources() - total_changes;

    if total_changes == 0 {
        summary.no_change += unchanged;
        return Ok(summary);
    }

    if opts.dry_run {
        summary.skipped += total_changes;
        summary.no_change += unchanged;
        return Ok(summary);
    }

    if !confirm.confirm("Apply changes?")? {
        summary.skipped += total_changes;
        summary.no_change += unchanged;
        return Ok(summary);
    }

    if !plan.unprivileged.is_empty() {
        progress.on_batch_start(plan.unprivileged.len(), false);
        let results = execute_batch(&mut plan.unprivileged, opts.jobs, opts.verbose, None, progress)?;
        for result in &results {
            summary.add_result(result);
        }
        progress.on_batch_complete();
    }

    if !plan.privileged.is_empty() {
        // Only ask for privileges when something privileged is out of sync
        if privileged_diffs.is_empty() {
            summary.no_change += plan.privileged.len();
            return Ok(summary);
        }

        let sudo = sudo_provider()?;

        progress.on_batch_start(plan.privileged.len(), true);
        let results = execute_batch(
            &mut plan.privileged,
            1, // Sequential for sudo
            opts.verbose,
            Some(&sudo),
            progress,
        )?;
        for result in &results {
            summary.add_result(result);
        }
        progress.on_batch_complete();
    }

    Ok(summary)
}

/// Retrieve every resource, dropping the ones that fail
///
/// Returns a failed result for each dropped resource.
pub fn retrieve_batch(
    resources: &mut Vec<BoxedResource>,
    jobs: usize,
) -> Result<Vec<(String, ApplyResult)>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create retrieve thread pool")?;

    let outcomes: Vec<Option<ApplyResult>> = pool.install(|| {
        resources
            .par_iter_mut()
            .map(|resource| match resource.retrieve() {
                Ok(()) => None,
                Err(e) => {
                    log::warn!("could not retrieve {}: {}", resource.id(), e);
                    Some(ApplyResult::Failed {
                        error: e.to_string(),
                    })
                }
            })
            .collect()
    });

    let mut failures = Vec::new();
    let mut kept = Vec::with_capacity(resources.len());
    for (resource, outcome) in resources.drain(..).zip(outcomes) {
        match outcome {
            None => kept.push(resource),
            Some(result) => failures.push((resource.id(), result)),
        }
    }
    *resources = kept;

    Ok(failures)
}

/// Execute a batch of resources
fn execute_batch<P: ProgressCallback>(
    resources: &mut [BoxedResource],
    jobs: usize,
    verbose: bool,
    sudo: Option<&dyn SudoProvider>,
    progress: &mut P,
) -> Result<Vec<ApplyResult>> {
    let sequential = jobs <= 1 || resources.len() == 1 || resources.iter().any(|r| !r.can_parallelize());

    if sequential {
        let mut results = Vec::with_capacity(resources.len());
        for resource in resources.iter_mut() {
            progress.on_resource_start(&resource.id(), &resource.description());
            let result = apply_resource(resource.as_mut(), verbose, sudo);
            progress.on_resource_complete(&resource.id(), &result);
            results.push(result);
        }
        Ok(results)
    } else {
        execute_parallel(resources, jobs, verbose, sudo, progress)
    }
}

/// Execute resources in parallel using rayon
fn execute_parallel<P: ProgressCallback>(
    resources: &mut [BoxedResource],
    jobs: usize,
    verbose: bool,
    sudo: Option<&dyn SudoProvider>,
    progress: &mut P,
) -> Result<Vec<ApplyResult>> {
    // The progress callback is not thread-safe; results are reported after the pool finishes.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to create apply thread pool")?;

    let results: Vec<(String, ApplyResult)> = pool.install(|| {
        resources
            .par_iter_mut()
            .map(|resource| {
                let result = apply_resource(resource.as_mut(), verbose, sudo);
                (resource.id(), result)
            })
            .collect()
    });

    for (id, result) in &results {
        progress.on_resource_complete(id, result);
    }

    Ok(results.into_iter().map(|(_, r)| r).collect())
}

/// Apply a single resource
fn apply_resource(
    resource: &mut dyn Resource,
    verbose: bool,
    sudo: Option<&dyn SudoProvider>,
) -> ApplyResult {
    let mut ctx = match sudo {
        Some(s) => ApplyContext::with_sudo(false, verbose, s),
        None => ApplyContext::new(false, verbose),
    };

    match resource.apply(&mut ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: e.to_string(),
        },
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple<S: SudoProvider>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    sudo_provider: impl FnOnce() -> Result<S>,
) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, opts, sudo_provider, &mut NoProgress, &mut AutoConfirm)
}
