//! `nssync diff`

use super::{DEFAULT_JOBS, ensure_all_handled, plan_diffs, plan_users, retrieve_all};
use crate::Context;
use crate::engine::differ::display_diff;
use anyhow::Result;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let mut planned = plan_users(ctx, target)?;
    let failed = retrieve_all(&mut planned.plan, DEFAULT_JOBS)?;

    display_diff(&plan_diffs(&planned.plan));

    ensure_all_handled(failed + planned.invalid.len())
}
