//! Execution planner - turns manifest entries into user resources

use crate::config::Manifest;
use declarative::{Error, ExecutionPlan, SudoRequirement, parse_target};
use nameservice::{Mode, Platform, USER_TYPE, UserResource};

/// Resources built from a manifest
#[derive(Debug, Default)]
pub struct PlannedUsers {
    pub plan: ExecutionPlan,
    /// Users whose declaration was rejected, with the reason
    pub invalid: Vec<(String, Error)>,
}

/// Build one user resource per manifest entry
///
/// Entries that fail munging or validation are collected in `invalid`
/// instead of aborting the whole plan. Observed users never need sudo.
pub fn build_plan(
    manifest: &Manifest,
    platform: &Platform,
    is_root: bool,
    target: Option<&str>,
) -> PlannedUsers {
    let (target_type, target_name) = target.map(parse_target).unwrap_or((None, None));
    if let Some(t) = target_type.as_deref()
        && t != USER_TYPE
        && t != "users"
    {
        log::warn!("unknown target type '{t}', nothing selected");
        return PlannedUsers::default();
    }

    let mut planned = PlannedUsers::default();

    for (name, entry) in &manifest.users {
        if target_name.as_deref().is_some_and(|n| n != name) {
            continue;
        }

        let mode = if entry.observe {
            Mode::Observed
        } else {
            Mode::Managed
        };

        match UserResource::new(name, &entry.attributes, mode, platform.clone()) {
            Ok(user) => {
                let requirement =
                    if mode == Mode::Managed && manifest.sudo.user_requires_sudo(name, is_root) {
                        SudoRequirement::Required {
                            reason: format!("changing account {name} needs root"),
                        }
                    } else {
                        SudoRequirement::None
                    };
                planned
                    .plan
                    .add_resource_explicit(Box::new(user.with_sudo_requirement(requirement)));
            }
            Err(e) => {
                log::debug!("rejecting user {name}: {e}");
                planned.invalid.push((name.clone(), e));
            }
        }
    }

    planned
}
