//! `nssync status`

use super::{DEFAULT_JOBS, ensure_all_handled, plan_users, retrieve_all};
use crate::Context;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use declarative::{Presence, PropertyChange, PropertySet, PropertyValue, Resource, ResourceDiff};
use nameservice::Platform;
use serde::Serialize;

/// JSON shape of one user
#[derive(Debug, Serialize)]
struct UserStatus<'a> {
    user: String,
    managed: bool,
    presence: Presence,
    properties: &'a PropertySet,
    changes: Vec<PropertyChange>,
}

impl<'a> UserStatus<'a> {
    fn from_resource(resource: &'a dyn Resource) -> Self {
        Self {
            user: resource.id(),
            managed: resource.is_managed(),
            presence: resource.presence(),
            properties: resource.properties(),
            changes: ResourceDiff::from_resource(resource)
                .map(|diff| diff.changes)
                .unwrap_or_default(),
        }
    }
}

pub fn run(ctx: &Context, target: Option<&str>, json: bool) -> Result<()> {
    let mut planned = plan_users(ctx, target)?;
    let failed = retrieve_all(&mut planned.plan, DEFAULT_JOBS)?;

    if json {
        let statuses: Vec<UserStatus> = planned
            .plan
            .resources()
            .map(|r| UserStatus::from_resource(r.as_ref()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        ui::header("User Status");

        if planned.plan.is_empty() && planned.invalid.is_empty() && failed == 0 {
            ui::dim("No users declared");
        }

        for resource in planned.plan.resources() {
            show_user(resource.as_ref());
        }
    }

    ensure_all_handled(failed + planned.invalid.len())
}

fn show_user(resource: &dyn Resource) {
    let presence = match resource.presence() {
        Presence::Present => "present".green(),
        Presence::Absent => "absent".yellow(),
        Presence::Unknown => "unknown".dimmed(),
    };
    let mode = if resource.is_managed() {
        String::new()
    } else {
        " (observed)".dimmed().to_string()
    };

    ui::section(&format!("user[{}]", resource.id()));
    ui::kv("account", &format!("{presence}{mode}"));

    for property in resource.properties().iter() {
        let mark = if !resource.is_managed() {
            "·".dimmed()
        } else if property.is_in_sync() {
            "✓".green()
        } else {
            "✗".red()
        };

        let mut actual = ui::actual(property.actual.as_ref()).to_string();
        if property.name == "gid"
            && let Some(label) = property.actual.as_ref().and_then(group_label)
        {
            actual.push_str(&format!(" ({label})").dimmed().to_string());
        }

        if property.is_in_sync() || !resource.is_managed() {
            println!("  {mark} {:<8} {actual}", property.name);
        } else {
            println!(
                "  {mark} {:<8} {actual} → {}",
                property.name,
                ui::value(&property.desired)
            );
        }
    }
}

/// Group name for a numeric gid, if the group exists
fn group_label(gid: &PropertyValue) -> Option<String> {
    let gid = u32::try_from(gid.as_concrete()?.as_integer()?).ok()?;
    match Platform::global().database().group_by_id(gid) {
        Ok(group) => group.map(|g| g.name),
        Err(e) => {
            log::debug!("group lookup for {gid} failed: {e}");
            None
        }
    }
}
