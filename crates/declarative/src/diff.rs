//! Diff computation for resources

use crate::resource::{Resource, ResourceExt};
use crate::types::Presence;
use crate::value::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One property that needs a sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub property: String,
    /// Observed value; `None` if never retrieved
    pub from: Option<PropertyValue>,
    pub to: PropertyValue,
}

/// Pending changes of a retrieved resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// Presence of the backing object
    pub presence: Presence,
    /// Properties to sync, in declaration order
    pub changes: Vec<PropertyChange>,
    /// Whether this resource requires sudo
    pub requires_sudo: bool,
}

impl ResourceDiff {
    /// Create a diff from a retrieved resource, returning None if no changes needed
    pub fn from_resource(resource: &dyn Resource) -> Option<Self> {
        let pending = resource.pending();
        if pending.is_empty() {
            return None;
        }

        let properties = resource.properties();
        let changes = pending
            .into_iter()
            .filter_map(|name| properties.get(name))
            .map(|p| PropertyChange {
                property: p.name.to_string(),
                from: p.actual.clone(),
                to: p.desired.clone(),
            })
            .collect();

        Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            presence: resource.presence(),
            changes,
            requires_sudo: resource.requires_sudo(),
        })
    }

    /// Check if this diff creates the backing object
    pub fn is_addition(&self) -> bool {
        self.presence == Presence::Absent
    }

    /// Check if this diff modifies an existing object
    pub fn is_modification(&self) -> bool {
        self.presence == Presence::Present
    }
}

/// Compute diffs for a list of retrieved resources
///
/// Returns only resources that have properties out of sync.
pub fn compute_diffs(resources: &[Box<dyn Resource>]) -> Vec<ResourceDiff> {
    resources
        .iter()
        .filter_map(|r| ResourceDiff::from_resource(r.as_ref()))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of objects to create
    pub additions: usize,
    /// Number of existing objects to modify
    pub modifications: usize,
    /// Number of property syncs across all resources
    pub property_changes: usize,
    /// Number of resources requiring sudo
    pub sudo_required: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else {
                summary.modifications += 1;
            }
            summary.property_changes += diff.changes.len();
            if diff.requires_sudo {
                summary.sudo_required += 1;
            }
        }
        summary
    }

    /// Total number of resources with changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type
pub fn group_by_type(diffs: &[ResourceDiff]) -> HashMap<String, Vec<&ResourceDiff>> {
    let mut groups: HashMap<String, Vec<&ResourceDiff>> = HashMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}
