//! Execution planner - groups resources by privilege level

use crate::context::SudoClassifier;
use crate::resource::{BoxedResource, Resource, ResourceExt};

/// An execution plan with resources grouped by privilege level
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    /// Resources that don't need elevated privileges
    pub unprivileged: Vec<BoxedResource>,
    /// Resources that need elevated privileges
    pub privileged: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the plan, classifying by sudo requirement
    pub fn add_resource<C: SudoClassifier + ?Sized>(
        &mut self,
        resource: BoxedResource,
        classifier: &C,
    ) {
        if classifier.requires_sudo(resource.resource_type(), &resource.id()) {
            self.privileged.push(resource);
        } else {
            self.unprivileged.push(resource);
        }
    }

    /// Add a resource that explicitly declares its sudo requirement
    pub fn add_resource_explicit(&mut self, resource: BoxedResource) {
        if resource.requires_sudo() {
            self.privileged.push(resource);
        } else {
            self.unprivileged.push(resource);
        }
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            unprivileged: self
                .unprivileged
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
            privileged: self
                .privileged
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// All resources, unprivileged first
    pub fn resources(&self) -> impl Iterator<Item = &BoxedResource> {
        self.unprivileged.iter().chain(self.privileged.iter())
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.unprivileged.len() + self.privileged.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.unprivileged.is_empty() && self.privileged.is_empty()
    }

    /// Check if plan has any privileged resources
    pub fn has_privileged(&self) -> bool {
        !self.privileged.is_empty()
    }
}

/// Parse a target string like "user.alice" into (type, name)
///
/// Only the first dot separates; user names may contain dots.
pub fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((resource_type, name)) => (Some(resource_type.to_string()), Some(name.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type {
        let matches_type = match rt {
            "users" => resource.resource_type() == "user",
            _ => resource.resource_type() == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && resource.id() != n
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("user"), (Some("user".to_string()), None));
        assert_eq!(
            parse_target("user.alice"),
            (Some("user".to_string()), Some("alice".to_string()))
        );
        assert_eq!(
            parse_target("user.first.last"),
            (Some("user".to_string()), Some("first.last".to_string()))
        );
    }
}
