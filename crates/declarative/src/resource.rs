//! Resource trait for declarative state management
//!
//! A Resource owns a set of properties, each with a desired value fixed at
//! construction and an actual value filled in by [`Resource::retrieve`].
//! Convergence syncs every property whose actual value does not fulfil the
//! desired one, one backend call per property.

use crate::context::ApplyContext;
use crate::error::Result;
use crate::state::PropertySet;
use crate::types::{ApplyResult, Presence, SudoRequirement};
use crate::value::PropertyValue;
use std::fmt;

/// Core trait for declarative resources
///
/// Implementations are not reentrant: `retrieve` and `sync` take
/// `&mut self` and a single resource is always driven from one thread.
pub trait Resource: Send + Sync + fmt::Debug {
    /// Unique identity of this resource within its type (e.g. "alice")
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category (e.g. "user")
    fn resource_type(&self) -> &'static str;

    /// Whether this resource requires elevated privileges
    fn sudo_requirement(&self) -> SudoRequirement {
        SudoRequirement::None
    }

    /// Whether the resource enforces its desired values
    ///
    /// Unmanaged resources are only observed and never synced.
    fn is_managed(&self) -> bool {
        true
    }

    /// Query whether the backing object exists, without side effects
    fn exists(&self) -> Result<bool>;

    /// Populate the actual value of every declared property
    fn retrieve(&mut self) -> Result<()>;

    /// Presence of the backing object as of the last retrieve
    fn presence(&self) -> Presence;

    /// Declared properties with their desired and actual values
    fn properties(&self) -> &PropertySet;

    /// Bring one property to its desired value
    ///
    /// Returns the value that was written.
    fn sync(&mut self, property: &str, ctx: &mut ApplyContext) -> Result<PropertyValue>;

    /// Names of the properties that need a sync
    fn pending(&self) -> Vec<&'static str> {
        if !self.is_managed() {
            return Vec::new();
        }
        self.properties().out_of_sync().map(|p| p.name).collect()
    }

    /// Check if the resource needs changes to reach desired state
    fn needs_apply(&self) -> bool {
        !self.pending().is_empty()
    }

    /// Sync every pending property
    ///
    /// Respects `ctx.dry_run` and stops at the first failing property.
    fn apply(&mut self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if !self.is_managed() {
            return Ok(ApplyResult::Skipped {
                reason: "Observed only".to_string(),
            });
        }

        let pending = self.pending();
        if pending.is_empty() {
            return Ok(ApplyResult::NoChange);
        }

        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let creating = self.presence() == Presence::Absent;
        for property in &pending {
            self.sync(property, ctx)?;
        }

        let properties = pending.len();
        Ok(if creating {
            ApplyResult::Created { properties }
        } else {
            ApplyResult::Modified { properties }
        })
    }

    /// Whether this resource can be applied in parallel with others
    fn can_parallelize(&self) -> bool {
        true
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Extension trait for working with boxed resources
pub trait ResourceExt {
    /// Check if the resource requires sudo based on its requirement
    fn requires_sudo(&self) -> bool;

    /// Reference in `type[id]` form, used in messages
    fn reference(&self) -> String;
}

impl<R: Resource + ?Sized> ResourceExt for R {
    fn requires_sudo(&self) -> bool {
        matches!(self.sudo_requirement(), SudoRequirement::Required { .. })
    }

    fn reference(&self) -> String {
        format!("{}[{}]", self.resource_type(), self.id())
    }
}
