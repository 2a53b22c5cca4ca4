//! # Declarative
//!
//! A framework for declarative, property-level resource management.
//!
//! A resource type declares a static table of [`StateDescriptor`]s, one per
//! attribute it can manage. Raw configuration values are normalized by each
//! descriptor's munge rule into [`PropertyValue`]s at construction time,
//! the resource retrieves the actual values from the system, and
//! convergence syncs every property whose actual value does not fulfil the
//! desired one.
//!
//! ## Core Concepts
//!
//! - **PropertyValue**: `Concrete`, `Auto` (generate a default) or
//!   `NotFound` (the backing object does not exist)
//! - **StateDescriptor**: flags, munge rule, generator and native field of
//!   one attribute
//! - **Resource**: identity + properties, with exists/retrieve/sync
//! - **ExecutionPlan**: resources grouped by privilege level
//! - **Executor**: retrieves, diffs and applies with parallelism and
//!   privilege batching
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{munge_attributes, validate_required, RawValue};
//!
//! let mut set = munge_attributes("user[alice]", &STATES, &attributes, &ctx)?;
//! validate_required("user[alice]", &STATES, &mut set)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`SudoProvider`]: Provides elevated privilege execution
//! - [`SudoClassifier`]: Determines which resources need privileges
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod state;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, NoSudo,
    ProgressCallback, SudoClassifier, SudoProvider,
};
pub use diff::{DiffSummary, PropertyChange, ResourceDiff, compute_diffs, group_by_type};
pub use error::{BoxError, Error, Result};
pub use executor::{execute, execute_simple, retrieve_batch};
pub use planner::{ExecutionPlan, parse_target};
pub use resource::{BoxedResource, Resource, ResourceExt};
pub use state::{
    GenerateFn, MungeFn, Property, PropertySet, StateDescriptor, StateFlags, munge_attributes,
    passthrough, validate_required,
};
pub use types::{
    ApplyResult, CommandOutput, ExecuteOptions, ExecuteSummary, Presence, SudoRequirement,
};
pub use value::{AUTO_SYMBOL, NOTFOUND_SYMBOL, PropertyValue, RawValue, Scalar};
