//! Execution engine for nssync
//!
//! The engine orchestrates:
//! 1. Planning - Build user resources from the manifest
//! 2. Diffing - Show desired vs actual account attributes
//! 3. Executing - Converge through `declarative::execute` with a progress
//!    bar, confirmation prompt and sudo batching

pub mod callbacks;
pub mod differ;
pub mod planner;

pub use callbacks::{BarProgress, PromptConfirm};
pub use planner::{PlannedUsers, build_plan};
