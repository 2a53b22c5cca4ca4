//! Apply context and provider traits
//!
//! These traits keep the crate free of any particular sudo, progress or
//! prompt implementation. Backends reach the system through
//! [`ApplyContext::run`], which transparently goes through the sudo
//! provider when one is attached.

use crate::types::{ApplyResult, CommandOutput};
use anyhow::Result;
use std::io;
use std::process::Command;

/// Provider for elevated privilege operations
///
/// Implement this trait to provide sudo/admin capabilities.
/// The implementation handles privilege acquisition and release.
pub trait SudoProvider: Send + Sync {
    /// Run a command with elevated privileges
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Classifier for determining which resources need elevated privileges
pub trait SudoClassifier: Send + Sync {
    /// Check if a resource requires elevated privileges
    ///
    /// # Arguments
    /// * `resource_type` - The type of resource (e.g., "user")
    /// * `resource_id` - The identity of the resource (e.g., "alice")
    fn requires_sudo(&self, resource_type: &str, resource_id: &str) -> bool;
}

/// Default classifier that never requires sudo
pub struct NoSudo;

impl SudoClassifier for NoSudo {
    fn requires_sudo(&self, _resource_type: &str, _resource_id: &str) -> bool {
        false
    }
}

/// Progress callback for execution operations
pub trait ProgressCallback: Send {
    /// Called when starting to apply a batch of resources
    fn on_batch_start(&mut self, count: usize, privileged: bool);

    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// Returns `true` if the user confirmed.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize, _privileged: bool) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Context passed to sync operations
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    /// Optional sudo provider for privileged operations
    pub sudo: Option<&'a dyn SudoProvider>,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self {
            dry_run,
            verbose,
            sudo: None,
        }
    }

    /// Create a context with a sudo provider
    pub fn with_sudo(dry_run: bool, verbose: bool, sudo: &'a dyn SudoProvider) -> Self {
        Self {
            dry_run,
            verbose,
            sudo: Some(sudo),
        }
    }

    /// Whether commands run with elevated privileges
    pub fn is_privileged(&self) -> bool {
        self.sudo.is_some()
    }

    /// Run a command, through sudo when a provider is attached
    pub fn run(&self, cmd: &str, args: &[&str]) -> io::Result<CommandOutput> {
        log::debug!(
            "{}{} {}",
            if self.sudo.is_some() { "sudo " } else { "" },
            cmd,
            args.join(" ")
        );

        match self.sudo {
            Some(sudo) => sudo.run(cmd, args),
            None => Command::new(cmd).args(args).output().map(Into::into),
        }
    }
}
