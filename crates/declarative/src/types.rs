//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::process::Output;

/// Requirement level for sudo/elevated privileges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SudoRequirement {
    /// No elevated privileges needed
    #[default]
    None,
    /// Elevated privileges required with a reason
    Required { reason: String },
}

/// Whether the managed object exists on the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    /// Exists; properties are compared one by one
    Present,
    /// Missing; every property must be created
    Absent,
    /// Not retrieved yet
    Unknown,
}

/// Result of converging a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Already in the desired state
    NoChange,
    /// The object was created
    Created { properties: usize },
    /// Existing object had properties changed
    Modified { properties: usize },
    /// Convergence failed
    Failed { error: String },
    /// Convergence was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Modified { .. })
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
    /// Individual property syncs performed
    pub properties_synced: usize,
}

impl ExecuteSummary {
    /// Total number of resources that changed
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.skipped + self.failed + self.no_change
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.no_change += other.no_change;
        self.properties_synced += other.properties_synced;
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created { properties } => {
                self.created += 1;
                self.properties_synced += properties;
            }
            ApplyResult::Modified { properties } => {
                self.modified += 1;
                self.properties_synced += properties;
            }
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs for unprivileged resources
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            verbose: false,
        }
    }
}

/// Output of a command run by a backend
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}
