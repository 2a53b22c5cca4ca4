//! Scoped sudo context with deterministic allowlist
//!
//! Sudo is never requested for the entire process. Instead:
//! 1. The manifest lists which users need sudo (allowlist)
//! 2. All accounts are retrieved and diffed first (no sudo needed)
//! 3. Sudo is acquired once for the privileged batch
//! 4. Sudo is released immediately after

use anyhow::{Context, Result, bail};
use declarative::{CommandOutput, SudoClassifier, SudoProvider};
use nameservice::USER_TYPE;
use serde::{Deserialize, Serialize};
use std::io;
use std::process::Command;

/// Configuration for sudo allowlist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SudoConfig {
    /// Users whose changes run through sudo; empty means every user
    #[serde(default)]
    pub users: Vec<String>,
}

impl SudoConfig {
    /// Check if changes to a user require sudo, given the current privileges
    pub fn user_requires_sudo(&self, name: &str, is_root: bool) -> bool {
        if is_root {
            return false;
        }
        self.users.is_empty() || self.users.iter().any(|u| u == name)
    }
}

/// Whether the process already has root privileges
pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

impl SudoClassifier for SudoConfig {
    fn requires_sudo(&self, resource_type: &str, resource_id: &str) -> bool {
        match resource_type {
            USER_TYPE => self.user_requires_sudo(resource_id, running_as_root()),
            _ => false,
        }
    }
}

/// Scoped sudo context - automatically invalidates on drop
pub struct SudoContext {
    validated: bool,
}

impl SudoContext {
    /// Acquire sudo privileges with a reason shown to user
    pub fn acquire(reason: &str) -> Result<Self> {
        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        // Validate sudo (will prompt for password)
        let status = Command::new("sudo")
            .args(["-v"])
            .status()
            .context("Failed to execute sudo")?;

        if !status.success() {
            bail!("Failed to acquire sudo privileges");
        }

        log::debug!("sudo timestamp validated");
        Ok(Self { validated: true })
    }
}

impl SudoProvider for SudoContext {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<CommandOutput> {
        if !self.validated {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "sudo context not validated",
            ));
        }

        Command::new("sudo")
            .arg(cmd)
            .args(args)
            .output()
            .map(Into::into)
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        // Invalidate sudo timestamp to release privileges
        let _ = Command::new("sudo").args(["-k"]).status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sudo_config_defaults() {
        let config = SudoConfig::default();
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_empty_allowlist_means_everyone() {
        let config = SudoConfig::default();
        assert!(config.user_requires_sudo("alice", false));
        assert!(config.user_requires_sudo("bob", false));
    }

    #[test]
    fn test_allowlist() {
        let config = SudoConfig {
            users: vec!["alice".to_string()],
        };
        assert!(config.user_requires_sudo("alice", false));
        assert!(!config.user_requires_sudo("bob", false));
    }

    #[test]
    fn test_root_never_needs_sudo() {
        let config = SudoConfig {
            users: vec!["alice".to_string()],
        };
        assert!(!config.user_requires_sudo("alice", true));
        assert!(!SudoConfig::default().user_requires_sudo("bob", true));
    }

    #[test]
    fn test_sudo_classifier_ignores_other_types() {
        let config = SudoConfig::default();
        assert!(!config.requires_sudo("group", "staff"));
        assert_eq!(
            config.requires_sudo(USER_TYPE, "alice"),
            !running_as_root()
        );
    }
}
