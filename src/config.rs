//! Manifest discovery and loading
//!
//! The manifest is a TOML file with a `[sudo]` table and one `[users.<name>]`
//! table per account. Every key of a user table except `observe` is handed
//! to the user type unchanged as a raw attribute.

use crate::sudo::SudoConfig;
use anyhow::{Context, Result};
use declarative::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name inside the config directory
pub const MANIFEST_FILE: &str = "users.toml";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("nssync"))
}

/// Default manifest location
pub fn default_manifest_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(MANIFEST_FILE))
}

/// Declared state of the system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sudo: SudoConfig,

    #[serde(default)]
    pub users: BTreeMap<String, UserEntry>,
}

/// One `[users.<name>]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Only observe the account, never change it
    #[serde(default)]
    pub observe: bool,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, RawValue>,
}

impl Manifest {
    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid manifest format")
    }

    /// Read a manifest file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Load the manifest from an explicit path or the default location
    ///
    /// An explicit path must exist; a missing default file means nothing
    /// is declared.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            return Self::load_file(Path::new(&expanded));
        }

        let path = default_manifest_path()?;
        if !path.exists() {
            log::info!("no manifest at {}, nothing declared", path.display());
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }
}
