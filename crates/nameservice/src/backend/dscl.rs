//! Directory Services backend for macOS.
//!
//! Accounts are records under `/Users` on the local node and every
//! attribute is written with `dscl . -create`. Reads go through
//! `dscl . -read` so that values reflect the directory, not a cache.

use crate::backend::{
    Backend, FIELD_DIR, FIELD_GECOS, FIELD_GID, FIELD_SHELL, FIELD_UID, command_arg, locate,
    run_checked,
};
use crate::database::AccountRecord;
use crate::error::{Error, Result};
use crate::platform::Family;
use declarative::{ApplyContext, PropertyValue};
use std::process::Command;

/// Local directory node
const LOCAL_NODE: &str = ".";

pub struct DirectoryServiceBackend {
    dscl: String,
}

impl DirectoryServiceBackend {
    pub fn new() -> Self {
        Self {
            dscl: locate("dscl"),
        }
    }

    fn read(&self, name: &str, key: &str) -> Result<std::process::Output> {
        Command::new(&self.dscl)
            .args([LOCAL_NODE, "-read", &record_path(name), key])
            .output()
            .map_err(|e| Error::from_spawn("dscl", e))
    }
}

impl Default for DirectoryServiceBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Record path of an account
pub fn record_path(name: &str) -> String {
    format!("/Users/{name}")
}

/// Directory attribute holding a native field
pub fn dscl_key(field: &str) -> Result<&'static str> {
    match field {
        FIELD_UID => Ok("UniqueID"),
        FIELD_GID => Ok("PrimaryGroupID"),
        FIELD_GECOS => Ok("RealName"),
        FIELD_DIR => Ok("NFSHomeDirectory"),
        FIELD_SHELL => Ok("UserShell"),
        other => Err(Error::UnknownField(other.to_string())),
    }
}

/// Extract one attribute from `dscl -read` output
///
/// Short values share the line with the key (`UserShell: /bin/zsh`);
/// values with spaces are printed on indented continuation lines.
pub fn parse_read_output(output: &str, key: &str) -> Option<String> {
    let prefix = format!("{key}:");
    let mut lines = output.lines();

    while let Some(line) = lines.next() {
        let Some(rest) = line.strip_prefix(&prefix) else {
            continue;
        };

        let inline = rest.trim();
        if !inline.is_empty() {
            return Some(inline.to_string());
        }

        let continued: Vec<&str> = lines
            .by_ref()
            .take_while(|l| l.starts_with(' ') || l.starts_with('\t'))
            .map(str::trim)
            .collect();
        return Some(continued.join(" "));
    }

    None
}

/// Typed value of a raw directory attribute
fn typed_value(field: &str, raw: &str) -> Result<PropertyValue> {
    match field {
        FIELD_UID | FIELD_GID => raw
            .parse::<u32>()
            .map(PropertyValue::concrete)
            .map_err(|_| Error::Database(format!("non-numeric {field} in directory: {raw}"))),
        _ => Ok(PropertyValue::concrete(raw)),
    }
}

impl Backend for DirectoryServiceBackend {
    fn family(&self) -> Family {
        Family::DirectoryService
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.read(name, "RecordName")?.status.success())
    }

    fn retrieve(&self, record: &AccountRecord, field: &str) -> Result<PropertyValue> {
        let key = dscl_key(field)?;
        let output = self.read(&record.name, key)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such key") {
                log::trace!("{}: {key} not set", record.name);
                return Ok(PropertyValue::NotFound);
            }
            return Err(Error::CommandFailed {
                command: format!("dscl . -read {} {key}", record_path(&record.name)),
                stderr: stderr.trim().to_string(),
            });
        }

        match parse_read_output(&stdout, key) {
            Some(raw) => typed_value(field, &raw),
            None => Ok(PropertyValue::NotFound),
        }
    }

    fn sync(
        &self,
        ctx: &ApplyContext,
        name: &str,
        field: &str,
        value: &PropertyValue,
    ) -> Result<()> {
        let key = dscl_key(field)?;
        let arg = command_arg(field, value)?;
        let path = record_path(name);

        if !self.exists(name)? {
            run_checked(ctx, &self.dscl, &[LOCAL_NODE.into(), "-create".into(), path.clone()])?;
        }

        match arg {
            Some(arg) => {
                let args = [
                    LOCAL_NODE.to_string(),
                    "-create".to_string(),
                    path,
                    key.to_string(),
                    arg,
                ];
                run_checked(ctx, &self.dscl, &args)?;
            }
            None => log::debug!("{name}: {key} left to the system default"),
        }
        Ok(())
    }
}
