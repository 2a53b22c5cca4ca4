//! Platform backends that read and write account attributes.
//!
//! Every backend speaks in native field names (`uid`, `gid`, `gecos`,
//! `dir`, `shell`) and receives one field per [`Backend::sync`] call.
//! An `Auto` value means "let the platform pick": the attribute is
//! omitted from the command, or the call does nothing when the account
//! already exists.

pub mod dscl;
pub mod useradd;

use crate::database::AccountRecord;
use crate::error::{Error, Result};
use crate::platform::Family;
use declarative::{ApplyContext, PropertyValue};

pub const FIELD_UID: &str = "uid";
pub const FIELD_GID: &str = "gid";
pub const FIELD_GECOS: &str = "gecos";
pub const FIELD_DIR: &str = "dir";
pub const FIELD_SHELL: &str = "shell";

/// Account manipulation on one platform family
pub trait Backend: Send + Sync {
    /// Family this backend implements
    fn family(&self) -> Family;

    /// Whether an account with this name exists
    fn exists(&self, name: &str) -> Result<bool>;

    /// Current value of a native field for an existing account
    fn retrieve(&self, record: &AccountRecord, field: &str) -> Result<PropertyValue>;

    /// Write one native field, creating the account if needed
    fn sync(&self, ctx: &ApplyContext, name: &str, field: &str, value: &PropertyValue)
    -> Result<()>;
}

/// Read a native field straight from a database record
pub fn record_field(record: &AccountRecord, field: &str) -> Result<PropertyValue> {
    Ok(match field {
        FIELD_UID => PropertyValue::concrete(record.uid),
        FIELD_GID => PropertyValue::concrete(record.gid),
        FIELD_GECOS => PropertyValue::concrete(record.gecos.as_str()),
        FIELD_DIR => PropertyValue::concrete(record.dir.as_str()),
        FIELD_SHELL => PropertyValue::concrete(record.shell.as_str()),
        other => return Err(Error::UnknownField(other.to_string())),
    })
}

/// Command-line form of a value; `None` for `Auto`
pub fn command_arg(field: &str, value: &PropertyValue) -> Result<Option<String>> {
    match value {
        PropertyValue::Concrete(scalar) => Ok(Some(scalar.to_string())),
        PropertyValue::Auto => Ok(None),
        PropertyValue::NotFound => Err(Error::Unsupported {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Absolute path of a tool, falling back to the usual sbin location
///
/// Account tools often live outside an unprivileged user's PATH.
pub fn locate(tool: &str) -> String {
    which::which(tool)
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| format!("/usr/sbin/{tool}"))
}

/// Run a tool through the apply context and fail on a non-zero exit
pub fn run_checked(ctx: &ApplyContext, tool: &str, args: &[String]) -> Result<String> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = ctx
        .run(tool, &args)
        .map_err(|e| Error::from_spawn(tool, e))?;

    if !output.success {
        return Err(Error::CommandFailed {
            command: format!("{tool} {}", args.join(" ")),
            stderr: output.stderr_str().trim().to_string(),
        });
    }

    Ok(output.stdout_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field() {
        let record = AccountRecord::new("alice", 1001, 100).with_gecos("Alice");
        assert_eq!(
            record_field(&record, FIELD_UID).unwrap(),
            PropertyValue::concrete(1001u32)
        );
        assert_eq!(
            record_field(&record, FIELD_GECOS).unwrap(),
            PropertyValue::concrete("Alice")
        );
        assert_eq!(
            record_field(&record, FIELD_DIR).unwrap(),
            PropertyValue::concrete("/home/alice")
        );
        assert!(matches!(
            record_field(&record, "password"),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn test_command_arg() {
        assert_eq!(
            command_arg(FIELD_UID, &PropertyValue::concrete(7i64)).unwrap(),
            Some("7".to_string())
        );
        assert_eq!(command_arg(FIELD_DIR, &PropertyValue::Auto).unwrap(), None);
        assert!(command_arg(FIELD_DIR, &PropertyValue::NotFound).is_err());
    }

    #[test]
    fn test_locate_falls_back_to_sbin() {
        assert_eq!(
            locate("nssync-no-such-tool"),
            "/usr/sbin/nssync-no-such-tool"
        );
    }
}
