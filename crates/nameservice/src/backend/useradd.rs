//! `useradd`/`usermod` backend for Linux and the BSDs.
//!
//! A missing account is created by `useradd` with the first attribute
//! being synced; every later attribute goes through `usermod`. Reads use
//! the account database rather than parsing tool output.

use crate::backend::{
    Backend, FIELD_DIR, FIELD_GECOS, FIELD_GID, FIELD_SHELL, FIELD_UID, command_arg, locate,
    record_field, run_checked,
};
use crate::database::{AccountDatabase, AccountRecord};
use crate::error::{Error, Result};
use crate::platform::Family;
use declarative::{ApplyContext, PropertyValue};
use std::sync::Arc;

/// Backend driving the shadow-utils tools
pub struct ObjectAddBackend {
    useradd: String,
    usermod: String,
    database: Arc<dyn AccountDatabase>,
}

impl ObjectAddBackend {
    pub fn new(database: Arc<dyn AccountDatabase>) -> Self {
        Self::with_tools(locate("useradd"), locate("usermod"), database)
    }

    /// Use explicit tool paths
    pub fn with_tools(
        useradd: impl Into<String>,
        usermod: impl Into<String>,
        database: Arc<dyn AccountDatabase>,
    ) -> Self {
        Self {
            useradd: useradd.into(),
            usermod: usermod.into(),
            database,
        }
    }
}

/// Command-line flag for a native field
pub fn flag_for(field: &str) -> Result<&'static str> {
    match field {
        FIELD_UID => Ok("-u"),
        FIELD_GID => Ok("-g"),
        FIELD_GECOS => Ok("-c"),
        FIELD_DIR => Ok("-d"),
        FIELD_SHELL => Ok("-s"),
        other => Err(Error::UnknownField(other.to_string())),
    }
}

/// Arguments creating `name`, setting `field` unless the value is left
/// to the system
///
/// `useradd -d` only records the path; the directory is not created.
pub fn useradd_args(name: &str, field: &str, value: Option<&str>) -> Result<Vec<String>> {
    let flag = flag_for(field)?;
    let mut args = Vec::with_capacity(3);
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
    args.push(name.to_string());
    Ok(args)
}

/// Arguments changing `field` on an existing account
pub fn usermod_args(name: &str, field: &str, value: &str) -> Result<Vec<String>> {
    Ok(vec![
        flag_for(field)?.to_string(),
        value.to_string(),
        name.to_string(),
    ])
}

impl Backend for ObjectAddBackend {
    fn family(&self) -> Family {
        Family::ObjectAdd
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.database.user_by_name(name)?.is_some())
    }

    fn retrieve(&self, record: &AccountRecord, field: &str) -> Result<PropertyValue> {
        record_field(record, field)
    }

    fn sync(
        &self,
        ctx: &ApplyContext,
        name: &str,
        field: &str,
        value: &PropertyValue,
    ) -> Result<()> {
        let arg = command_arg(field, value)?;

        if !self.exists(name)? {
            let args = useradd_args(name, field, arg.as_deref())?;
            run_checked(ctx, &self.useradd, &args)?;
            return Ok(());
        }

        match arg {
            Some(arg) => {
                let args = usermod_args(name, field, &arg)?;
                run_checked(ctx, &self.usermod, &args)?;
            }
            None => log::debug!("{name}: {field} left to the system default"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDatabase;
    use declarative::{CommandOutput, SudoProvider};
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSudo {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSudo {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SudoProvider for RecordingSudo {
        fn run(&self, cmd: &str, args: &[&str]) -> io::Result<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{cmd} {}", args.join(" ")));
            Ok(CommandOutput {
                stdout: Vec::new(),
                stderr: if self.fail { b"usermod: user busy\n".to_vec() } else { Vec::new() },
                success: !self.fail,
            })
        }
    }

    fn backend(db: MemoryDatabase) -> ObjectAddBackend {
        ObjectAddBackend::with_tools("useradd", "usermod", Arc::new(db))
    }

    #[test]
    fn test_useradd_args() {
        assert_eq!(
            useradd_args("alice", FIELD_UID, Some("1002")).unwrap(),
            ["-u", "1002", "alice"]
        );
        assert_eq!(useradd_args("alice", FIELD_DIR, None).unwrap(), ["alice"]);
        assert!(useradd_args("alice", "password", Some("x")).is_err());
    }

    #[test]
    fn test_usermod_args() {
        assert_eq!(
            usermod_args("alice", FIELD_SHELL, "/bin/zsh").unwrap(),
            ["-s", "/bin/zsh", "alice"]
        );
        assert_eq!(
            usermod_args("alice", FIELD_GECOS, "Alice Smith").unwrap(),
            ["-c", "Alice Smith", "alice"]
        );
    }

    #[test]
    fn test_sync_creates_missing_account() {
        let sudo = RecordingSudo::default();
        let ctx = ApplyContext::with_sudo(false, false, &sudo);

        backend(MemoryDatabase::new())
            .sync(&ctx, "alice", FIELD_UID, &PropertyValue::concrete(1002u32))
            .unwrap();

        assert_eq!(sudo.calls(), ["useradd -u 1002 alice"]);
    }

    #[test]
    fn test_sync_modifies_existing_account() {
        let sudo = RecordingSudo::default();
        let ctx = ApplyContext::with_sudo(false, false, &sudo);
        let db = MemoryDatabase::new().with_user(AccountRecord::new("alice", 1002, 100));

        backend(db)
            .sync(&ctx, "alice", FIELD_SHELL, &PropertyValue::concrete("/bin/zsh"))
            .unwrap();

        assert_eq!(sudo.calls(), ["usermod -s /bin/zsh alice"]);
    }

    #[test]
    fn test_auto_on_existing_account_is_noop() {
        let sudo = RecordingSudo::default();
        let ctx = ApplyContext::with_sudo(false, false, &sudo);
        let db = MemoryDatabase::new().with_user(AccountRecord::new("alice", 1002, 100));

        backend(db)
            .sync(&ctx, "alice", FIELD_DIR, &PropertyValue::Auto)
            .unwrap();

        assert!(sudo.calls().is_empty());
    }

    #[test]
    fn test_auto_on_missing_account_omits_flag() {
        let sudo = RecordingSudo::default();
        let ctx = ApplyContext::with_sudo(false, false, &sudo);

        backend(MemoryDatabase::new())
            .sync(&ctx, "alice", FIELD_GID, &PropertyValue::Auto)
            .unwrap();

        assert_eq!(sudo.calls(), ["useradd alice"]);
    }

    #[test]
    fn test_failed_command_carries_stderr() {
        let sudo = RecordingSudo {
            fail: true,
            ..Default::default()
        };
        let ctx = ApplyContext::with_sudo(false, false, &sudo);
        let db = MemoryDatabase::new().with_user(AccountRecord::new("alice", 1002, 100));

        let err = backend(db)
            .sync(&ctx, "alice", FIELD_SHELL, &PropertyValue::concrete("/bin/zsh"))
            .unwrap_err();

        assert!(
            matches!(err, Error::CommandFailed { ref stderr, .. } if stderr == "usermod: user busy")
        );
    }

    #[test]
    fn test_notfound_is_never_written() {
        let sudo = RecordingSudo::default();
        let ctx = ApplyContext::with_sudo(false, false, &sudo);

        let err = backend(MemoryDatabase::new())
            .sync(&ctx, "alice", FIELD_UID, &PropertyValue::NotFound)
            .unwrap_err();

        assert!(matches!(err, Error::Unsupported { .. }));
        assert!(sudo.calls().is_empty());
    }
}
