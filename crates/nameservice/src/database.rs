//! Account and group databases.
//!
//! [`SystemDatabase`] reads the host's name service through the reentrant
//! libc calls. [`MemoryDatabase`] keeps records in memory and is meant for
//! tests and for embedding the user type on top of another store.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ffi::{CStr, CString, c_char};
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::{Mutex, RwLock};

/// One entry of the account database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    /// GECOS field, conventionally the full name
    pub gecos: String,
    /// Home directory
    pub dir: String,
    pub shell: String,
}

impl AccountRecord {
    pub fn new(name: &str, uid: u32, gid: u32) -> Self {
        Self {
            name: name.to_string(),
            uid,
            gid,
            gecos: String::new(),
            dir: format!("/home/{name}"),
            shell: "/bin/sh".to_string(),
        }
    }

    pub fn with_gecos(mut self, gecos: &str) -> Self {
        self.gecos = gecos.to_string();
        self
    }

    pub fn with_dir(mut self, dir: &str) -> Self {
        self.dir = dir.to_string();
        self
    }

    pub fn with_shell(mut self, shell: &str) -> Self {
        self.shell = shell.to_string();
        self
    }
}

/// One entry of the group database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub gid: u32,
    #[serde(default)]
    pub members: Vec<String>,
}

impl GroupRecord {
    pub fn new(name: &str, gid: u32) -> Self {
        Self {
            name: name.to_string(),
            gid,
            members: Vec::new(),
        }
    }
}

/// Read access to accounts and groups
///
/// Lookups that find nothing return `Ok(None)`; errors are reserved for
/// a database that could not be queried at all.
pub trait AccountDatabase: Send + Sync {
    /// Look up an account by login name
    fn user_by_name(&self, name: &str) -> Result<Option<AccountRecord>>;

    /// Every account, in unspecified order
    fn all_users(&self) -> Result<Vec<AccountRecord>>;

    /// Look up a group by name
    fn group_by_name(&self, name: &str) -> Result<Option<GroupRecord>>;

    /// Look up a group by numeric id
    fn group_by_id(&self, gid: u32) -> Result<Option<GroupRecord>>;
}

// ============================================================================
// System database (libc)
// ============================================================================

/// Initial scratch buffer for the `*_r` calls; grown on ERANGE
const INITIAL_BUFFER: usize = 1024;
const MAX_BUFFER: usize = 1 << 20;

/// getpwent() keeps iteration state in libc; serialize scans
static PWENT_LOCK: Mutex<()> = Mutex::new(());

/// Name service of the running host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDatabase;

impl SystemDatabase {
    pub fn new() -> Self {
        Self
    }
}

/// errno values that POSIX allows for "no such entry"
fn is_not_found(errno: i32) -> bool {
    matches!(errno, libc::ENOENT | libc::ESRCH | libc::EBADF | libc::EPERM)
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::Database(format!("name contains NUL byte: {name:?}")))
}

/// Copy a C string owned by libc; null becomes empty
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        // SAFETY: caller guarantees a valid NUL-terminated string
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned()
    }
}

/// # Safety
/// `pw` must point to a passwd entry filled by libc.
unsafe fn account_from_passwd(pw: &libc::passwd) -> AccountRecord {
    // SAFETY: libc fills every string field with a valid pointer or null
    unsafe {
        AccountRecord {
            name: owned_string(pw.pw_name),
            uid: pw.pw_uid,
            gid: pw.pw_gid,
            gecos: owned_string(pw.pw_gecos),
            dir: owned_string(pw.pw_dir),
            shell: owned_string(pw.pw_shell),
        }
    }
}

/// # Safety
/// `gr` must point to a group entry filled by libc.
unsafe fn group_from_raw(gr: &libc::group) -> GroupRecord {
    let mut members = Vec::new();
    // SAFETY: gr_mem is a null-terminated array of C strings
    unsafe {
        let mut cursor = gr.gr_mem;
        while !cursor.is_null() && !(*cursor).is_null() {
            members.push(owned_string(*cursor));
            cursor = cursor.add(1);
        }
        GroupRecord {
            name: owned_string(gr.gr_name),
            gid: gr.gr_gid,
            members,
        }
    }
}

/// Drive one of the reentrant lookups, growing the buffer on ERANGE
fn reentrant_lookup<T, R>(
    call: &str,
    mut lookup: impl FnMut(*mut T, &mut [c_char], *mut *mut T) -> i32,
    convert: impl Fn(&T) -> R,
) -> Result<Option<R>> {
    let mut buf: Vec<c_char> = vec![0; INITIAL_BUFFER];

    loop {
        let mut entry = MaybeUninit::<T>::uninit();
        let mut result: *mut T = ptr::null_mut();
        let rc = lookup(entry.as_mut_ptr(), &mut buf, &mut result);

        if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 && !is_not_found(rc) {
            return Err(Error::from_errno(call, rc));
        }
        if rc != 0 || result.is_null() {
            return Ok(None);
        }

        // SAFETY: a non-null result points at `entry`, initialized by libc
        return Ok(Some(convert(unsafe { &*result })));
    }
}

impl AccountDatabase for SystemDatabase {
    fn user_by_name(&self, name: &str) -> Result<Option<AccountRecord>> {
        let name = c_name(name)?;
        reentrant_lookup(
            "getpwnam_r",
            |entry, buf, result| {
                // SAFETY: all pointers are valid for the duration of the call
                unsafe { libc::getpwnam_r(name.as_ptr(), entry, buf.as_mut_ptr(), buf.len(), result) }
            },
            // SAFETY: filled by getpwnam_r
            |pw| unsafe { account_from_passwd(pw) },
        )
    }

    fn all_users(&self) -> Result<Vec<AccountRecord>> {
        let _guard = PWENT_LOCK
            .lock()
            .map_err(|_| Error::Database("passwd scan lock poisoned".to_string()))?;

        let mut users = Vec::new();
        // SAFETY: setpwent/getpwent/endpwent are serialized by PWENT_LOCK and
        // each returned entry is copied before the next call
        unsafe {
            libc::setpwent();
            loop {
                let pw = libc::getpwent();
                if pw.is_null() {
                    break;
                }
                users.push(account_from_passwd(&*pw));
            }
            libc::endpwent();
        }

        log::trace!("scanned {} accounts", users.len());
        Ok(users)
    }

    fn group_by_name(&self, name: &str) -> Result<Option<GroupRecord>> {
        let name = c_name(name)?;
        reentrant_lookup(
            "getgrnam_r",
            |entry, buf, result| {
                // SAFETY: all pointers are valid for the duration of the call
                unsafe { libc::getgrnam_r(name.as_ptr(), entry, buf.as_mut_ptr(), buf.len(), result) }
            },
            // SAFETY: filled by getgrnam_r
            |gr| unsafe { group_from_raw(gr) },
        )
    }

    fn group_by_id(&self, gid: u32) -> Result<Option<GroupRecord>> {
        reentrant_lookup(
            "getgrgid_r",
            |entry, buf, result| {
                // SAFETY: all pointers are valid for the duration of the call
                unsafe { libc::getgrgid_r(gid, entry, buf.as_mut_ptr(), buf.len(), result) }
            },
            // SAFETY: filled by getgrgid_r
            |gr| unsafe { group_from_raw(gr) },
        )
    }
}

// ============================================================================
// In-memory database
// ============================================================================

/// Account database held in memory
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    users: RwLock<Vec<AccountRecord>>,
    groups: RwLock<Vec<GroupRecord>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, record: AccountRecord) -> Self {
        self.upsert_user(record);
        self
    }

    pub fn with_group(self, record: GroupRecord) -> Self {
        if let Ok(mut groups) = self.groups.write() {
            groups.retain(|g| g.name != record.name);
            groups.push(record);
        }
        self
    }

    /// Insert or replace an account by name
    pub fn upsert_user(&self, record: AccountRecord) {
        let mut users = match self.users.write() {
            Ok(users) => users,
            Err(poisoned) => poisoned.into_inner(),
        };
        match users.iter_mut().find(|u| u.name == record.name) {
            Some(existing) => *existing = record,
            None => users.push(record),
        }
    }

    fn read_users(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<AccountRecord>>> {
        self.users
            .read()
            .map_err(|_| Error::Database("user table lock poisoned".to_string()))
    }

    fn read_groups(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<GroupRecord>>> {
        self.groups
            .read()
            .map_err(|_| Error::Database("group table lock poisoned".to_string()))
    }
}

impl AccountDatabase for MemoryDatabase {
    fn user_by_name(&self, name: &str) -> Result<Option<AccountRecord>> {
        Ok(self.read_users()?.iter().find(|u| u.name == name).cloned())
    }

    fn all_users(&self) -> Result<Vec<AccountRecord>> {
        Ok(self.read_users()?.clone())
    }

    fn group_by_name(&self, name: &str) -> Result<Option<GroupRecord>> {
        Ok(self.read_groups()?.iter().find(|g| g.name == name).cloned())
    }

    fn group_by_id(&self, gid: u32) -> Result<Option<GroupRecord>> {
        Ok(self.read_groups()?.iter().find(|g| g.gid == gid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_lookups() {
        let db = MemoryDatabase::new()
            .with_user(AccountRecord::new("alice", 1000, 1000))
            .with_group(GroupRecord::new("staff", 50));

        assert_eq!(db.user_by_name("alice").unwrap().unwrap().uid, 1000);
        assert!(db.user_by_name("bob").unwrap().is_none());
        assert_eq!(db.group_by_name("staff").unwrap().unwrap().gid, 50);
        assert_eq!(db.group_by_id(50).unwrap().unwrap().name, "staff");
        assert!(db.group_by_id(51).unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let db = MemoryDatabase::new().with_user(AccountRecord::new("alice", 1000, 1000));
        db.upsert_user(AccountRecord::new("alice", 1000, 1000).with_shell("/bin/zsh"));

        let users = db.all_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].shell, "/bin/zsh");
    }

    #[test]
    fn test_system_root_account() {
        let db = SystemDatabase::new();
        let root = db.user_by_name("root").unwrap().expect("root account");
        assert_eq!(root.uid, 0);
    }

    #[test]
    fn test_system_missing_account() {
        let db = SystemDatabase::new();
        assert!(
            db.user_by_name("nssync-no-such-user-7f3a")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_system_scan_contains_root() {
        let users = SystemDatabase::new().all_users().unwrap();
        assert!(users.iter().any(|u| u.uid == 0));
    }

    #[test]
    fn test_system_group_by_id_zero() {
        let group = SystemDatabase::new().group_by_id(0).unwrap();
        assert!(group.is_some());
    }

    #[test]
    fn test_name_with_nul_is_rejected() {
        assert!(SystemDatabase::new().user_by_name("a\0b").is_err());
    }
}
