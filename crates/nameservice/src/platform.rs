//! Platform selection.
//!
//! The backend family is chosen once per process from the operating
//! system name and shared by every user resource through [`Platform`].

use crate::backend::Backend;
use crate::backend::dscl::DirectoryServiceBackend;
use crate::backend::useradd::ObjectAddBackend;
use crate::database::{AccountDatabase, SystemDatabase};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Account tooling family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// macOS Directory Services (`dscl`)
    DirectoryService,
    /// `useradd`/`usermod`
    ObjectAdd,
}

impl Family {
    /// Family for an OS name as reported by `std::env::consts::OS`
    pub fn for_os(os: &str) -> Self {
        match os {
            "macos" => Self::DirectoryService,
            _ => Self::ObjectAdd,
        }
    }

    /// Family of the running host
    pub fn current() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectoryService => "directoryservice",
            Self::ObjectAdd => "useradd",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend and account database bound together
///
/// Cloning is cheap; clones share the same backend and database.
#[derive(Clone)]
pub struct Platform {
    family: Family,
    backend: Arc<dyn Backend>,
    database: Arc<dyn AccountDatabase>,
}

static GLOBAL: OnceLock<Platform> = OnceLock::new();

impl Platform {
    pub fn new(backend: Arc<dyn Backend>, database: Arc<dyn AccountDatabase>) -> Self {
        Self {
            family: backend.family(),
            backend,
            database,
        }
    }

    /// Host name service with the tools of `family`
    pub fn system(family: Family) -> Self {
        let database: Arc<dyn AccountDatabase> = Arc::new(SystemDatabase::new());
        let backend: Arc<dyn Backend> = match family {
            Family::DirectoryService => Arc::new(DirectoryServiceBackend::new()),
            Family::ObjectAdd => Arc::new(ObjectAddBackend::new(Arc::clone(&database))),
        };
        Self::new(backend, database)
    }

    /// Process-wide platform, detected on first use
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            let family = Family::current();
            log::debug!("using {family} account backend");
            Self::system(family)
        })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn database(&self) -> &dyn AccountDatabase {
        self.database.as_ref()
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_for_os() {
        assert_eq!(Family::for_os("macos"), Family::DirectoryService);
        assert_eq!(Family::for_os("linux"), Family::ObjectAdd);
        assert_eq!(Family::for_os("freebsd"), Family::ObjectAdd);
    }

    #[test]
    fn test_family_serializes_snake_case() {
        let json = serde_json::to_string(&Family::DirectoryService).unwrap();
        assert_eq!(json, "\"directory_service\"");
        let parsed: Family = serde_json::from_str("\"object_add\"").unwrap();
        assert_eq!(parsed, Family::ObjectAdd);
    }

    #[test]
    fn test_global_is_shared() {
        let first = Platform::global();
        let second = Platform::global();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.family(), Family::current());
    }

    #[test]
    fn test_system_binds_family() {
        assert_eq!(
            Platform::system(Family::ObjectAdd).family(),
            Family::ObjectAdd
        );
        assert_eq!(
            Platform::system(Family::DirectoryService).backend().family(),
            Family::DirectoryService
        );
    }
}
