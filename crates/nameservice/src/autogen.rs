//! Automatic uid allocation.

use crate::database::AccountDatabase;
use crate::error::Result;

/// Accounts above this uid are ignored when picking the next one
///
/// Keeps `nobody`-style high ids (65534 and friends) from pushing new
/// accounts out of the regular range.
pub const MAX_AUTOGEN_UID: u32 = 65000;

/// Next free uid: one above the highest uid up to [`MAX_AUTOGEN_UID`]
///
/// An empty database yields 1. Allocation is not reserved; two callers
/// racing on the same database get the same answer.
pub fn next_uid(database: &dyn AccountDatabase) -> Result<u32> {
    let highest = database
        .all_users()?
        .iter()
        .map(|account| account.uid)
        .filter(|uid| *uid <= MAX_AUTOGEN_UID)
        .max();

    let uid = highest.map_or(1, |max| max + 1);
    log::debug!("next free uid is {uid}");
    Ok(uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{AccountRecord, MemoryDatabase};

    #[test]
    fn test_empty_database_starts_at_one() {
        assert_eq!(next_uid(&MemoryDatabase::new()).unwrap(), 1);
    }

    #[test]
    fn test_highest_plus_one() {
        let db = MemoryDatabase::new()
            .with_user(AccountRecord::new("root", 0, 0))
            .with_user(AccountRecord::new("alice", 1001, 100))
            .with_user(AccountRecord::new("bob", 1000, 100));
        assert_eq!(next_uid(&db).unwrap(), 1002);
    }

    #[test]
    fn test_ignores_ids_above_ceiling() {
        let db = MemoryDatabase::new()
            .with_user(AccountRecord::new("daemon", 1, 1))
            .with_user(AccountRecord::new("nobody", 65534, 65534))
            .with_user(AccountRecord::new("high", MAX_AUTOGEN_UID + 1, 100));
        assert_eq!(next_uid(&db).unwrap(), 2);
    }

    #[test]
    fn test_ceiling_itself_counts() {
        let db = MemoryDatabase::new()
            .with_user(AccountRecord::new("daemon", 1, 1))
            .with_user(AccountRecord::new("edge", MAX_AUTOGEN_UID, 100));
        assert_eq!(next_uid(&db).unwrap(), 65001);
    }

    #[test]
    fn test_only_high_ids_behaves_like_empty() {
        let db = MemoryDatabase::new().with_user(AccountRecord::new("nobody", 65534, 65534));
        assert_eq!(next_uid(&db).unwrap(), 1);
    }
}
