//! # nameservice
//!
//! Declarative user accounts on top of the system name service.
//!
//! This crate provides the `user` resource type for the [`declarative`]
//! framework:
//! - Reading accounts and groups through libc (or an in-memory table)
//! - Allocating uids automatically
//! - Choosing the account tools of the host once per process
//! - Creating and modifying accounts with `useradd`/`usermod` or `dscl`
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{RawValue, Resource};
//! use nameservice::UserResource;
//! use std::collections::BTreeMap;
//!
//! let mut attributes = BTreeMap::new();
//! attributes.insert("uid".to_string(), RawValue::auto());
//! attributes.insert("shell".to_string(), RawValue::text("/bin/bash"));
//!
//! let mut alice = UserResource::managed("alice", &attributes).expect("valid user");
//! alice.retrieve().expect("account database readable");
//! for name in alice.pending() {
//!     println!("{name} needs a change");
//! }
//! ```

pub mod autogen;
pub mod backend;
pub mod database;
pub mod error;
pub mod platform;
pub mod user;

pub use autogen::{MAX_AUTOGEN_UID, next_uid};
pub use backend::Backend;
pub use database::{AccountDatabase, AccountRecord, GroupRecord, MemoryDatabase, SystemDatabase};
pub use error::{Error, Result};
pub use platform::{Family, Platform};
pub use user::{Mode, USER_STATES, USER_TYPE, UserResource, descriptor};
