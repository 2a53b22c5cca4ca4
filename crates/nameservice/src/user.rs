//! The `user` resource type.
//!
//! A [`UserResource`] pairs a login name with the desired values of the
//! states in [`USER_STATES`]. Raw attributes are munged at construction;
//! in managed mode the required states are then filled in with `Auto`.
//! Convergence happens one state at a time through the platform backend.

use crate::autogen;
use crate::backend::{FIELD_DIR, FIELD_GECOS};
use crate::database::AccountRecord;
use crate::platform::Platform;
use declarative::{
    ApplyContext, Error, Presence, PropertySet, PropertyValue, RawValue, Resource, ResourceExt,
    Result, StateDescriptor, StateFlags, SudoRequirement, munge_attributes, validate_required,
};
use std::collections::BTreeMap;

/// Resource type name
pub const USER_TYPE: &str = "user";

/// Every state a user account can manage, in sync order
///
/// uid comes first so that a missing account is created with its id.
pub static USER_STATES: [StateDescriptor<Platform>; 5] = [
    StateDescriptor {
        name: "uid",
        description: "Numeric user id. Left out, a new account gets one above the highest \
                      existing id (ignoring ids above 65000). An explicit `:auto` is \
                      resolved when the manifest is loaded, so it renumbers existing accounts.",
        flags: StateFlags::AUTOGEN,
        munge: Some(munge_uid),
        generate: Some(generate_uid),
        native_field: None,
    },
    StateDescriptor {
        name: "gid",
        description: "Primary group, as a number or a group name resolved at load time.",
        flags: StateFlags::AUTOGEN,
        munge: Some(munge_gid),
        generate: None,
        native_field: None,
    },
    StateDescriptor {
        name: "comment",
        description: "Description of the account, usually the full name.",
        flags: StateFlags::OPTIONAL,
        munge: None,
        generate: None,
        native_field: Some(FIELD_GECOS),
    },
    StateDescriptor {
        name: "home",
        description: "Home directory. The directory itself is not created.",
        flags: StateFlags::AUTOGEN,
        munge: None,
        generate: None,
        native_field: Some(FIELD_DIR),
    },
    StateDescriptor {
        name: "shell",
        description: "Login shell.",
        flags: StateFlags::AUTOGEN,
        munge: None,
        generate: None,
        native_field: None,
    },
];

/// Descriptor of a user state by name
pub fn descriptor(name: &str) -> Option<&'static StateDescriptor<Platform>> {
    USER_STATES.iter().find(|d| d.name == name)
}

fn id_from_integer(property: &str, n: i64) -> Result<PropertyValue> {
    u32::try_from(n)
        .map(PropertyValue::concrete)
        .map_err(|_| Error::invalid_value(property, n, "out of range"))
}

fn id_from_digits(property: &str, digits: &str) -> Result<PropertyValue> {
    digits
        .parse::<u32>()
        .map(PropertyValue::concrete)
        .map_err(|e| Error::invalid_value(property, digits, e.to_string()))
}

fn munge_uid(raw: &RawValue, platform: &Platform) -> Result<PropertyValue> {
    match raw {
        RawValue::Symbol(_) => match raw.sentinel() {
            Some(PropertyValue::Auto) => generate_uid(platform),
            Some(sentinel) => Ok(sentinel),
            None => Err(Error::invalid_value("uid", raw, "invalid uid")),
        },
        RawValue::Integer(n) => id_from_integer("uid", *n),
        RawValue::Text(_) => match raw.digits() {
            Some(digits) => id_from_digits("uid", digits),
            None => Err(Error::invalid_value("uid", raw, "uids must be numeric")),
        },
    }
}

fn generate_uid(platform: &Platform) -> Result<PropertyValue> {
    autogen::next_uid(platform.database())
        .map(PropertyValue::concrete)
        .map_err(|e| Error::Lookup {
            property: "uid".to_string(),
            value: format!(":{}", declarative::AUTO_SYMBOL),
            cause: e.to_string(),
        })
}

fn munge_gid(raw: &RawValue, platform: &Platform) -> Result<PropertyValue> {
    match raw {
        RawValue::Symbol(_) => raw
            .sentinel()
            .ok_or_else(|| Error::invalid_value("gid", raw, "invalid gid")),
        RawValue::Integer(n) => id_from_integer("gid", *n),
        RawValue::Text(name) => {
            if let Some(digits) = raw.digits() {
                return id_from_digits("gid", digits);
            }

            let lookup_error = |cause: String| Error::Lookup {
                property: "gid".to_string(),
                value: name.clone(),
                cause,
            };
            let group = platform
                .database()
                .group_by_name(name)
                .map_err(|e| lookup_error(e.to_string()))?
                .ok_or_else(|| lookup_error("no such group".to_string()))?;

            log::info!("setting gid to {} for group {name}", group.gid);
            Ok(PropertyValue::concrete(group.gid))
        }
    }
}

/// Reject names the account database cannot store
fn check_identity(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_value("name", name, "user name cannot be empty"));
    }
    if name.contains(':') || name.chars().any(char::is_control) {
        return Err(Error::invalid_value(
            "name",
            name.escape_debug(),
            "user name cannot contain ':' or control characters",
        ));
    }
    Ok(())
}

/// How a user resource treats its desired values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Desired values are enforced
    #[default]
    Managed,
    /// Only observed; never validated or synced
    Observed,
}

/// A user account and its desired state
#[derive(Debug)]
pub struct UserResource {
    name: String,
    mode: Mode,
    properties: PropertySet,
    platform: Platform,
    /// Cached account record, filled by `getinfo`
    info: Option<AccountRecord>,
    presence: Presence,
    sudo: SudoRequirement,
}

impl UserResource {
    /// Build a user from raw attributes
    ///
    /// Every attribute is munged right away; managed resources are then
    /// validated, which injects `Auto` for missing autogen-capable states.
    pub fn new(
        name: &str,
        attributes: &BTreeMap<String, RawValue>,
        mode: Mode,
        platform: Platform,
    ) -> Result<Self> {
        check_identity(name)?;
        let reference = format!("{USER_TYPE}[{name}]");

        let mut properties = munge_attributes(&reference, &USER_STATES, attributes, &platform)?;

        if mode == Mode::Managed {
            let explicit = properties.len();
            let injected = validate_required(&reference, &USER_STATES, &mut properties)?;
            if !injected.is_empty() {
                log::debug!("{reference}: defaulting {} to :auto", injected.join(", "));
            }

            // backends need at least one property to act on
            if explicit == 0 {
                let comment = &USER_STATES[2];
                let value = comment.munge(&RawValue::text(name), &platform)?;
                properties.set_desired(comment.name, value);
                properties.order_by(&USER_STATES);
            }
        } else {
            // observation reads every state, declared or not
            for state in &USER_STATES {
                if !properties.contains(state.name) {
                    properties.set_desired(state.name, PropertyValue::Auto);
                }
            }
            properties.order_by(&USER_STATES);
        }

        Ok(Self {
            name: name.to_string(),
            mode,
            properties,
            platform,
            info: None,
            presence: Presence::Unknown,
            sudo: SudoRequirement::None,
        })
    }

    /// Managed user on the process-wide platform
    pub fn managed(name: &str, attributes: &BTreeMap<String, RawValue>) -> Result<Self> {
        Self::new(name, attributes, Mode::Managed, Platform::global().clone())
    }

    /// Declare whether changes to this user need elevated privileges
    pub fn with_sudo_requirement(mut self, requirement: SudoRequirement) -> Self {
        self.sudo = requirement;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Live account record, looked up once and cached
    ///
    /// A missing account yields `None` and leaves the cache empty.
    pub fn getinfo(&mut self, refresh: bool) -> Result<Option<&AccountRecord>> {
        if refresh || self.info.is_none() {
            self.info = self
                .platform
                .database()
                .user_by_name(&self.name)
                .map_err(|e| Error::backend(self.reference(), e))?;
        }
        Ok(self.info.as_ref())
    }

    /// Drop the cached account record
    pub fn invalidate(&mut self) {
        self.info = None;
    }

    fn retrieve_properties(&mut self) -> Result<()> {
        let Some(record) = self.getinfo(true)?.cloned() else {
            log::trace!("{}: no such account", self.reference());
            self.presence = Presence::Absent;
            self.properties.set_all_actual(&PropertyValue::NotFound);
            return Ok(());
        };

        self.presence = Presence::Present;
        let names: Vec<&'static str> = self.properties.iter().map(|p| p.name).collect();
        for name in names {
            let descriptor = descriptor(name).ok_or_else(|| {
                Error::InternalInvariant(format!("user has no state named {name}"))
            })?;
            let actual = self
                .platform
                .backend()
                .retrieve(&record, descriptor.field())
                .map_err(|e| Error::backend(self.reference(), e))?;
            log::trace!("{}: {name} is {actual}", self.reference());
            self.properties.set_actual(name, actual)?;
        }
        Ok(())
    }

    fn sync_property(&mut self, property: &str, ctx: &ApplyContext) -> Result<PropertyValue> {
        let descriptor = descriptor(property).ok_or_else(|| {
            Error::InternalInvariant(format!("user has no state named {property}"))
        })?;
        let desired = self.properties.desired(property).cloned().ok_or_else(|| {
            Error::InternalInvariant(format!("{property} has no desired value"))
        })?;
        if desired.is_not_found() {
            return Err(Error::InternalInvariant(format!(
                "{} cannot sync {property} to {desired}",
                self.reference()
            )));
        }

        let value = descriptor.resolve(&desired, &self.platform)?;
        if desired.is_auto() && !value.is_auto() {
            log::info!("{}: {property} resolved to {value}", self.reference());
        }

        self.platform
            .backend()
            .sync(ctx, &self.name, descriptor.field(), &value)
            .map_err(|e| Error::backend(self.reference(), e))?;

        self.invalidate();
        let observed = if value.is_auto() {
            self.observe_field(descriptor.field())?
                .unwrap_or_else(|| value.clone())
        } else {
            value.clone()
        };
        self.properties.set_actual(property, observed)?;
        Ok(value)
    }

    /// Value the platform picked for a field left to its default
    ///
    /// `None` when the account is still missing.
    fn observe_field(&mut self, field: &str) -> Result<Option<PropertyValue>> {
        let Some(record) = self.getinfo(true)?.cloned() else {
            return Ok(None);
        };
        self.platform
            .backend()
            .retrieve(&record, field)
            .map(Some)
            .map_err(|e| Error::backend(self.reference(), e))
    }
}

impl Resource for UserResource {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        match self.mode {
            Mode::Managed => format!("User account {}", self.name),
            Mode::Observed => format!("User account {} (observed)", self.name),
        }
    }

    fn resource_type(&self) -> &'static str {
        USER_TYPE
    }

    fn sudo_requirement(&self) -> SudoRequirement {
        self.sudo.clone()
    }

    fn is_managed(&self) -> bool {
        self.mode == Mode::Managed
    }

    fn exists(&self) -> Result<bool> {
        self.platform
            .backend()
            .exists(&self.name)
            .map_err(|e| Error::backend(self.reference(), e))
    }

    fn retrieve(&mut self) -> Result<()> {
        self.retrieve_properties()
    }

    fn presence(&self) -> Presence {
        self.presence
    }

    fn properties(&self) -> &PropertySet {
        &self.properties
    }

    fn sync(&mut self, property: &str, ctx: &mut ApplyContext) -> Result<PropertyValue> {
        self.sync_property(property, ctx)
    }

    /// Account tools lock the database and uid allocation is unreserved
    fn can_parallelize(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::useradd::ObjectAddBackend;
    use crate::database::{AccountDatabase, GroupRecord, MemoryDatabase};
    use std::sync::Arc;

    fn platform(db: MemoryDatabase) -> Platform {
        let db = Arc::new(db);
        let backend = ObjectAddBackend::with_tools("useradd", "usermod", db.clone());
        Platform::new(Arc::new(backend), db)
    }

    fn attrs(pairs: &[(&str, RawValue)]) -> BTreeMap<String, RawValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_uid_digits_are_idempotent() {
        let p = platform(MemoryDatabase::new());
        let first = munge_uid(&RawValue::text("1001"), &p).unwrap();
        let second = munge_uid(&RawValue::text("1001"), &p).unwrap();
        assert_eq!(first, PropertyValue::concrete(1001u32));
        assert_eq!(first, second);
    }

    #[test]
    fn test_uid_rejects_garbage() {
        let p = platform(MemoryDatabase::new());
        for raw in [
            RawValue::text("alice"),
            RawValue::text("-1"),
            RawValue::Integer(-1),
            RawValue::Integer(i64::from(u32::MAX) + 1),
            RawValue::text("99999999999"),
            RawValue::symbol("absent"),
        ] {
            assert!(
                matches!(munge_uid(&raw, &p), Err(Error::InvalidValue { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_uid_notfound_passes_through() {
        let p = platform(MemoryDatabase::new());
        assert_eq!(
            munge_uid(&RawValue::not_found(), &p).unwrap(),
            PropertyValue::NotFound
        );
    }

    #[test]
    fn test_explicit_auto_uid_resolves_at_munge() {
        let p = platform(
            MemoryDatabase::new()
                .with_user(AccountRecord::new("bob", 1000, 100))
                .with_user(AccountRecord::new("nobody", 65534, 65534)),
        );
        assert_eq!(
            munge_uid(&RawValue::auto(), &p).unwrap(),
            PropertyValue::concrete(1001u32)
        );
    }

    #[test]
    fn test_gid_name_resolves_through_group_database() {
        let db = MemoryDatabase::new().with_group(GroupRecord::new("staff", 50));
        let direct = db.group_by_name("staff").unwrap().unwrap().gid;
        let p = platform(db);

        assert_eq!(
            munge_gid(&RawValue::text("staff"), &p).unwrap(),
            PropertyValue::concrete(direct)
        );
        assert_eq!(
            munge_gid(&RawValue::text("500"), &p).unwrap(),
            PropertyValue::concrete(500u32)
        );
    }

    #[test]
    fn test_gid_unknown_group_is_lookup_error() {
        let p = platform(MemoryDatabase::new());
        let err = munge_gid(&RawValue::text("wheel"), &p).unwrap_err();
        assert!(matches!(err, Error::Lookup { ref value, .. } if value == "wheel"));
    }

    #[test]
    fn test_gid_sentinels() {
        let p = platform(MemoryDatabase::new());
        assert_eq!(munge_gid(&RawValue::auto(), &p).unwrap(), PropertyValue::Auto);
        assert!(matches!(
            munge_gid(&RawValue::symbol("staff"), &p),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_zero_attributes_default_comment() {
        let user = UserResource::new(
            "carol",
            &BTreeMap::new(),
            Mode::Managed,
            platform(MemoryDatabase::new()),
        )
        .unwrap();
        let props = user.properties();

        assert_eq!(props.desired("comment"), Some(&PropertyValue::concrete("carol")));
        for state in ["uid", "gid", "home", "shell"] {
            assert_eq!(props.desired(state), Some(&PropertyValue::Auto), "{state}");
        }
        let order: Vec<_> = props.iter().map(|p| p.name).collect();
        assert_eq!(order, ["uid", "gid", "comment", "home", "shell"]);
    }

    #[test]
    fn test_explicit_attributes_skip_comment_default() {
        let user = UserResource::new(
            "alice",
            &attrs(&[("shell", RawValue::text("/bin/zsh"))]),
            Mode::Managed,
            platform(MemoryDatabase::new()),
        )
        .unwrap();
        assert!(!user.properties().contains("comment"));
        assert_eq!(user.properties().len(), 4);
    }

    #[test]
    fn test_observed_mode_skips_validation() {
        let user = UserResource::new(
            "bob",
            &BTreeMap::new(),
            Mode::Observed,
            platform(MemoryDatabase::new()),
        )
        .unwrap();
        assert!(!user.is_managed());
        assert_eq!(user.properties().len(), USER_STATES.len());
        assert!(user.properties().iter().all(|p| p.desired.is_auto()));
        assert!(user.pending().is_empty());
    }

    #[test]
    fn test_observed_user_reads_every_state() {
        let db = MemoryDatabase::new()
            .with_user(AccountRecord::new("bob", 1000, 100).with_gecos("Bob"));
        let mut user =
            UserResource::new("bob", &BTreeMap::new(), Mode::Observed, platform(db)).unwrap();
        user.retrieve().unwrap();

        let props = user.properties();
        assert_eq!(props.actual("uid"), Some(&PropertyValue::concrete(1000u32)));
        assert_eq!(props.actual("comment"), Some(&PropertyValue::concrete("Bob")));
        assert_eq!(props.actual("home"), Some(&PropertyValue::concrete("/home/bob")));
        assert_eq!(props.actual("shell"), Some(&PropertyValue::concrete("/bin/sh")));
    }

    #[test]
    fn test_identity_checks() {
        let p = platform(MemoryDatabase::new());
        for name in ["", "a:b", "line\nbreak"] {
            assert!(matches!(
                UserResource::new(name, &BTreeMap::new(), Mode::Managed, p.clone()),
                Err(Error::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_attribute() {
        let err = UserResource::new(
            "alice",
            &attrs(&[("locked", RawValue::text("true"))]),
            Mode::Managed,
            platform(MemoryDatabase::new()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { ref property, .. } if property == "locked"));
    }

    #[test]
    fn test_getinfo_caches_until_refresh() {
        let db = Arc::new(MemoryDatabase::new().with_user(AccountRecord::new("alice", 1001, 100)));
        let p = Platform::new(
            Arc::new(ObjectAddBackend::with_tools("useradd", "usermod", db.clone())),
            db.clone(),
        );
        let mut user = UserResource::new("alice", &BTreeMap::new(), Mode::Managed, p).unwrap();

        assert_eq!(user.getinfo(false).unwrap().unwrap().shell, "/bin/sh");
        db.upsert_user(AccountRecord::new("alice", 1001, 100).with_shell("/bin/zsh"));

        assert_eq!(user.getinfo(false).unwrap().unwrap().shell, "/bin/sh");
        assert_eq!(user.getinfo(true).unwrap().unwrap().shell, "/bin/zsh");

        user.invalidate();
        db.upsert_user(AccountRecord::new("alice", 1001, 100).with_shell("/bin/fish"));
        assert_eq!(user.getinfo(false).unwrap().unwrap().shell, "/bin/fish");
    }

    #[test]
    fn test_getinfo_missing_account() {
        let mut user = UserResource::new(
            "ghost",
            &BTreeMap::new(),
            Mode::Managed,
            platform(MemoryDatabase::new()),
        )
        .unwrap();
        assert!(user.getinfo(false).unwrap().is_none());
        assert!(!user.exists().unwrap());
    }

    #[test]
    fn test_descriptor_table() {
        assert_eq!(descriptor("comment").unwrap().field(), "gecos");
        assert_eq!(descriptor("home").unwrap().field(), "dir");
        assert_eq!(descriptor("shell").unwrap().field(), "shell");
        assert!(descriptor("uid").unwrap().generate.is_some());
        assert!(descriptor("gid").unwrap().generate.is_none());
        assert!(descriptor("locked").is_none());
    }
}
