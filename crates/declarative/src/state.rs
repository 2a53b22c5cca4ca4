//! State descriptors and property sets
//!
//! A resource type declares one [`StateDescriptor`] per attribute it can
//! manage. Descriptors live in `static` tables and carry the rule that
//! turns a [`RawValue`] into a [`PropertyValue`]. A [`PropertySet`] holds the
//! per-instance desired/actual pairs in declaration order.

use crate::error::{Error, Result};
use crate::value::{PropertyValue, RawValue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Normalization rule: raw input → canonical value
pub type MungeFn<C> = fn(&RawValue, &C) -> Result<PropertyValue>;

/// Default generator, used when `Auto` has to become concrete
pub type GenerateFn<C> = fn(&C) -> Result<PropertyValue>;

/// Capability flags of a state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateFlags {
    /// A default can be requested with `Auto`
    pub autogen: bool,
    /// The state may be left unset
    pub optional: bool,
}

impl StateFlags {
    pub const REQUIRED: Self = Self {
        autogen: false,
        optional: false,
    };
    pub const AUTOGEN: Self = Self {
        autogen: true,
        optional: false,
    };
    pub const OPTIONAL: Self = Self {
        autogen: false,
        optional: true,
    };
}

/// Declaration of one manageable attribute
///
/// `C` is the context handed to munge and generate rules, typically the
/// platform binding that knows how to reach system databases.
pub struct StateDescriptor<C: ?Sized> {
    /// Attribute name as used in configuration
    pub name: &'static str,
    /// Human-readable documentation
    pub description: &'static str,
    pub flags: StateFlags,
    /// Custom normalization; `None` means [`passthrough`]
    pub munge: Option<MungeFn<C>>,
    /// Generation algorithm for `Auto`; `None` leaves `Auto` to the backend
    pub generate: Option<GenerateFn<C>>,
    /// Field name on the native record; defaults to `name`
    pub native_field: Option<&'static str>,
}

impl<C: ?Sized> StateDescriptor<C> {
    /// Native record field this state maps to
    pub fn field(&self) -> &'static str {
        self.native_field.unwrap_or(self.name)
    }

    /// Normalize a raw value for this state
    pub fn munge(&self, raw: &RawValue, ctx: &C) -> Result<PropertyValue> {
        match self.munge {
            Some(rule) => rule(raw, ctx),
            None => passthrough(self.name, raw),
        }
    }

    /// Resolve `Auto` through the generator, if this state has one
    ///
    /// Anything other than `Auto` is returned unchanged.
    pub fn resolve(&self, value: &PropertyValue, ctx: &C) -> Result<PropertyValue> {
        match (value, self.generate) {
            (PropertyValue::Auto, Some(generate)) => generate(ctx),
            _ => Ok(value.clone()),
        }
    }
}

impl<C: ?Sized> fmt::Debug for StateDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("custom_munge", &self.munge.is_some())
            .field("generator", &self.generate.is_some())
            .field("native_field", &self.field())
            .finish()
    }
}

/// Identity normalization used by states without a custom rule
pub fn passthrough(property: &str, raw: &RawValue) -> Result<PropertyValue> {
    if let Some(sentinel) = raw.sentinel() {
        return Ok(sentinel);
    }

    match raw {
        RawValue::Text(s) => Ok(PropertyValue::concrete(s.as_str())),
        RawValue::Integer(n) => Ok(PropertyValue::concrete(*n)),
        RawValue::Symbol(_) => Err(Error::invalid_value(
            property,
            raw,
            "unrecognized symbol",
        )),
    }
}

/// Desired and observed value of one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: &'static str,
    pub desired: PropertyValue,
    /// `None` until the resource has been retrieved
    pub actual: Option<PropertyValue>,
}

impl Property {
    /// Whether the observed value fulfils the desired value
    pub fn is_in_sync(&self) -> bool {
        self.actual
            .as_ref()
            .is_some_and(|actual| self.desired.is_satisfied_by(actual))
    }
}

/// Ordered collection of a resource's properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Desired value of a property
    pub fn desired(&self, name: &str) -> Option<&PropertyValue> {
        self.get(name).map(|p| &p.desired)
    }

    /// Observed value of a property
    pub fn actual(&self, name: &str) -> Option<&PropertyValue> {
        self.get(name).and_then(|p| p.actual.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Set the desired value, replacing an earlier one
    pub fn set_desired(&mut self, name: &'static str, value: PropertyValue) {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(property) => property.desired = value,
            None => self.properties.push(Property {
                name,
                desired: value,
                actual: None,
            }),
        }
    }

    /// Record the observed value of a declared property
    pub fn set_actual(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let property = self
            .properties
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| {
                Error::InternalInvariant(format!("actual value for undeclared property {name}"))
            })?;
        property.actual = Some(value);
        Ok(())
    }

    /// Mark every declared property with the same observed value
    pub fn set_all_actual(&mut self, value: &PropertyValue) {
        for property in &mut self.properties {
            property.actual = Some(value.clone());
        }
    }

    /// Forget all observed values
    pub fn clear_actual(&mut self) {
        for property in &mut self.properties {
            property.actual = None;
        }
    }

    /// Properties whose observed value does not fulfil the desired one
    pub fn out_of_sync(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| !p.is_in_sync())
    }

    /// Reorder to match the declaration order of `descriptors`
    pub fn order_by<C: ?Sized>(&mut self, descriptors: &[StateDescriptor<C>]) {
        self.properties.sort_by_key(|p| {
            descriptors
                .iter()
                .position(|d| d.name == p.name)
                .unwrap_or(usize::MAX)
        });
    }
}

/// Munge every explicitly supplied attribute
///
/// Attributes are processed in declaration order. A name that no
/// descriptor declares is rejected.
pub fn munge_attributes<C: ?Sized>(
    resource: &str,
    descriptors: &[StateDescriptor<C>],
    attributes: &BTreeMap<String, RawValue>,
    ctx: &C,
) -> Result<PropertySet> {
    if let Some(unknown) = attributes
        .keys()
        .find(|key| !descriptors.iter().any(|d| d.name == key.as_str()))
    {
        return Err(Error::UnknownProperty {
            resource: resource.to_string(),
            property: unknown.clone(),
        });
    }

    let mut set = PropertySet::new();
    for descriptor in descriptors {
        if let Some(raw) = attributes.get(descriptor.name) {
            set.set_desired(descriptor.name, descriptor.munge(raw, ctx)?);
        }
    }
    Ok(set)
}

/// Make sure every non-optional state has a desired value
///
/// Missing autogen-capable states receive `Auto`; a missing state that is
/// neither optional nor autogen-capable fails the whole resource. Returns
/// the names of the injected states.
pub fn validate_required<C: ?Sized>(
    resource: &str,
    descriptors: &[StateDescriptor<C>],
    set: &mut PropertySet,
) -> Result<Vec<&'static str>> {
    let mut injected = Vec::new();

    for descriptor in descriptors {
        if set.contains(descriptor.name) || descriptor.flags.optional {
            continue;
        }

        if !descriptor.flags.autogen {
            return Err(Error::MissingRequiredProperty {
                resource: resource.to_string(),
                property: descriptor.name.to_string(),
            });
        }

        set.set_desired(descriptor.name, PropertyValue::Auto);
        injected.push(descriptor.name);
    }

    set.order_by(descriptors);
    Ok(injected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(raw: &RawValue, _ctx: &()) -> Result<PropertyValue> {
        Ok(PropertyValue::concrete(raw.to_string().to_uppercase()))
    }

    fn forty_two(_ctx: &()) -> Result<PropertyValue> {
        Ok(PropertyValue::concrete(42i64))
    }

    static STATES: [StateDescriptor<()>; 3] = [
        StateDescriptor {
            name: "size",
            description: "Generated when missing",
            flags: StateFlags::AUTOGEN,
            munge: None,
            generate: Some(forty_two),
            native_field: None,
        },
        StateDescriptor {
            name: "label",
            description: "Upper-cased",
            flags: StateFlags::OPTIONAL,
            munge: Some(upper),
            generate: None,
            native_field: Some("lbl"),
        },
        StateDescriptor {
            name: "owner",
            description: "Must be given",
            flags: StateFlags::REQUIRED,
            munge: None,
            generate: None,
            native_field: None,
        },
    ];

    fn attrs(pairs: &[(&str, RawValue)]) -> BTreeMap<String, RawValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(
            passthrough("home", &RawValue::text("/home/a")).unwrap(),
            PropertyValue::concrete("/home/a")
        );
        assert_eq!(
            passthrough("home", &RawValue::auto()).unwrap(),
            PropertyValue::Auto
        );
        assert!(matches!(
            passthrough("home", &RawValue::symbol("absent")),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_field_defaults_to_name() {
        assert_eq!(STATES[0].field(), "size");
        assert_eq!(STATES[1].field(), "lbl");
    }

    #[test]
    fn test_munge_uses_custom_rule() {
        let set = munge_attributes(
            "thing[x]",
            &STATES,
            &attrs(&[("label", RawValue::text("abc"))]),
            &(),
        )
        .unwrap();
        assert_eq!(set.desired("label"), Some(&PropertyValue::concrete("ABC")));
        assert_eq!(set.actual("label"), None);
    }

    #[test]
    fn test_munge_rejects_unknown_attribute() {
        let err = munge_attributes(
            "thing[x]",
            &STATES,
            &attrs(&[("color", RawValue::text("red"))]),
            &(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { property, .. } if property == "color"));
    }

    #[test]
    fn test_validate_injects_auto_and_fails_on_required() {
        let mut set = PropertySet::new();
        let err = validate_required("thing[x]", &STATES, &mut set).unwrap_err();
        assert!(
            matches!(err, Error::MissingRequiredProperty { property, .. } if property == "owner")
        );
    }

    #[test]
    fn test_validate_orders_by_declaration() {
        let mut set = munge_attributes(
            "thing[x]",
            &STATES,
            &attrs(&[("owner", RawValue::text("root"))]),
            &(),
        )
        .unwrap();

        let injected = validate_required("thing[x]", &STATES, &mut set).unwrap();
        assert_eq!(injected, vec!["size"]);
        assert!(!set.contains("label"));

        let names: Vec<_> = set.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["size", "owner"]);
        assert_eq!(set.desired("size"), Some(&PropertyValue::Auto));
    }

    #[test]
    fn test_resolve_only_touches_auto() {
        assert_eq!(
            STATES[0].resolve(&PropertyValue::Auto, &()).unwrap(),
            PropertyValue::concrete(42i64)
        );
        assert_eq!(
            STATES[0].resolve(&PropertyValue::concrete(7i64), &()).unwrap(),
            PropertyValue::concrete(7i64)
        );
        assert_eq!(
            STATES[2].resolve(&PropertyValue::Auto, &()).unwrap(),
            PropertyValue::Auto
        );
    }

    #[test]
    fn test_out_of_sync() {
        let mut set = PropertySet::new();
        set.set_desired("size", PropertyValue::concrete(1i64));
        set.set_desired("owner", PropertyValue::Auto);
        assert_eq!(set.out_of_sync().count(), 2);

        set.set_actual("size", PropertyValue::concrete(1i64)).unwrap();
        set.set_actual("owner", PropertyValue::concrete("root")).unwrap();
        assert_eq!(set.out_of_sync().count(), 0);

        set.set_all_actual(&PropertyValue::NotFound);
        assert_eq!(set.out_of_sync().count(), 2);
        assert!(set.set_actual("color", PropertyValue::NotFound).is_err());
    }
}
