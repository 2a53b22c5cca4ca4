//! Property values
//!
//! Raw attribute input arrives as [`RawValue`] and is normalized ("munged")
//! into a [`PropertyValue`] by the owning state descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol requesting a generated default
pub const AUTO_SYMBOL: &str = "auto";

/// Symbol marking a backing object that does not exist
pub const NOTFOUND_SYMBOL: &str = "notfound";

/// A concrete attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Text(String),
}

impl Scalar {
    /// Integer content, if any
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Text content, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Integer(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Canonical value of a managed property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    /// A real value
    Concrete(Scalar),
    /// Compute a default at sync time
    Auto,
    /// The backing object does not exist
    NotFound,
}

impl PropertyValue {
    /// Build a concrete value
    pub fn concrete(value: impl Into<Scalar>) -> Self {
        Self::Concrete(value.into())
    }

    /// The concrete scalar, if any
    pub fn as_concrete(&self) -> Option<&Scalar> {
        match self {
            Self::Concrete(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether an observed value already fulfils this desired value
    ///
    /// `Auto` accepts whatever concrete value the platform picked, but an
    /// unresolved `Auto` is not an observation; `NotFound` never fulfils
    /// anything.
    pub fn is_satisfied_by(&self, actual: &PropertyValue) -> bool {
        match (self, actual) {
            (_, Self::NotFound) => false,
            (Self::Auto, Self::Concrete(_)) => true,
            (Self::Auto, Self::Auto) => false,
            (desired, actual) => desired == actual,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(s) => write!(f, "{s}"),
            Self::Auto => write!(f, ":{AUTO_SYMBOL}"),
            Self::NotFound => write!(f, ":{NOTFOUND_SYMBOL}"),
        }
    }
}

/// Unnormalized attribute value as supplied by configuration
///
/// In serialized form a string starting with `:` is a symbol
/// (`":auto"`), every other string is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawInput", into = "RawInput")]
pub enum RawValue {
    Text(String),
    Integer(i64),
    Symbol(String),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        Self::Symbol(s.into())
    }

    /// The `auto` sentinel
    pub fn auto() -> Self {
        Self::Symbol(AUTO_SYMBOL.to_string())
    }

    /// The `notfound` sentinel
    pub fn not_found() -> Self {
        Self::Symbol(NOTFOUND_SYMBOL.to_string())
    }

    /// Sentinel carried by this value, if it is one of the recognized symbols
    pub fn sentinel(&self) -> Option<PropertyValue> {
        match self {
            Self::Symbol(s) if s == AUTO_SYMBOL => Some(PropertyValue::Auto),
            Self::Symbol(s) if s == NOTFOUND_SYMBOL => Some(PropertyValue::NotFound),
            _ => None,
        }
    }

    /// Digit-only text parsed as an integer
    pub fn digits(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Symbol(s) => write!(f, ":{s}"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawInput {
    Integer(i64),
    Text(String),
}

impl From<RawInput> for RawValue {
    fn from(input: RawInput) -> Self {
        match input {
            RawInput::Integer(n) => Self::Integer(n),
            RawInput::Text(s) => match s.strip_prefix(':') {
                Some(symbol) if !symbol.is_empty() => Self::Symbol(symbol.to_string()),
                _ => Self::Text(s),
            },
        }
    }
}

impl From<RawValue> for RawInput {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Integer(n) => Self::Integer(n),
            RawValue::Text(s) => Self::Text(s),
            RawValue::Symbol(s) => Self::Text(format!(":{s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_satisfied_by_concrete_only() {
        assert!(PropertyValue::Auto.is_satisfied_by(&PropertyValue::concrete(42i64)));
        assert!(!PropertyValue::Auto.is_satisfied_by(&PropertyValue::NotFound));
        assert!(!PropertyValue::Auto.is_satisfied_by(&PropertyValue::Auto));
    }

    #[test]
    fn test_unresolved_auto_stays_pending() {
        let mut set = crate::PropertySet::new();
        set.set_desired("home", PropertyValue::Auto);
        set.set_actual("home", PropertyValue::Auto).unwrap();
        assert_eq!(set.out_of_sync().count(), 1);
    }

    #[test]
    fn test_concrete_satisfaction_is_equality() {
        let desired = PropertyValue::concrete("/bin/zsh");
        assert!(desired.is_satisfied_by(&PropertyValue::concrete("/bin/zsh")));
        assert!(!desired.is_satisfied_by(&PropertyValue::concrete("/bin/bash")));
        assert!(!desired.is_satisfied_by(&PropertyValue::NotFound));
    }

    #[test]
    fn test_sentinel_detection() {
        assert_eq!(RawValue::auto().sentinel(), Some(PropertyValue::Auto));
        assert_eq!(RawValue::not_found().sentinel(), Some(PropertyValue::NotFound));
        assert_eq!(RawValue::symbol("absent").sentinel(), None);
        assert_eq!(RawValue::text("auto").sentinel(), None);
    }

    #[test]
    fn test_digits() {
        assert_eq!(RawValue::text("1001").digits(), Some("1001"));
        assert_eq!(RawValue::text("").digits(), None);
        assert_eq!(RawValue::text("-5").digits(), None);
        assert_eq!(RawValue::text("10a").digits(), None);
        assert_eq!(RawValue::Integer(7).digits(), None);
    }

    #[test]
    fn test_raw_input_symbol_prefix() {
        assert_eq!(
            RawValue::from(RawInput::Text(":auto".into())),
            RawValue::auto()
        );
        assert_eq!(
            RawValue::from(RawInput::Text("/bin/sh".into())),
            RawValue::text("/bin/sh")
        );
        assert_eq!(RawValue::from(RawInput::Text(":".into())), RawValue::text(":"));
        assert_eq!(RawValue::from(RawInput::Integer(500)), RawValue::Integer(500));
    }

    #[test]
    fn test_deserialize_raw_values() {
        let values: Vec<RawValue> = serde_json::from_str(r#"[":auto", "wheel", 500]"#).unwrap();
        assert_eq!(
            values,
            vec![RawValue::auto(), RawValue::text("wheel"), RawValue::Integer(500)]
        );
        assert_eq!(
            serde_json::to_string(&RawValue::not_found()).unwrap(),
            r#"":notfound""#
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::Auto.to_string(), ":auto");
        assert_eq!(PropertyValue::concrete(12i64).to_string(), "12");
        assert_eq!(RawValue::symbol("absent").to_string(), ":absent");
    }
}
