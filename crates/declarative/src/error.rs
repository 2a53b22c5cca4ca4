//! Error types for resource construction and reconciliation.
//!
//! All errors are raised synchronously where they are detected and are
//! never retried here. An object missing on the system is not an error;
//! retrieval reports it as [`PropertyValue::NotFound`](crate::PropertyValue).

use thiserror::Error;

/// Boxed error produced by a platform backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building, validating or syncing a resource.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw value could not be normalized
    #[error("invalid value '{value}' for {property}: {reason}")]
    InvalidValue {
        /// Property being set
        property: String,
        /// Raw value as supplied
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A name could not be resolved against a system database
    #[error("could not find {property} '{value}': {cause}")]
    Lookup {
        /// Property being set
        property: String,
        /// Name that was looked up
        value: String,
        /// Underlying failure
        cause: String,
    },

    /// A required property was not supplied and cannot be generated
    #[error("{resource} requires a value for {property}")]
    MissingRequiredProperty {
        /// Resource identity
        resource: String,
        /// Missing property
        property: String,
    },

    /// An attribute name that the resource type does not declare
    #[error("{resource} has no property named {property}")]
    UnknownProperty {
        /// Resource identity
        resource: String,
        /// Offending attribute name
        property: String,
    },

    /// A sentinel or state reached code that cannot handle it
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    /// The platform backend failed
    #[error("backend failed for {resource}: {source}")]
    Backend {
        /// Resource identity
        resource: String,
        /// Backend error
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidValue`]
    pub fn invalid_value(
        property: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            property: property.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::Backend`]
    pub fn backend(resource: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// Whether the error stems from user input rather than the system
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidValue { .. }
                | Self::Lookup { .. }
                | Self::MissingRequiredProperty { .. }
                | Self::UnknownProperty { .. }
        )
    }
}

/// Result type for declarative operations.
pub type Result<T> = std::result::Result<T, Error>;
