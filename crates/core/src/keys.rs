//! Validated string keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum allowed length for a [`ServiceName`].
const SERVICE_NAME_MAX_LEN: usize = 128;

/// Errors from constructing a [`ServiceName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceNameError {
    /// The input was empty or contained only whitespace.
    #[error("service name cannot be empty or whitespace")]
    Empty,
    /// The name contains control characters.
    #[error("service name contains control characters")]
    ControlCharacters,
    /// The trimmed name exceeds [`SERVICE_NAME_MAX_LEN`] characters.
    #[error("service name exceeds maximum length of {SERVICE_NAME_MAX_LEN} characters")]
    TooLong,
}

/// Human-readable label of a service, e.g. `OrderService`.
///
/// Identifies a node in its configuration; events carry the name as a plain
/// string. Not unique: every replica of a service shares the same name. Leading and
/// trailing whitespace is trimmed; case is preserved.
///
/// # Examples
///
/// ```
/// use beacon_core::ServiceName;
///
/// let name: ServiceName = "  OrderService ".parse().unwrap();
/// assert_eq!(name.as_str(), "OrderService");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Create a new `ServiceName`, trimming and validating the input.
    pub fn new(raw: &str) -> Result<Self, ServiceNameError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ServiceNameError::Empty);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ServiceNameError::ControlCharacters);
        }
        if trimmed.chars().count() > SERVICE_NAME_MAX_LEN {
            return Err(ServiceNameError::TooLong);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Return the inner string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ServiceName {
    type Err = ServiceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ServiceName {
    type Error = ServiceNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = ServiceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ServiceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ServiceName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
