use crate::error::PrimitiveError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

///
/// ResourceClass
/// A symbolic resource-class name such as `VCPU`, `MEMORY_MB`, `CUSTOM_FPGA`.
/// Standard classes are upper snake case; vendor classes carry a `CUSTOM_` prefix.
///

#[derive(Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceClass(String);

impl ResourceClass {
    pub fn new(name: impl Into<String>) -> Result<Self, PrimitiveError> {
        let name = name.into();
        validate_symbol(&name, PrimitiveError::EmptyResourceClass, PrimitiveError::InvalidResourceClass)?;
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.0.starts_with("CUSTOM_")
    }
}

impl FromStr for ResourceClass {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceClass {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceClass> for String {
    fn from(value: ResourceClass) -> Self {
        value.0
    }
}

/// Shared symbol validation used by `ResourceClass` and `TraitName`.
///
/// Names must be non-empty ASCII upper snake case: `[A-Z][A-Z0-9_]*`.
pub(crate) fn validate_symbol(
    name: &str,
    on_empty: impl Fn(String) -> PrimitiveError,
    on_invalid: impl Fn(String) -> PrimitiveError,
) -> Result<(), PrimitiveError> {
    if name.is_empty() {
        return Err(on_empty(name.to_string()));
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    let rest_ok = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if !first_ok || !rest_ok {
        return Err(on_invalid(name.to_string()));
    }
    Ok(())
}
