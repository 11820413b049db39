use crate::{error::PrimitiveError, resource_class::validate_symbol};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

///
/// TraitName
/// A symbolic capability tag such as `COMPUTE_VOLUME_MULTI_ATTACH` or `CUSTOM_HW_FPGA`.
///

#[derive(Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraitName(String);

impl TraitName {
    pub fn new(name: impl Into<String>) -> Result<Self, PrimitiveError> {
        let name = name.into();
        validate_symbol(&name, PrimitiveError::EmptyTraitName, PrimitiveError::InvalidTraitName)?;
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

    /// Validate that a vendor-defined trait carries the required `CUSTOM_` prefix.
    pub fn require_custom(&self) -> Result<(), PrimitiveError> {
        if self.is_custom() {
            Ok(())
        } else {
            Err(PrimitiveError::CustomTraitMissingPrefix(self.0.clone()))
        }
    }
}

impl FromStr for TraitName {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TraitName {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TraitName> for String {
    fn from(value: TraitName) -> Self {
        value.0
    }
}
