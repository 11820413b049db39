use crate::error::PrimitiveError;
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ulid::Ulid;

macro_rules! ulid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Deref, Display, Eq, PartialEq, Ord, PartialOrd, Hash,
            Serialize, Deserialize,
        )]
        pub struct $name(Ulid);

        impl $name {
            #[must_use]
            pub fn generate() -> Self {
                Self(Ulid::new())
            }

            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            #[must_use]
            pub const fn into_ulid(self) -> Ulid {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = PrimitiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s)
                    .map(Self)
                    .map_err(|_| PrimitiveError::InvalidId(s.to_string()))
            }
        }
    };
}

ulid_id!(ProviderId, "Identity of a resource provider.");
ulid_id!(ConsumerId, "Identity of an allocation consumer.");
ulid_id!(AggregateId, "Identity of a provider aggregate.");
