//! Scalar identifiers and string-validation primitives shared across placement crates.
#![warn(unreachable_pub)]

extern crate self as placement_primitives;

pub mod error;
pub mod ids;
pub mod resource_class;
pub mod trait_name;

pub use error::PrimitiveError;
pub use ids::{AggregateId, ConsumerId, ProviderId};
pub use resource_class::ResourceClass;
pub use trait_name::TraitName;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
///

pub mod prelude {
    pub use crate::{
        ids::{AggregateId, ConsumerId, ProviderId},
        resource_class::ResourceClass,
        trait_name::TraitName,
    };
}
