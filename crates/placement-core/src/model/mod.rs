//! Domain entities: providers, inventories, traits, aggregates, consumers, allocations.

pub mod allocation;
pub mod consumer;
pub mod inventory;
pub mod provider;

pub use allocation::Allocation;
pub use consumer::Consumer;
pub use inventory::Inventory;
pub use provider::Provider;

/// Generation token used for optimistic concurrency on providers and consumers.
///
/// Strictly increasing; a writer observing generation `g` must CAS against `g`.
pub type Generation = u64;
