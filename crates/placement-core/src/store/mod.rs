//! Persistence boundary. The solver and writer never touch storage directly;
//! they go through `TransactionalStore`, so the engine stays agnostic to
//! whatever durable store an embedding service chooses.

mod mem;
pub mod error;

pub use error::StoreError;
pub use mem::MemStore;

use crate::{
    error::Error,
    model::{Allocation, Consumer, Inventory, Provider},
};
use placement_primitives::{ConsumerId, ProviderId, ResourceClass};

///
/// Mutation
/// One row-level change. A commit applies a batch of these atomically;
/// this is the vocabulary `CommitMarker` (see `crate::commit`) is built from.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[remain::sorted]
pub enum Mutation {
    DeleteAllocation {
        consumer_id: ConsumerId,
        provider_id: ProviderId,
        resource_class: ResourceClass,
    },
    DeleteConsumer(ConsumerId),
    DeleteInventory {
        provider_id: ProviderId,
        resource_class: ResourceClass,
    },
    DeleteProvider(ProviderId),
    PutAllocation(Box<Allocation>),
    PutConsumer(Box<Consumer>),
    PutInventory(Box<Inventory>),
    PutProvider(Box<Provider>),
}

///
/// TransactionalStore
/// The sole shared mutable resource (see concurrency model). Every mutating
/// method applies its batch as one serializable transaction; readers never
/// block writers or each other for longer than a single row access.
///

pub trait TransactionalStore: Send + Sync {
    fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>, Error>;
    fn list_providers(&self) -> Result<Vec<Provider>, Error>;

    fn get_inventory(
        &self,
        provider_id: ProviderId,
        resource_class: &ResourceClass,
    ) -> Result<Option<Inventory>, Error>;
    fn list_inventories_for_class(
        &self,
        resource_class: &ResourceClass,
    ) -> Result<Vec<Inventory>, Error>;
    fn list_inventories_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Inventory>, Error>;

    fn get_consumer(&self, id: ConsumerId) -> Result<Option<Consumer>, Error>;

    fn allocations_for_consumer(&self, id: ConsumerId) -> Result<Vec<Allocation>, Error>;
    fn allocations_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Allocation>, Error>;
    fn allocations_for_provider_class(
        &self,
        provider_id: ProviderId,
        resource_class: &ResourceClass,
    ) -> Result<Vec<Allocation>, Error>;

    /// Apply a batch of mutations as one transaction. Implementations MUST
    /// apply all-or-nothing; partial application on error is an invariant
    /// violation in the caller.
    fn apply(&self, mutations: &[Mutation]) -> Result<(), Error>;

    /// Persist a commit marker describing a write in flight. Used by
    /// `crate::commit` to make multi-row writes crash-recoverable.
    fn persist_marker(&self, marker: &crate::commit::CommitMarker) -> Result<(), Error>;

    /// Load whatever commit marker is currently persisted, if any.
    fn load_marker(&self) -> Result<Option<crate::commit::CommitMarker>, Error>;

    /// Clear the persisted commit marker.
    fn clear_marker(&self) -> Result<(), Error>;
}
