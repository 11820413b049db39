use crate::{
    error::{Error, ErrorOrigin},
    model::{Allocation, Consumer, Inventory, Provider},
    store::{Mutation, StoreError, TransactionalStore},
};
use placement_primitives::{ConsumerId, ProviderId, ResourceClass};
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

type InventoryKey = (ProviderId, ResourceClass);
type AllocationKey = (ConsumerId, ProviderId, ResourceClass);

#[derive(Default)]
struct MemState {
    providers: BTreeMap<ProviderId, Provider>,
    inventories: BTreeMap<InventoryKey, Inventory>,
    consumers: BTreeMap<ConsumerId, Consumer>,
    allocations: BTreeMap<AllocationKey, Allocation>,
    marker: Option<crate::commit::CommitMarker>,
}

///
/// MemStore
/// Reference `TransactionalStore` implementation backed by ordered
/// in-process maps behind a single mutex. Each public method takes the
/// lock once and releases it before returning; it is never held across an
/// await or callback boundary.
///

#[derive(Default)]
pub struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemState>, Error> {
        self.state.lock().map_err(|_| {
            let low_level = StoreError::Corrupt {
                message: "store mutex poisoned by a panicking holder".into(),
            };
            Error::invariant_violation(ErrorOrigin::Store, low_level.to_string())
        })
    }
}

impl TransactionalStore for MemStore {
    fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>, Error> {
        Ok(self.lock()?.providers.get(&id).cloned())
    }

    fn list_providers(&self) -> Result<Vec<Provider>, Error> {
        Ok(self.lock()?.providers.values().cloned().collect())
    }

    fn get_inventory(
        &self,
        provider_id: ProviderId,
        resource_class: &ResourceClass,
    ) -> Result<Option<Inventory>, Error> {
        Ok(self
            .lock()?
            .inventories
            .get(&(provider_id, resource_class.clone()))
            .cloned())
    }

    fn list_inventories_for_class(
        &self,
        resource_class: &ResourceClass,
    ) -> Result<Vec<Inventory>, Error> {
        Ok(self
            .lock()?
            .inventories
            .values()
            .filter(|inv| &inv.resource_class == resource_class)
            .cloned()
            .collect())
    }

    fn list_inventories_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Inventory>, Error> {
        Ok(self
            .lock()?
            .inventories
            .values()
            .filter(|inv| inv.provider_id == provider_id)
            .cloned()
            .collect())
    }

    fn get_consumer(&self, id: ConsumerId) -> Result<Option<Consumer>, Error> {
        Ok(self.lock()?.consumers.get(&id).cloned())
    }

    fn allocations_for_consumer(&self, id: ConsumerId) -> Result<Vec<Allocation>, Error> {
        Ok(self
            .lock()?
            .allocations
            .values()
            .filter(|a| a.consumer_id == id)
            .cloned()
            .collect())
    }

    fn allocations_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Allocation>, Error> {
        Ok(self
            .lock()?
            .allocations
            .values()
            .filter(|a| a.provider_id == provider_id)
            .cloned()
            .collect())
    }

    fn allocations_for_provider_class(
        &self,
        provider_id: ProviderId,
        resource_class: &ResourceClass,
    ) -> Result<Vec<Allocation>, Error> {
        Ok(self
            .lock()?
            .allocations
            .values()
            .filter(|a| a.provider_id == provider_id && &a.resource_class == resource_class)
            .cloned()
            .collect())
    }

    fn apply(&self, mutations: &[Mutation]) -> Result<(), Error> {
        let mut state = self.lock()?;
        for mutation in mutations {
            match mutation.clone() {
                Mutation::PutProvider(p) => {
                    state.providers.insert(p.id, *p);
                }
                Mutation::DeleteProvider(id) => {
                    state.providers.remove(&id);
                }
                Mutation::PutInventory(inv) => {
                    state
                        .inventories
                        .insert((inv.provider_id, inv.resource_class.clone()), *inv);
                }
                Mutation::DeleteInventory {
                    provider_id,
                    resource_class,
                } => {
                    state.inventories.remove(&(provider_id, resource_class));
                }
                Mutation::PutConsumer(c) => {
                    state.consumers.insert(c.id, *c);
                }
                Mutation::DeleteConsumer(id) => {
                    state.consumers.remove(&id);
                }
                Mutation::PutAllocation(a) => {
                    state.allocations.insert(
                        (a.consumer_id, a.provider_id, a.resource_class.clone()),
                        *a,
                    );
                }
                Mutation::DeleteAllocation {
                    consumer_id,
                    provider_id,
                    resource_class,
                } => {
                    state
                        .allocations
                        .remove(&(consumer_id, provider_id, resource_class));
                }
            }
        }
        Ok(())
    }

    fn persist_marker(&self, marker: &crate::commit::CommitMarker) -> Result<(), Error> {
        let mut state = self.lock()?;
        if state.marker.is_some() {
            return Err(Error::invariant_violation(
                ErrorOrigin::Store,
                "commit marker already present before begin",
            ));
        }
        state.marker = Some(marker.clone());
        Ok(())
    }

    fn load_marker(&self) -> Result<Option<crate::commit::CommitMarker>, Error> {
        Ok(self.lock()?.marker.clone())
    }

    fn clear_marker(&self) -> Result<(), Error> {
        self.lock()?.marker = None;
        Ok(())
    }
}
