use crate::{error::Error, store::TransactionalStore};
use placement_primitives::{ProviderId, ResourceClass};

///
/// CapacityView
/// For a resource class, answers which providers can currently assign a
/// given amount. Currently-allocated is read live from the store; the
/// writer re-validates under transaction before committing (§4.G).
///

pub struct CapacityView<'s> {
    store: &'s dyn TransactionalStore,
}

impl<'s> CapacityView<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn TransactionalStore) -> Self {
        Self { store }
    }

    /// Providers that can assign exactly `amount` of `resource_class` right now,
    /// in ascending provider-id order.
    pub fn assignable_providers(
        &self,
        resource_class: &ResourceClass,
        amount: u32,
    ) -> Result<Vec<ProviderId>, Error> {
        let mut out = Vec::new();
        for inv in self.store.list_inventories_for_class(resource_class)? {
            let allocated: u32 = self
                .store
                .allocations_for_provider_class(inv.provider_id, resource_class)?
                .iter()
                .map(|a| a.used)
                .sum();
            if inv.is_assignable(amount, allocated) {
                out.push(inv.provider_id);
            }
        }
        out.sort();
        Ok(out)
    }
}
