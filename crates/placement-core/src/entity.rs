//! Entity Store (§4.A): CRUD with optimistic-generation concurrency for
//! providers, inventories, and their trait/aggregate membership. Allocation
//! and consumer bundle writes go through `crate::writer::AllocationWriter`
//! instead; this module owns everything else in the data model.

use crate::{
    commit::{self, CommitKind, CommitMarker},
    error::{Error, ErrorOrigin},
    model::{Generation, Inventory, Provider},
    store::{Mutation, TransactionalStore},
};
use placement_primitives::{AggregateId, ProviderId, ResourceClass, TraitName};
use std::collections::{BTreeMap, BTreeSet};

///
/// EntityStore
/// Thin, narrow-verb facade over `TransactionalStore` for everything that
/// isn't an allocation bundle: providers (including tree reparenting),
/// inventories, and the trait/aggregate sets a provider carries. Every
/// mutating method is one commit-marker-guarded transaction (§4.A "All
/// multi-row writes execute in a single serializable transaction").
///

pub struct EntityStore<'s> {
    store: &'s dyn TransactionalStore,
}

impl<'s> EntityStore<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn TransactionalStore) -> Self {
        Self { store }
    }

    // --- Providers ---------------------------------------------------

    pub fn get_provider(&self, id: ProviderId) -> Result<Provider, Error> {
        self.store
            .get_provider(id)?
            .ok_or_else(|| Error::not_found(ErrorOrigin::Entity, format!("provider not found: {id}")))
    }

    pub fn list_providers(&self) -> Result<Vec<Provider>, Error> {
        self.store.list_providers()
    }

    /// Create a new root provider (no parent).
    pub fn create_root_provider(&self, name: impl Into<String>) -> Result<Provider, Error> {
        let provider = Provider::root(ProviderId::generate(), name);
        self.commit_one(Mutation::PutProvider(Box::new(provider.clone())))?;
        Ok(provider)
    }

    /// Create a new provider as a child of `parent_id`, inheriting its root.
    pub fn create_child_provider(
        &self,
        name: impl Into<String>,
        parent_id: ProviderId,
    ) -> Result<Provider, Error> {
        let parent = self.get_provider(parent_id)?;
        let provider = Provider {
            id: ProviderId::generate(),
            name: name.into(),
            parent_id: Some(parent_id),
            root_id: parent.root_id,
            generation: 0,
            traits: BTreeSet::new(),
            aggregates: BTreeSet::new(),
        };
        self.commit_one(Mutation::PutProvider(Box::new(provider.clone())))?;
        Ok(provider)
    }

    /// Replace a provider's trait set wholesale, bumping its generation.
    pub fn set_traits(
        &self,
        id: ProviderId,
        traits: BTreeSet<TraitName>,
        expected_generation: Generation,
    ) -> Result<Provider, Error> {
        let mut provider = self.cas_load_provider(id, expected_generation)?;
        provider.traits = traits;
        provider.generation += 1;
        self.commit_one(Mutation::PutProvider(Box::new(provider.clone())))?;
        Ok(provider)
    }

    /// Replace a provider's aggregate membership wholesale, bumping its generation.
    pub fn set_aggregates(
        &self,
        id: ProviderId,
        aggregates: BTreeSet<AggregateId>,
        expected_generation: Generation,
    ) -> Result<Provider, Error> {
        let mut provider = self.cas_load_provider(id, expected_generation)?;
        provider.aggregates = aggregates;
        provider.generation += 1;
        self.commit_one(Mutation::PutProvider(Box::new(provider.clone())))?;
        Ok(provider)
    }

    /// Move `id` under `new_parent`, or detach it to become a root when
    /// `new_parent` is `None`. Legal only within the same root, or when
    /// detaching to become a new root (§3: "a provider may be moved only to
    /// a provider with the same root, or reparented to become a root").
    /// Detaching cascades `root_id` to the whole moved subtree in this one
    /// transaction (§3 invariant 3).
    pub fn reparent_provider(
        &self,
        id: ProviderId,
        new_parent: Option<ProviderId>,
        expected_generation: Generation,
    ) -> Result<(), Error> {
        let providers = self.store.list_providers()?;
        let by_id: BTreeMap<ProviderId, &Provider> = providers.iter().map(|p| (p.id, p)).collect();

        let provider = by_id
            .get(&id)
            .copied()
            .ok_or_else(|| Error::not_found(ErrorOrigin::Entity, format!("provider not found: {id}")))?
            .clone();
        if provider.generation != expected_generation {
            return Err(Error::conflict(
                ErrorOrigin::Entity,
                format!("provider {id} generation mismatch"),
            ));
        }

        let mutations = match new_parent {
            None => self.reparent_to_root(&providers, &provider),
            Some(parent_id) => {
                if parent_id == id {
                    return Err(Error::bad_request(
                        ErrorOrigin::Entity,
                        format!("provider {id} cannot be its own parent"),
                    ));
                }
                let parent = by_id.get(&parent_id).copied().ok_or_else(|| {
                    Error::not_found(ErrorOrigin::Entity, format!("parent provider not found: {parent_id}"))
                })?;
                if self.is_ancestor(&by_id, id, parent_id) {
                    return Err(Error::bad_request(
                        ErrorOrigin::Entity,
                        format!("reparenting {id} under {parent_id} would create a cycle"),
                    ));
                }
                if parent.root_id != provider.root_id {
                    return Err(Error::bad_request(
                        ErrorOrigin::Entity,
                        "a provider may be moved only within its own tree, or detached to become a root",
                    ));
                }
                let mut moved = provider.clone();
                moved.parent_id = Some(parent_id);
                moved.generation += 1;
                vec![Mutation::PutProvider(Box::new(moved))]
            }
        };

        if mutations.is_empty() {
            return Ok(());
        }
        self.commit(mutations)
    }

    /// Delete a provider. Only legal when it has no children and holds no
    /// allocations (§3 Lifecycles).
    pub fn delete_provider(&self, id: ProviderId, expected_generation: Generation) -> Result<(), Error> {
        self.cas_load_provider(id, expected_generation)?;

        if self.store.list_providers()?.iter().any(|p| p.parent_id == Some(id)) {
            return Err(Error::invariant_violation(
                ErrorOrigin::Entity,
                format!("provider {id} still has children"),
            ));
        }
        if !self.store.allocations_for_provider(id)?.is_empty() {
            return Err(Error::inventory_inuse(
                ErrorOrigin::Entity,
                format!("provider {id} still holds allocations"),
            ));
        }

        let mut mutations: Vec<Mutation> = self
            .store
            .list_inventories_for_provider(id)?
            .into_iter()
            .map(|inv| Mutation::DeleteInventory {
                provider_id: inv.provider_id,
                resource_class: inv.resource_class,
            })
            .collect();
        mutations.push(Mutation::DeleteProvider(id));
        self.commit(mutations)
    }

    // --- Inventories ---------------------------------------------------

    pub fn get_inventory(&self, provider_id: ProviderId, rc: &ResourceClass) -> Result<Inventory, Error> {
        self.store.get_inventory(provider_id, rc)?.ok_or_else(|| {
            Error::not_found(
                ErrorOrigin::Entity,
                format!("inventory not found for provider {provider_id} class {rc}"),
            )
        })
    }

    /// Create or replace an inventory row. Bumps the owning provider's
    /// generation; rejected with `InvariantViolation` when the new capacity
    /// would fall below what is already allocated (§3 invariant 1).
    pub fn put_inventory(&self, inventory: Inventory, expected_provider_generation: Generation) -> Result<(), Error> {
        let mut provider = self.cas_load_provider(inventory.provider_id, expected_provider_generation)?;

        let allocated: u32 = self
            .store
            .allocations_for_provider_class(inventory.provider_id, &inventory.resource_class)?
            .iter()
            .map(|a| a.used)
            .sum();
        if allocated > inventory.capacity() {
            return Err(Error::invariant_violation(
                ErrorOrigin::Entity,
                format!(
                    "inventory for provider {} class {} would drop below {allocated} already allocated",
                    inventory.provider_id, inventory.resource_class
                ),
            ));
        }

        provider.generation += 1;
        self.commit(vec![
            Mutation::PutInventory(Box::new(inventory)),
            Mutation::PutProvider(Box::new(provider)),
        ])
    }

    /// Remove an inventory row. Only legal when it carries no allocations.
    pub fn delete_inventory(
        &self,
        provider_id: ProviderId,
        resource_class: &ResourceClass,
        expected_provider_generation: Generation,
    ) -> Result<(), Error> {
        let mut provider = self.cas_load_provider(provider_id, expected_provider_generation)?;
        self.get_inventory(provider_id, resource_class)?;

        if !self
            .store
            .allocations_for_provider_class(provider_id, resource_class)?
            .is_empty()
        {
            return Err(Error::inventory_inuse(
                ErrorOrigin::Entity,
                format!("inventory for provider {provider_id} class {resource_class} still has allocations"),
            ));
        }

        provider.generation += 1;
        self.commit(vec![
            Mutation::DeleteInventory {
                provider_id,
                resource_class: resource_class.clone(),
            },
            Mutation::PutProvider(Box::new(provider)),
        ])
    }

    // --- helpers ---------------------------------------------------

    fn cas_load_provider(&self, id: ProviderId, expected_generation: Generation) -> Result<Provider, Error> {
        let provider = self.get_provider(id)?;
        if provider.generation != expected_generation {
            return Err(Error::conflict(ErrorOrigin::Entity, format!("provider {id} generation mismatch")));
        }
        Ok(provider)
    }

    /// Whether `ancestor` appears in `of`'s parent chain.
    fn is_ancestor(&self, by_id: &BTreeMap<ProviderId, &Provider>, ancestor: ProviderId, of: ProviderId) -> bool {
        let mut cur = by_id.get(&of).and_then(|p| p.parent_id);
        while let Some(pid) = cur {
            if pid == ancestor {
                return true;
            }
            cur = by_id.get(&pid).and_then(|p| p.parent_id);
        }
        false
    }

    /// Detach `provider` to become a new root, cascading `root_id` across
    /// its whole subtree in the returned mutation batch. Empty when
    /// `provider` is already a root (a no-op move).
    fn reparent_to_root(&self, providers: &[Provider], provider: &Provider) -> Vec<Mutation> {
        if provider.is_root() {
            return Vec::new();
        }

        let mut children_of: BTreeMap<ProviderId, Vec<ProviderId>> = BTreeMap::new();
        for p in providers {
            if let Some(parent_id) = p.parent_id {
                children_of.entry(parent_id).or_default().push(p.id);
            }
        }
        let by_id: BTreeMap<ProviderId, &Provider> = providers.iter().map(|p| (p.id, p)).collect();

        let mut moved = provider.clone();
        moved.parent_id = None;
        moved.root_id = provider.id;
        moved.generation += 1;
        let mut mutations = vec![Mutation::PutProvider(Box::new(moved))];

        let mut stack = children_of.get(&provider.id).cloned().unwrap_or_default();
        while let Some(pid) = stack.pop() {
            if let Some(child) = by_id.get(&pid) {
                let mut updated = (*child).clone();
                updated.root_id = provider.id;
                mutations.push(Mutation::PutProvider(Box::new(updated)));
            }
            if let Some(grandchildren) = children_of.get(&pid) {
                stack.extend(grandchildren.iter().copied());
            }
        }
        mutations
    }

    fn commit_one(&self, mutation: Mutation) -> Result<(), Error> {
        self.commit(vec![mutation])
    }

    fn commit(&self, mutations: Vec<Mutation>) -> Result<(), Error> {
        commit::recover(self.store)?;
        let marker = CommitMarker::new(CommitKind::EntityWrite, mutations);
        let guard = commit::begin_commit(self.store, marker)?;
        commit::finish_commit(self.store, guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn inventory(provider_id: ProviderId, rc: &str, total: u32) -> Inventory {
        Inventory {
            provider_id,
            resource_class: ResourceClass::new(rc).unwrap(),
            total,
            reserved: 0,
            min_unit: 1,
            max_unit: total,
            step_size: 1,
            allocation_ratio: 1.0,
        }
    }

    #[test]
    fn create_child_inherits_root_and_generation_zero() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("numa0").unwrap();
        let child = entities.create_child_provider("fpga0", root.id).unwrap();
        assert_eq!(child.root_id, root.id);
        assert_eq!(child.generation, 0);
    }

    #[test]
    fn set_traits_bumps_generation_and_rejects_stale_cas() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("numa0").unwrap();
        let traits = BTreeSet::from([TraitName::new("CUSTOM_FPGA").unwrap()]);

        let updated = entities.set_traits(root.id, traits.clone(), 0).unwrap();
        assert_eq!(updated.generation, 1);
        assert_eq!(updated.traits, traits);

        let err = entities.set_traits(root.id, traits, 0).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn reparent_within_same_root_succeeds_across_tree() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();
        let numa0 = entities.create_child_provider("numa0", root.id).unwrap();
        let numa1 = entities.create_child_provider("numa1", root.id).unwrap();
        let fpga = entities.create_child_provider("fpga0", numa0.id).unwrap();

        entities.reparent_provider(fpga.id, Some(numa1.id), 0).unwrap();
        let moved = entities.get_provider(fpga.id).unwrap();
        assert_eq!(moved.parent_id, Some(numa1.id));
        assert_eq!(moved.root_id, root.id);
        assert_eq!(moved.generation, 1);
    }

    #[test]
    fn reparent_across_different_roots_is_rejected() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root_a = entities.create_root_provider("host-a").unwrap();
        let root_b = entities.create_root_provider("host-b").unwrap();

        let err = entities.reparent_provider(root_a.id, Some(root_b.id), 0).unwrap_err();
        assert!(!err.is_conflict() && !err.is_not_found());
    }

    #[test]
    fn reparent_to_root_cascades_root_id_to_descendants() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();
        let numa0 = entities.create_child_provider("numa0", root.id).unwrap();
        let fpga = entities.create_child_provider("fpga0", numa0.id).unwrap();

        entities.reparent_provider(numa0.id, None, 0).unwrap();

        let new_numa0 = entities.get_provider(numa0.id).unwrap();
        let new_fpga = entities.get_provider(fpga.id).unwrap();
        assert!(new_numa0.is_root());
        assert_eq!(new_numa0.root_id, numa0.id);
        assert_eq!(new_fpga.root_id, numa0.id);
    }

    #[test]
    fn reparent_would_create_cycle_is_rejected() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();
        let child = entities.create_child_provider("numa0", root.id).unwrap();

        let err = entities.reparent_provider(root.id, Some(child.id), 0).unwrap_err();
        assert!(!err.is_conflict());
    }

    #[test]
    fn delete_provider_rejects_when_it_has_children() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();
        let _child = entities.create_child_provider("numa0", root.id).unwrap();

        let err = entities.delete_provider(root.id, 0).unwrap_err();
        assert!(!err.is_conflict());
    }

    #[test]
    fn delete_provider_succeeds_once_childless_and_unallocated() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();

        entities.delete_provider(root.id, 0).unwrap();
        assert!(entities.get_provider(root.id).is_err());
    }

    #[test]
    fn put_inventory_rejects_capacity_drop_below_allocated() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();

        entities.put_inventory(inventory(root.id, "VCPU", 16), 0).unwrap();
        let provider = entities.get_provider(root.id).unwrap();
        assert_eq!(provider.generation, 1);

        store
            .apply(&[Mutation::PutAllocation(Box::new(crate::model::Allocation {
                consumer_id: placement_primitives::ConsumerId::generate(),
                provider_id: root.id,
                resource_class: ResourceClass::new("VCPU").unwrap(),
                used: 10,
            }))])
            .unwrap();

        let shrunk = inventory(root.id, "VCPU", 4);
        let err = entities.put_inventory(shrunk, 1).unwrap_err();
        assert!(!err.is_conflict());
    }

    #[test]
    fn delete_inventory_rejects_when_allocations_remain() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();
        entities.put_inventory(inventory(root.id, "VCPU", 16), 0).unwrap();

        store
            .apply(&[Mutation::PutAllocation(Box::new(crate::model::Allocation {
                consumer_id: placement_primitives::ConsumerId::generate(),
                provider_id: root.id,
                resource_class: ResourceClass::new("VCPU").unwrap(),
                used: 2,
            }))])
            .unwrap();

        let err = entities
            .delete_inventory(root.id, &ResourceClass::new("VCPU").unwrap(), 1)
            .unwrap_err();
        assert!(!err.is_conflict());
    }
}
