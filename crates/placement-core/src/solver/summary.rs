//! Provider summaries (§6): the `provider_summaries` half of the solver's
//! external response body, describing each provider referenced by an
//! emitted `AllocationRequest` — its per-class capacity/used, its traits,
//! and its position in the provider forest.

use crate::{error::Error, model::Inventory, solver::tree::TreeIndex, store::TransactionalStore};
use placement_primitives::{ProviderId, ResourceClass, TraitName};
use std::collections::{BTreeMap, BTreeSet};

///
/// ResourceUsage
/// One resource class's capacity and current usage on a summarized provider.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ResourceUsage {
    pub capacity: u32,
    pub used: u32,
}

///
/// ProviderSummary
/// §6 response shape: `{ resources: {rc:{capacity,used}}, traits:[...],
/// parent_provider_uuid, root_provider_uuid }`.
///

#[derive(Clone, Debug, serde::Serialize)]
pub struct ProviderSummary {
    pub resources: BTreeMap<ResourceClass, ResourceUsage>,
    pub traits: BTreeSet<TraitName>,
    pub parent_provider_uuid: Option<ProviderId>,
    pub root_provider_uuid: ProviderId,
}

/// Build a `{provider -> summary}` map for exactly the given providers,
/// reading inventories and allocations live from the store (same staleness
/// contract as `CapacityView`: advisory, re-validated at write time).
pub fn build(
    store: &dyn TransactionalStore,
    tree: &TreeIndex,
    provider_ids: &BTreeSet<ProviderId>,
) -> Result<BTreeMap<ProviderId, ProviderSummary>, Error> {
    let mut out = BTreeMap::new();
    for &id in provider_ids {
        let Some(provider) = store.get_provider(id)? else {
            continue;
        };
        let mut resources = BTreeMap::new();
        for inv in store.list_inventories_for_provider(id)? {
            resources.insert(inv.resource_class.clone(), usage(store, &inv)?);
        }
        out.insert(
            id,
            ProviderSummary {
                resources,
                traits: provider.traits.clone(),
                parent_provider_uuid: provider.parent_id,
                root_provider_uuid: tree.root_of(id),
            },
        );
    }
    Ok(out)
}

fn usage(store: &dyn TransactionalStore, inv: &Inventory) -> Result<ResourceUsage, Error> {
    let used: u32 = store
        .allocations_for_provider_class(inv.provider_id, &inv.resource_class)?
        .iter()
        .map(|a| a.used)
        .sum();
    Ok(ResourceUsage {
        capacity: inv.capacity(),
        used,
    })
}

/// Every provider id referenced by any group's mapping across a set of
/// emitted allocation requests — the exact set §6 asks `provider_summaries`
/// to cover.
#[must_use]
pub fn referenced_providers(requests: &[crate::solver::AllocationRequest]) -> BTreeSet<ProviderId> {
    requests
        .iter()
        .flat_map(|r| r.mappings.values().flatten().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::EntityStore, store::MemStore};
    use placement_primitives::ResourceClass;

    #[test]
    fn summarizes_resources_traits_and_tree_position() {
        let store = MemStore::new();
        let entities = EntityStore::new(&store);
        let root = entities.create_root_provider("host0").unwrap();
        let child = entities.create_child_provider("numa0", root.id).unwrap();
        entities
            .set_traits(child.id, BTreeSet::from([TraitName::new("HW_NUMA_ROOT").unwrap()]), 0)
            .unwrap();
        entities
            .put_inventory(
                Inventory {
                    provider_id: child.id,
                    resource_class: ResourceClass::new("VCPU").unwrap(),
                    total: 8,
                    reserved: 0,
                    min_unit: 1,
                    max_unit: 8,
                    step_size: 1,
                    allocation_ratio: 1.0,
                },
                1,
            )
            .unwrap();

        let providers = store.list_providers().unwrap();
        let tree = TreeIndex::build(&providers);
        let summaries = build(&store, &tree, &BTreeSet::from([child.id])).unwrap();

        let summary = &summaries[&child.id];
        assert_eq!(summary.parent_provider_uuid, Some(root.id));
        assert_eq!(summary.root_provider_uuid, root.id);
        assert!(summary.traits.contains(&TraitName::new("HW_NUMA_ROOT").unwrap()));
        assert_eq!(
            summary.resources[&ResourceClass::new("VCPU").unwrap()],
            ResourceUsage { capacity: 8, used: 0 }
        );
    }
}
