mod property;

use crate::{
    model::Inventory,
    store::{MemStore, TransactionalStore},
    writer::{AllocationWriter, ConsumerWrite, ProviderAllocation},
};
use placement_primitives::{ConsumerId, ProviderId, ResourceClass};
use std::collections::BTreeMap;

fn rc(name: &str) -> ResourceClass {
    ResourceClass::new(name).unwrap()
}

fn seed_provider_with_inventory(store: &MemStore, total: u32) -> ProviderId {
    let entities = crate::entity::EntityStore::new(store);
    let provider = entities.create_root_provider("host0").unwrap();
    entities
        .put_inventory(
            Inventory {
                provider_id: provider.id,
                resource_class: rc("VCPU"),
                total,
                reserved: 0,
                min_unit: 1,
                max_unit: total,
                step_size: 1,
                allocation_ratio: 1.0,
            },
            0,
        )
        .unwrap();
    provider.id
}

fn bundle(consumer_id: ConsumerId, provider_id: ProviderId, amount: u32) -> ConsumerWrite {
    ConsumerWrite {
        consumer_id,
        consumer_generation: None,
        project_id: "proj".into(),
        user_id: "user".into(),
        allocations: BTreeMap::from([(
            provider_id,
            ProviderAllocation {
                generation: None,
                resources: BTreeMap::from([(rc("VCPU"), amount)]),
            },
        )]),
    }
}

#[test]
fn put_creates_consumer_and_allocation() {
    let store = MemStore::new();
    let provider_id = seed_provider_with_inventory(&store, 8);
    let writer = AllocationWriter::new(&store);
    let consumer_id = ConsumerId::generate();

    writer.put(bundle(consumer_id, provider_id, 4)).unwrap();

    let allocations = store.allocations_for_consumer(consumer_id).unwrap();
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].used, 4);
    assert_eq!(store.get_consumer(consumer_id).unwrap().unwrap().generation, Some(1));
}

#[test]
fn put_rejects_capacity_overrun() {
    let store = MemStore::new();
    let provider_id = seed_provider_with_inventory(&store, 4);
    let writer = AllocationWriter::new(&store);

    let err = writer
        .put(bundle(ConsumerId::generate(), provider_id, 8))
        .unwrap_err();
    assert_eq!(err.code(), "placement.inventory.inuse");
}

#[test]
fn put_rejects_stale_consumer_generation() {
    let store = MemStore::new();
    let provider_id = seed_provider_with_inventory(&store, 8);
    let writer = AllocationWriter::new(&store);
    let consumer_id = ConsumerId::generate();

    writer.put(bundle(consumer_id, provider_id, 2)).unwrap();

    // A concurrent PUT racing against the one above, still carrying the
    // pre-write generation.
    let mut second = bundle(consumer_id, provider_id, 3);
    second.consumer_generation = Some(0);
    let err = writer.put(second).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.code(), "placement.concurrent_update");
}

#[test]
fn delete_clears_bundle_and_frees_capacity() {
    let store = MemStore::new();
    let provider_id = seed_provider_with_inventory(&store, 4);
    let writer = AllocationWriter::new(&store);
    let consumer_id = ConsumerId::generate();

    writer.put(bundle(consumer_id, provider_id, 4)).unwrap();
    writer.delete(consumer_id, Some(1)).unwrap();

    assert!(store.allocations_for_consumer(consumer_id).unwrap().is_empty());
    assert!(store.get_consumer(consumer_id).unwrap().is_none());

    // Capacity is free again for a fresh consumer.
    writer.put(bundle(ConsumerId::generate(), provider_id, 4)).unwrap();
}

#[test]
fn post_applies_multiple_bundles_atomically() {
    let store = MemStore::new();
    let provider_id = seed_provider_with_inventory(&store, 8);
    let writer = AllocationWriter::new(&store);
    let a = ConsumerId::generate();
    let b = ConsumerId::generate();

    writer
        .post(vec![bundle(a, provider_id, 3), bundle(b, provider_id, 5)])
        .unwrap();

    assert_eq!(store.allocations_for_consumer(a).unwrap()[0].used, 3);
    assert_eq!(store.allocations_for_consumer(b).unwrap()[0].used, 5);
}

#[test]
fn post_rejects_whole_batch_when_one_bundle_overruns_capacity() {
    let store = MemStore::new();
    let provider_id = seed_provider_with_inventory(&store, 8);
    let writer = AllocationWriter::new(&store);
    let a = ConsumerId::generate();
    let b = ConsumerId::generate();

    let err = writer
        .post(vec![bundle(a, provider_id, 3), bundle(b, provider_id, 6)])
        .unwrap_err();
    assert_eq!(err.code(), "placement.inventory.inuse");
    assert!(store.allocations_for_consumer(a).unwrap().is_empty());
}
