//! Capacity is a universal invariant (allocated amount never exceeds
//! effective capacity) that must hold no matter what sequence of writes a
//! caller throws at a single inventory, including writes the writer itself
//! rejects along the way.

use crate::{
    model::Inventory,
    store::{MemStore, TransactionalStore},
    writer::{AllocationWriter, ConsumerWrite, ProviderAllocation},
};
use placement_primitives::{ConsumerId, ResourceClass};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Write { consumer: usize, amount: u32 },
    Delete { consumer: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 0u32..16).prop_map(|(consumer, amount)| Op::Write { consumer, amount }),
        (0usize..3).prop_map(|consumer| Op::Delete { consumer }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn allocated_never_exceeds_capacity(ops in prop::collection::vec(arb_op(), 0..24)) {
        let store = MemStore::new();
        let entities = crate::entity::EntityStore::new(&store);
        let provider = entities.create_root_provider("host0").unwrap();
        let rc = ResourceClass::new("VCPU").unwrap();
        let inventory = Inventory {
            provider_id: provider.id,
            resource_class: rc.clone(),
            total: 8,
            reserved: 0,
            min_unit: 1,
            max_unit: 8,
            step_size: 1,
            allocation_ratio: 1.0,
        };
        let capacity = inventory.capacity();
        entities.put_inventory(inventory, 0).unwrap();

        let writer = AllocationWriter::new(&store);
        let consumers: Vec<ConsumerId> = (0..3).map(|_| ConsumerId::generate()).collect();

        for op in ops {
            let (consumer_index, amount) = match op {
                Op::Write { consumer, amount } => (consumer, amount),
                Op::Delete { consumer } => (consumer, 0),
            };
            let consumer_id = consumers[consumer_index];
            let generation = store.get_consumer(consumer_id).unwrap().and_then(|c| c.generation);
            let mut allocations = BTreeMap::new();
            if amount > 0 {
                allocations.insert(
                    provider.id,
                    ProviderAllocation { generation: None, resources: BTreeMap::from([(rc.clone(), amount)]) },
                );
            }
            let write = ConsumerWrite {
                consumer_id,
                consumer_generation: generation,
                project_id: "proj".into(),
                user_id: "user".into(),
                allocations,
            };
            // Accepted or rejected, the invariant must hold afterwards either way.
            let _ = writer.put(write);

            let total: u32 = store
                .allocations_for_provider(provider.id)
                .unwrap()
                .iter()
                .map(|a| a.used)
                .sum();
            prop_assert!(total <= capacity);
        }
    }
}
