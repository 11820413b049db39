//! Allocation Writer (§4.G): atomic multi-consumer allocation bundle writes
//! under generation-based optimistic concurrency.

use crate::{
    commit::{self, CommitKind, CommitMarker},
    error::{Error, ErrorOrigin},
    model::{Allocation, Consumer, Generation},
    store::{Mutation, TransactionalStore},
};
use placement_primitives::{ConsumerId, ProviderId, ResourceClass};
use std::collections::BTreeMap;

/// One provider's contribution to a consumer's allocation bundle.
#[derive(Clone, Debug, Default)]
pub struct ProviderAllocation {
    pub generation: Option<Generation>,
    pub resources: BTreeMap<ResourceClass, u32>,
}

/// One consumer's full replacement bundle, as sent on `PUT`/`POST`/`DELETE`.
#[derive(Clone, Debug)]
pub struct ConsumerWrite {
    pub consumer_id: ConsumerId,
    pub consumer_generation: Option<Generation>,
    pub project_id: String,
    pub user_id: String,
    /// Empty means "delete this consumer's allocations".
    pub allocations: BTreeMap<ProviderId, ProviderAllocation>,
}

///
/// AllocationWriter
///

pub struct AllocationWriter<'s> {
    store: &'s dyn TransactionalStore,
}

impl<'s> AllocationWriter<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn TransactionalStore) -> Self {
        Self { store }
    }

    /// Replace one consumer's bundle (`PUT /allocations/{consumer}`).
    pub fn put(&self, write: ConsumerWrite) -> Result<(), Error> {
        self.write_bundles(vec![write])
    }

    /// Replace many consumers' bundles atomically (`POST /allocations`).
    pub fn post(&self, writes: Vec<ConsumerWrite>) -> Result<(), Error> {
        self.write_bundles(writes)
    }

    /// Empty one consumer's bundle (`DELETE /allocations/{consumer}`).
    pub fn delete(&self, consumer_id: ConsumerId, consumer_generation: Option<Generation>) -> Result<(), Error> {
        let consumer = self
            .store
            .get_consumer(consumer_id)?
            .ok_or_else(|| Error::not_found(ErrorOrigin::Writer, format!("consumer not found: {consumer_id}")))?;
        self.write_bundles(vec![ConsumerWrite {
            consumer_id,
            consumer_generation,
            project_id: consumer.project_id,
            user_id: consumer.user_id,
            allocations: BTreeMap::new(),
        }])
    }

    fn write_bundles(&self, writes: Vec<ConsumerWrite>) -> Result<(), Error> {
        let span = tracing::info_span!("writer.write_bundles", consumer_count = writes.len());
        let _enter = span.enter();
        commit::recover(self.store)?;

        // Step 1: load consumers, check consumer generation.
        let mut existing_consumers = BTreeMap::new();
        for w in &writes {
            if let Some(consumer) = self.store.get_consumer(w.consumer_id)? {
                if let Some(expected) = w.consumer_generation
                    && consumer.generation != Some(expected)
                {
                    return Err(Error::conflict(
                        ErrorOrigin::Writer,
                        format!("consumer {} generation mismatch", w.consumer_id),
                    ));
                }
                existing_consumers.insert(w.consumer_id, consumer);
            } else if w.consumer_generation.is_some() {
                return Err(Error::not_found(
                    ErrorOrigin::Writer,
                    format!("consumer not found: {}", w.consumer_id),
                ));
            }
        }

        // Step 2: net delta per (provider, resource_class).
        let mut delta: BTreeMap<(ProviderId, ResourceClass), i64> = BTreeMap::new();
        let mut touched_providers: BTreeMap<ProviderId, Option<Generation>> = BTreeMap::new();

        for w in &writes {
            for a in self.store.allocations_for_consumer(w.consumer_id)? {
                *delta.entry((a.provider_id, a.resource_class.clone())).or_insert(0) -=
                    i64::from(a.used);
            }
            for (provider_id, alloc) in &w.allocations {
                touched_providers.insert(*provider_id, alloc.generation);
                for (rc, amount) in &alloc.resources {
                    *delta.entry((*provider_id, rc.clone())).or_insert(0) += i64::from(*amount);
                }
            }
        }

        // Step 3: capacity re-check per touched inventory.
        for ((provider_id, rc), d) in &delta {
            if *d <= 0 {
                continue;
            }
            let inventory = self.store.get_inventory(*provider_id, rc)?.ok_or_else(|| {
                Error::not_found(
                    ErrorOrigin::Writer,
                    format!("inventory not found for provider {provider_id} class {rc}"),
                )
            })?;
            let currently: u32 = self
                .store
                .allocations_for_provider_class(*provider_id, rc)?
                .iter()
                .map(|a| a.used)
                .sum();
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let after = (i64::from(currently) + d) as u32;
            if after > inventory.capacity() {
                return Err(Error::inventory_inuse(
                    ErrorOrigin::Writer,
                    format!("inventory for provider {provider_id} class {rc} would exceed capacity"),
                ));
            }
        }

        // Step 4: generation CAS on touched providers, where supplied.
        let mut provider_generations = BTreeMap::new();
        for (provider_id, requested_generation) in &touched_providers {
            let provider = self.store.get_provider(*provider_id)?.ok_or_else(|| {
                Error::not_found(ErrorOrigin::Writer, format!("provider not found: {provider_id}"))
            })?;
            if let Some(expected) = requested_generation
                && provider.generation != *expected
            {
                return Err(Error::conflict(
                    ErrorOrigin::Writer,
                    format!("provider {provider_id} generation mismatch"),
                ));
            }
            provider_generations.insert(*provider_id, provider.generation);
        }

        // Step 5: build the mutation batch and commit it behind a marker.
        let mutations = self.build_mutations(&writes, &existing_consumers, &provider_generations)?;
        let marker = CommitMarker::new(CommitKind::AllocationWrite, mutations);
        let guard = commit::begin_commit(self.store, marker)?;
        commit::finish_commit(self.store, guard)
    }

    fn build_mutations(
        &self,
        writes: &[ConsumerWrite],
        existing_consumers: &BTreeMap<ConsumerId, Consumer>,
        provider_generations: &BTreeMap<ProviderId, Generation>,
    ) -> Result<Vec<Mutation>, Error> {
        let mut mutations = Vec::new();

        for w in writes {
            for a in self.store.allocations_for_consumer(w.consumer_id)? {
                mutations.push(Mutation::DeleteAllocation {
                    consumer_id: a.consumer_id,
                    provider_id: a.provider_id,
                    resource_class: a.resource_class,
                });
            }

            if w.allocations.is_empty() {
                mutations.push(Mutation::DeleteConsumer(w.consumer_id));
                continue;
            }

            let next_generation = existing_consumers
                .get(&w.consumer_id)
                .and_then(|c| c.generation)
                .map_or(1, |g| g + 1);
            mutations.push(Mutation::PutConsumer(Box::new(Consumer {
                id: w.consumer_id,
                project_id: w.project_id.clone(),
                user_id: w.user_id.clone(),
                generation: Some(next_generation),
            })));

            for (provider_id, alloc) in &w.allocations {
                for (rc, amount) in &alloc.resources {
                    mutations.push(Mutation::PutAllocation(Box::new(Allocation {
                        consumer_id: w.consumer_id,
                        provider_id: *provider_id,
                        resource_class: rc.clone(),
                        used: *amount,
                    })));
                }
            }
        }

        for (provider_id, current_generation) in provider_generations {
            let mut provider = self
                .store
                .get_provider(*provider_id)?
                .ok_or_else(|| Error::not_found(ErrorOrigin::Writer, format!("provider not found: {provider_id}")))?;
            debug_assert_eq!(provider.generation, *current_generation);
            provider.generation += 1;
            mutations.push(Mutation::PutProvider(Box::new(provider)));
        }

        Ok(mutations)
    }
}

#[cfg(test)]
mod tests;
