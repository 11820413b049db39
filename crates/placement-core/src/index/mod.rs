//! Inverted indexes over provider traits and aggregate membership, so
//! candidate filtering costs `O(|smallest clause|)` instead of a full scan.

mod filter;

pub use filter::{AggregateFilter, TraitFilter};

use placement_primitives::{AggregateId, ProviderId, TraitName};
use std::collections::{HashMap, HashSet};

///
/// TraitIndex
/// Inverted map from trait to the set of providers carrying it.
///

#[derive(Default)]
pub struct TraitIndex {
    by_trait: HashMap<TraitName, HashSet<ProviderId>>,
}

impl TraitIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_traits(&mut self, provider_id: ProviderId, traits: &HashSet<TraitName>) {
        self.remove_provider(provider_id);
        for t in traits {
            self.by_trait.entry(t.clone()).or_default().insert(provider_id);
        }
    }

    pub fn remove_provider(&mut self, provider_id: ProviderId) {
        for providers in self.by_trait.values_mut() {
            providers.remove(&provider_id);
        }
    }

    #[must_use]
    pub fn providers_with(&self, t: &TraitName) -> HashSet<ProviderId> {
        self.by_trait.get(t).cloned().unwrap_or_default()
    }
}

///
/// AggregateIndex
/// Inverted map from aggregate to the set of member providers.
///

#[derive(Default)]
pub struct AggregateIndex {
    by_aggregate: HashMap<AggregateId, HashSet<ProviderId>>,
}

impl AggregateIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_aggregates(&mut self, provider_id: ProviderId, aggregates: &HashSet<AggregateId>) {
        self.remove_provider(provider_id);
        for a in aggregates {
            self.by_aggregate.entry(*a).or_default().insert(provider_id);
        }
    }

    pub fn remove_provider(&mut self, provider_id: ProviderId) {
        for providers in self.by_aggregate.values_mut() {
            providers.remove(&provider_id);
        }
    }

    #[must_use]
    pub fn providers_in(&self, a: AggregateId) -> HashSet<ProviderId> {
        self.by_aggregate.get(&a).cloned().unwrap_or_default()
    }
}
