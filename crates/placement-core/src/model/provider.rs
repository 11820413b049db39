use crate::model::Generation;
use placement_primitives::{AggregateId, ProviderId, TraitName};
use std::collections::BTreeSet;

///
/// Provider
/// A node in the provider forest. Owns a set of traits and aggregate
/// memberships; inventories live separately, keyed by `(id, ResourceClass)`.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub parent_id: Option<ProviderId>,
    pub root_id: ProviderId,
    pub generation: Generation,
    pub traits: BTreeSet<TraitName>,
    pub aggregates: BTreeSet<AggregateId>,
}

impl Provider {
    #[must_use]
    pub fn root(id: ProviderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            root_id: id,
            generation: 0,
            traits: BTreeSet::new(),
            aggregates: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    #[must_use]
    pub fn has_required_traits(&self, required: &BTreeSet<TraitName>) -> bool {
        required.is_subset(&self.traits)
    }

    #[must_use]
    pub fn has_no_forbidden_traits(&self, forbidden: &BTreeSet<TraitName>) -> bool {
        self.traits.is_disjoint(forbidden)
    }

    #[must_use]
    pub fn satisfies_any_of(&self, group: &BTreeSet<TraitName>) -> bool {
        group.is_empty() || !self.traits.is_disjoint(group)
    }

    #[must_use]
    pub fn is_member_of_any(&self, group: &BTreeSet<AggregateId>) -> bool {
        group.is_empty() || !self.aggregates.is_disjoint(group)
    }
}
