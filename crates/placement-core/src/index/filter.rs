use crate::model::Provider;
use placement_primitives::{AggregateId, TraitName};
use std::collections::BTreeSet;

///
/// TraitFilter
/// `required` is AND over presence, `forbidden` is AND over absence,
/// `any_of` is AND-of-OR over the listed groups (each group satisfied if the
/// provider carries at least one trait from it).
///

#[derive(Clone, Debug, Default)]
pub struct TraitFilter {
    pub required: BTreeSet<TraitName>,
    pub forbidden: BTreeSet<TraitName>,
    pub any_of: Vec<BTreeSet<TraitName>>,
}

impl TraitFilter {
    #[must_use]
    pub fn matches(&self, provider: &Provider) -> bool {
        provider.has_required_traits(&self.required)
            && provider.has_no_forbidden_traits(&self.forbidden)
            && self.any_of.iter().all(|group| provider.satisfies_any_of(group))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty() && self.any_of.is_empty()
    }
}

///
/// AggregateFilter
/// AND-of-OR over aggregate membership groups.
///

#[derive(Clone, Debug, Default)]
pub struct AggregateFilter {
    pub member_of: Vec<BTreeSet<AggregateId>>,
}

impl AggregateFilter {
    #[must_use]
    pub fn matches(&self, provider: &Provider) -> bool {
        self.member_of
            .iter()
            .all(|group| provider.is_member_of_any(group))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member_of.is_empty()
    }
}
