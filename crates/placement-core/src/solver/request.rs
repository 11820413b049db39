use crate::index::{AggregateFilter, TraitFilter};
use placement_primitives::{ProviderId, ResourceClass};
use std::collections::BTreeMap;

/// Suffix identifying a resource group. The unsuffixed group uses `""`.
pub type Suffix = String;

///
/// ResourceGroup
/// One clause of a candidate request, as produced by the query parser (§4.H)
/// and consumed by the group matcher (§4.D).
///

#[derive(Clone, Debug, Default)]
pub struct ResourceGroup {
    pub suffix: Suffix,
    pub resources: BTreeMap<ResourceClass, u32>,
    pub traits: TraitFilter,
    pub aggregates: AggregateFilter,
}

impl ResourceGroup {
    #[must_use]
    pub fn is_resourceless(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether this group's `member_of` alone gives it meaning independent
    /// of a `same_subtree` clause (§4.F validation).
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        !self.aggregates.is_empty()
    }
}

///
/// GroupPolicy
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[remain::sorted]
pub enum GroupPolicy {
    Isolate,
    #[default]
    None,
}

///
/// CandidateRequest
/// A fully parsed and validated solve request.
///

#[derive(Clone, Debug, Default)]
pub struct CandidateRequest {
    pub groups: Vec<ResourceGroup>,
    pub same_subtree: Vec<Vec<Suffix>>,
    pub group_policy: GroupPolicy,
    pub limit: Option<usize>,
}

impl CandidateRequest {
    #[must_use]
    pub fn group(&self, suffix: &str) -> Option<&ResourceGroup> {
        self.groups.iter().find(|g| g.suffix == suffix)
    }
}

///
/// GroupMatch
/// One way to satisfy a single resource group.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct GroupMatch {
    pub assignments: BTreeMap<ResourceClass, (ProviderId, u32)>,
    pub providers: Vec<ProviderId>,
}

impl GroupMatch {
    #[must_use]
    pub fn resourceless(anchor: ProviderId) -> Self {
        Self {
            assignments: BTreeMap::new(),
            providers: vec![anchor],
        }
    }
}

///
/// AllocationRequest
/// One emitted candidate: the summed allocations it would create, and which
/// group suffix chose which providers.
///

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, serde::Serialize)]
pub struct AllocationRequest {
    pub allocations: BTreeMap<ProviderId, BTreeMap<ResourceClass, u32>>,
    pub mappings: BTreeMap<Suffix, Vec<ProviderId>>,
}
