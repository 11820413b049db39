//! The allocation-candidate solver: components C (capacity), D (group
//! matcher), E (tree locality), and F (combiner), orchestrated by `Solver`.

pub mod capacity;
mod combine;
mod group;
pub mod request;
pub mod summary;
pub mod tree;

pub use request::{AllocationRequest, CandidateRequest, GroupMatch, GroupPolicy, ResourceGroup};
pub use summary::{ProviderSummary, ResourceUsage};

use crate::{
    error::Error,
    index::{AggregateIndex, TraitIndex},
    store::TransactionalStore,
};
use capacity::CapacityView;
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};
use tree::TreeIndex;

///
/// SolverConfig
/// Caller-supplied knobs; this crate never reads environment or files for
/// these (that remains the embedding service's job).
///

#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    pub default_limit: usize,
    pub hard_limit: usize,
    pub default_timeout: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            hard_limit: 1000,
            default_timeout: Duration::from_secs(5),
        }
    }
}

///
/// SolverLimits
/// The per-request deadline and output cap the combiner enforces while
/// walking the Cartesian product of group matches.
///

#[derive(Clone, Copy, Debug)]
pub struct SolverLimits {
    pub deadline: Instant,
    pub max_candidates: usize,
}

impl SolverLimits {
    #[must_use]
    pub fn from_config(config: &SolverConfig, requested_limit: Option<usize>) -> Self {
        let max_candidates = requested_limit
            .unwrap_or(config.default_limit)
            .min(config.hard_limit);
        Self {
            deadline: Instant::now() + config.default_timeout,
            max_candidates,
        }
    }

    #[must_use]
    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

///
/// SolveReport
/// Always-on counters returned alongside the candidate list, independent of
/// whether a `tracing` subscriber is installed.
///

#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct SolveReport {
    pub considered: usize,
    pub emitted: usize,
    pub timed_out: bool,
}

///
/// Solver
/// Stateless orchestrator over a `TransactionalStore`. Holds no cross-request
/// mutable state; safe to share across concurrently running request handlers.
///

pub struct Solver<'s> {
    store: &'s dyn TransactionalStore,
    config: SolverConfig,
}

impl<'s> Solver<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn TransactionalStore, config: SolverConfig) -> Self {
        Self { store, config }
    }

    /// Enumerate every distinct allocation candidate for `request` (§4.F).
    pub fn candidates(
        &self,
        request: &CandidateRequest,
    ) -> Result<(Vec<AllocationRequest>, SolveReport), Error> {
        combine::validate_request(request)?;

        let limits = SolverLimits::from_config(&self.config, request.limit);
        let span = tracing::info_span!(
            "solver.candidates",
            group_count = request.groups.len(),
            limit = limits.max_candidates
        );
        let _enter = span.enter();

        let providers = self.store.list_providers()?;
        let tree = TreeIndex::build(&providers);

        let mut trait_index = TraitIndex::new();
        let mut aggregate_index = AggregateIndex::new();
        for p in &providers {
            trait_index.set_traits(p.id, &p.traits.iter().cloned().collect());
            aggregate_index.set_aggregates(p.id, &p.aggregates.iter().copied().collect());
        }

        let capacity = CapacityView::new(self.store);

        let mut group_matches = BTreeMap::new();
        for group in &request.groups {
            let matches = group::match_group(
                &providers,
                &trait_index,
                &aggregate_index,
                &capacity,
                group,
            )?;
            tracing::debug!(suffix = %group.suffix, matches = matches.len(), "group matched");
            group_matches.insert(group.suffix.clone(), matches);
        }

        let (candidates, report) = combine::combine(request, &tree, &group_matches, &limits)?;
        if report.timed_out {
            tracing::warn!("candidate generation hit its deadline");
            return Err(Error::timeout(
                crate::error::ErrorOrigin::Solver,
                "candidate generation exceeded its deadline",
            ));
        }

        Ok((candidates, report))
    }

    /// Build the `provider_summaries` half of the §6 response body for
    /// exactly the providers referenced by `requests`' mappings.
    pub fn summarize(
        &self,
        requests: &[AllocationRequest],
    ) -> Result<BTreeMap<placement_primitives::ProviderId, ProviderSummary>, Error> {
        let providers = self.store.list_providers()?;
        let tree = TreeIndex::build(&providers);
        let referenced = summary::referenced_providers(requests);
        summary::build(self.store, &tree, &referenced)
    }
}

#[cfg(test)]
mod tests;
