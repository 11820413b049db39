use crate::{
    error::Error,
    index::{AggregateIndex, TraitIndex},
    model::Provider,
    solver::{capacity::CapacityView, request::{GroupMatch, ResourceGroup}},
};
use placement_primitives::ProviderId;
use std::collections::BTreeMap;

///
/// match_group
/// Enumerate every distinct way to satisfy one resource group (§4.D).
///
/// Resources classes within the group may be drawn from different
/// providers; the result is the cross product of per-class candidate
/// providers, restricted to providers that individually satisfy the
/// group's trait and aggregate filters. Iteration order is lexicographic
/// by resource class, then ascending provider id, so output is
/// deterministic and de-duplication is trivial.
///

pub fn match_group(
    providers: &[Provider],
    trait_index: &TraitIndex,
    aggregate_index: &AggregateIndex,
    capacity: &CapacityView<'_>,
    group: &ResourceGroup,
) -> Result<Vec<GroupMatch>, Error> {
    // Narrow the candidate pool with the inverted indexes before falling
    // back to a full per-provider filter check, so a selective `required`
    // trait or `member_of` aggregate avoids scanning every provider.
    let narrowed: Option<std::collections::HashSet<ProviderId>> = group
        .traits
        .required
        .iter()
        .map(|t| trait_index.providers_with(t))
        .chain(
            group
                .aggregates
                .member_of
                .first()
                .into_iter()
                .map(|g| g.iter().flat_map(|a| aggregate_index.providers_in(*a)).collect()),
        )
        .reduce(|a, b| a.intersection(&b).copied().collect());

    let eligible: Vec<ProviderId> = providers
        .iter()
        .filter(|p| narrowed.as_ref().is_none_or(|n| n.contains(&p.id)))
        .filter(|p| group.traits.matches(p) && group.aggregates.matches(p))
        .map(|p| p.id)
        .collect();

    if group.is_resourceless() {
        let mut matches: Vec<GroupMatch> = eligible
            .into_iter()
            .map(GroupMatch::resourceless)
            .collect();
        matches.sort();
        return Ok(matches);
    }

    let eligible_set: std::collections::BTreeSet<ProviderId> = eligible.into_iter().collect();

    let mut per_class_candidates: Vec<(placement_primitives::ResourceClass, Vec<(ProviderId, u32)>)> =
        Vec::new();
    for (rc, amount) in &group.resources {
        let mut candidates: Vec<(ProviderId, u32)> = capacity
            .assignable_providers(rc, *amount)?
            .into_iter()
            .filter(|rp| eligible_set.contains(rp))
            .map(|rp| (rp, *amount))
            .collect();
        candidates.sort();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        per_class_candidates.push((rc.clone(), candidates));
    }

    let mut matches = vec![BTreeMap::new()];
    for (rc, candidates) in per_class_candidates {
        let mut next = Vec::with_capacity(matches.len() * candidates.len());
        for partial in &matches {
            for (rp, amount) in &candidates {
                let mut assignments = partial.clone();
                assignments.insert(rc.clone(), (*rp, *amount));
                next.push(assignments);
            }
        }
        matches = next;
    }

    let mut out: Vec<GroupMatch> = matches
        .into_iter()
        .map(|assignments| {
            let mut providers: Vec<ProviderId> =
                assignments.values().map(|(rp, _)| *rp).collect();
            providers.sort_unstable();
            providers.dedup();
            GroupMatch {
                assignments,
                providers,
            }
        })
        .collect();
    out.sort();
    out.dedup();
    Ok(out)
}
