use crate::{
    error::{Error, ErrorOrigin},
    solver::{
        request::{AllocationRequest, CandidateRequest, GroupMatch, GroupPolicy},
        tree::TreeIndex,
        SolveReport, SolverLimits,
    },
};
use placement_primitives::ProviderId;
use std::collections::{BTreeMap, BTreeSet};

/// Validate request-shape constraints that don't depend on live data
/// (§4.F "Validation errors"). Called before any matching is attempted.
pub fn validate_request(request: &CandidateRequest) -> Result<(), Error> {
    if request.groups.iter().all(|g| g.resources.is_empty()) {
        return Err(Error::bad_value(
            ErrorOrigin::Solver,
            "at least one group must declare resources",
        ));
    }

    let known_suffixes: BTreeSet<&str> =
        request.groups.iter().map(|g| g.suffix.as_str()).collect();

    for clause in &request.same_subtree {
        for suffix in clause {
            if suffix.is_empty() {
                return Err(Error::bad_value(
                    ErrorOrigin::Solver,
                    "same_subtree cannot reference the unsuffixed group",
                ));
            }
            if !known_suffixes.contains(suffix.as_str()) {
                return Err(Error::bad_value(
                    ErrorOrigin::Solver,
                    format!("same_subtree references unknown group suffix {suffix:?}"),
                ));
            }
        }
    }

    let anchored: BTreeSet<&str> = request
        .same_subtree
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();

    for group in &request.groups {
        if group.suffix.is_empty() {
            continue;
        }
        if group.is_resourceless() && !anchored.contains(group.suffix.as_str()) && !group.is_anchored() {
            return Err(Error::bad_value(
                ErrorOrigin::Solver,
                format!(
                    "resourceless group {:?} is neither anchored by same_subtree nor member_of",
                    group.suffix
                ),
            ));
        }
    }

    Ok(())
}

/// Combine per-group matches into emitted `AllocationRequest`s (§4.F).
///
/// Every resourceful group's providers must share a single root even
/// absent any `same_subtree` clause (§4.F: "the implicit whole-request
/// locality rule"); `same_subtree` clauses are additional, per-clause
/// constraints on top of that. The Cartesian product runs over the whole
/// request, filtering each generated combination against the shared-root
/// rule, `group_policy`, and every `same_subtree` clause in turn.
pub fn combine(
    request: &CandidateRequest,
    tree: &TreeIndex,
    group_matches: &BTreeMap<String, Vec<GroupMatch>>,
    limits: &SolverLimits,
) -> Result<(Vec<AllocationRequest>, SolveReport), Error> {
    let mut report = SolveReport::default();

    // Any group with zero matches makes the whole request unsatisfiable.
    if group_matches.values().any(Vec::is_empty) {
        return Ok((Vec::new(), report));
    }

    let ordered_suffixes: Vec<&str> = request.groups.iter().map(|g| g.suffix.as_str()).collect();

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    let mut combos: Vec<BTreeMap<&str, GroupMatch>> = vec![BTreeMap::new()];
    for suffix in &ordered_suffixes {
        let matches = &group_matches[*suffix];
        let mut next = Vec::with_capacity(combos.len() * matches.len());
        'build: for partial in &combos {
            for m in matches {
                report.considered += 1;
                if report.considered % 4096 == 0 && limits.deadline_exceeded() {
                    report.timed_out = true;
                    break 'build;
                }
                let mut candidate = partial.clone();
                candidate.insert(*suffix, m.clone());
                next.push(candidate);
            }
        }
        combos = next;
        if limits.deadline_exceeded() {
            report.timed_out = true;
            break;
        }
    }

    for combo in combos {
        if report.timed_out {
            break;
        }
        if !satisfies_single_root(request, tree, &combo) {
            continue;
        }
        if !satisfies_group_policy(request, &combo) {
            continue;
        }
        if !satisfies_same_subtree(request, tree, &combo) {
            continue;
        }

        let allocation = build_allocation_request(&combo);
        if seen.insert(allocation.clone()) {
            report.emitted += 1;
            out.push(allocation);
            if out.len() >= limits.max_candidates {
                break;
            }
            if let Some(limit) = request.limit
                && out.len() >= limit
            {
                break;
            }
        }
    }

    Ok((out, report))
}

/// The roots of every resourceful group's providers must be identical
/// (§4.F). Resourceless groups carry no resource of their own and are
/// exempt, same as they are from `group_policy=isolate`.
fn satisfies_single_root(
    request: &CandidateRequest,
    tree: &TreeIndex,
    combo: &BTreeMap<&str, GroupMatch>,
) -> bool {
    let mut roots = combo
        .iter()
        .filter(|(s, _)| request.group(s).is_some_and(|g| !g.is_resourceless()))
        .flat_map(|(_, m)| m.providers.iter().map(|rp| tree.root_of(*rp)));
    let Some(first) = roots.next() else {
        return true;
    };
    roots.all(|r| r == first)
}

fn satisfies_group_policy(
    request: &CandidateRequest,
    combo: &BTreeMap<&str, GroupMatch>,
) -> bool {
    if request.group_policy != GroupPolicy::Isolate {
        return true;
    }
    let resourceful_suffixes: Vec<&str> = combo
        .keys()
        .copied()
        .filter(|s| request.group(s).is_some_and(|g| !g.is_resourceless()))
        .collect();

    for (i, a) in resourceful_suffixes.iter().enumerate() {
        for b in &resourceful_suffixes[i + 1..] {
            let pa: BTreeSet<_> = combo[a].providers.iter().collect();
            let pb: BTreeSet<_> = combo[b].providers.iter().collect();
            if !pa.is_disjoint(&pb) {
                return false;
            }
        }
    }
    true
}

fn satisfies_same_subtree(
    request: &CandidateRequest,
    tree: &TreeIndex,
    combo: &BTreeMap<&str, GroupMatch>,
) -> bool {
    request.same_subtree.iter().all(|clause| {
        let providers: Vec<ProviderId> = clause
            .iter()
            .filter_map(|suffix| combo.get(suffix.as_str()))
            .flat_map(|m| m.providers.iter().copied())
            .collect();
        tree.same_subtree(&providers)
    })
}

fn build_allocation_request(combo: &BTreeMap<&str, GroupMatch>) -> AllocationRequest {
    let mut allocations: BTreeMap<ProviderId, BTreeMap<_, u32>> = BTreeMap::new();
    let mut mappings = BTreeMap::new();

    for (suffix, m) in combo {
        for (rc, (rp, amount)) in &m.assignments {
            *allocations
                .entry(*rp)
                .or_default()
                .entry(rc.clone())
                .or_insert(0) += amount;
        }
        let mut providers = m.providers.clone();
        providers.sort_unstable();
        providers.dedup();
        mappings.insert((*suffix).to_string(), providers);
    }

    AllocationRequest {
        allocations,
        mappings,
    }
}

