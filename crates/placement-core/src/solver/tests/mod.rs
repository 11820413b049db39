
use crate::{
    model::Provider,
    solver::{
        combine,
        request::{CandidateRequest, GroupMatch, GroupPolicy, ResourceGroup},
        tree::TreeIndex,
        SolverLimits,
    },
};
use placement_primitives::{ProviderId, ResourceClass};
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

fn limits() -> SolverLimits {
    SolverLimits {
        deadline: Instant::now() + Duration::from_secs(5),
        max_candidates: 1000,
    }
}

fn resource_group(suffix: &str) -> ResourceGroup {
    ResourceGroup {
        suffix: suffix.to_string(),
        resources: BTreeMap::from([(ResourceClass::new("VCPU").unwrap(), 1)]),
        ..ResourceGroup::default()
    }
}

fn single_match(rp: ProviderId) -> GroupMatch {
    GroupMatch {
        assignments: BTreeMap::from([(ResourceClass::new("VCPU").unwrap(), (rp, 1))]),
        providers: vec![rp],
    }
}

/// A `TreeIndex` where every listed id is a direct child of one shared,
/// synthetic root — so `satisfies_single_root` never spuriously rejects
/// combinations in tests that don't care about locality.
fn shared_root_tree(rps: &[ProviderId]) -> TreeIndex {
    let root_id = ProviderId::generate();
    let mut providers = vec![Provider::root(root_id, "root")];
    for rp in rps {
        providers.push(Provider {
            id: *rp,
            name: "p".into(),
            parent_id: Some(root_id),
            root_id,
            generation: 0,
            traits: Default::default(),
            aggregates: Default::default(),
        });
    }
    TreeIndex::build(&providers)
}

#[test]
fn validate_request_rejects_all_resourceless_groups() {
    let request = CandidateRequest {
        groups: vec![ResourceGroup::default()],
        ..CandidateRequest::default()
    };
    let err = combine::validate_request(&request).unwrap_err();
    assert!(err.message.contains("at least one group"));
}

#[test]
fn validate_request_rejects_same_subtree_on_unsuffixed_group() {
    let request = CandidateRequest {
        groups: vec![resource_group("")],
        same_subtree: vec![vec![String::new()]],
        ..CandidateRequest::default()
    };
    let err = combine::validate_request(&request).unwrap_err();
    assert!(err.message.contains("same_subtree"));
}

#[test]
fn combine_produces_cartesian_product_across_groups() {
    let a = [ProviderId::generate(), ProviderId::generate()];
    let b = [ProviderId::generate(), ProviderId::generate()];
    let request = CandidateRequest {
        groups: vec![resource_group("_A"), resource_group("_B")],
        ..CandidateRequest::default()
    };
    let group_matches = BTreeMap::from([
        ("_A".to_string(), a.iter().copied().map(single_match).collect()),
        ("_B".to_string(), b.iter().copied().map(single_match).collect()),
    ]);
    let tree = shared_root_tree(&[a[0], a[1], b[0], b[1]]);
    let (candidates, report) = combine::combine(&request, &tree, &group_matches, &limits()).unwrap();
    assert_eq!(candidates.len(), 4);
    assert_eq!(report.emitted, 4);
}

#[test]
fn combine_returns_empty_when_a_group_has_no_matches() {
    let request = CandidateRequest {
        groups: vec![resource_group("_A"), resource_group("_B")],
        ..CandidateRequest::default()
    };
    let group_matches = BTreeMap::from([
        ("_A".to_string(), vec![single_match(ProviderId::generate())]),
        ("_B".to_string(), Vec::new()),
    ]);
    let tree = TreeIndex::build(&[]);
    let (candidates, _) = combine::combine(&request, &tree, &group_matches, &limits()).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn isolate_policy_drops_combinations_sharing_a_provider() {
    let shared = ProviderId::generate();
    let other = ProviderId::generate();
    let request = CandidateRequest {
        groups: vec![resource_group("_A"), resource_group("_B")],
        group_policy: GroupPolicy::Isolate,
        ..CandidateRequest::default()
    };
    let group_matches = BTreeMap::from([
        ("_A".to_string(), vec![single_match(shared)]),
        ("_B".to_string(), vec![single_match(shared), single_match(other)]),
    ]);
    let tree = shared_root_tree(&[shared, other]);
    let (candidates, _) = combine::combine(&request, &tree, &group_matches, &limits()).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].mappings["_B"], vec![other]);
}
