use crate::model::Provider;
use placement_primitives::ProviderId;
use std::collections::HashMap;

///
/// TreeIndex
/// Resolves provider locality. Built once per request from the live
/// provider list so subtree checks are array/map lookups, not repeated
/// parent-chain walks against the store.
///

pub struct TreeIndex {
    root_of: HashMap<ProviderId, ProviderId>,
    ancestors: HashMap<ProviderId, Vec<ProviderId>>,
}

impl TreeIndex {
    #[must_use]
    pub fn build(providers: &[Provider]) -> Self {
        let parent_of: HashMap<ProviderId, Option<ProviderId>> = providers
            .iter()
            .map(|p| (p.id, p.parent_id))
            .collect();

        let mut ancestors = HashMap::new();
        let mut root_of = HashMap::new();

        for p in providers {
            let mut chain = vec![p.id];
            let mut cur = p.parent_id;
            while let Some(parent_id) = cur {
                chain.push(parent_id);
                cur = parent_of.get(&parent_id).copied().flatten();
            }
            root_of.insert(p.id, *chain.last().unwrap_or(&p.id));
            ancestors.insert(p.id, chain);
        }

        Self { root_of, ancestors }
    }

    #[must_use]
    pub fn root_of(&self, rp: ProviderId) -> ProviderId {
        self.root_of.get(&rp).copied().unwrap_or(rp)
    }

    /// `rp == anchor` or `anchor` is an ancestor of `rp`.
    #[must_use]
    pub fn is_in_subtree(&self, rp: ProviderId, anchor: ProviderId) -> bool {
        self.ancestors
            .get(&rp)
            .is_some_and(|chain| chain.contains(&anchor))
    }

    /// Whether a set of providers admits a common ancestor, i.e. there
    /// exists some `a` such that every member is in the subtree rooted at `a`.
    ///
    /// The whole-request root is excluded from eligible anchors: every
    /// resourceful group already shares that root (§4.F's implicit
    /// single-root rule), so admitting it here would make any `same_subtree`
    /// clause trivially true within a single-root forest. A proper anchor
    /// strictly below the tree root is required.
    #[must_use]
    pub fn same_subtree(&self, rps: &[ProviderId]) -> bool {
        let Some((first, rest)) = rps.split_first() else {
            return true;
        };
        let Some(first_chain) = self.ancestors.get(first) else {
            return false;
        };
        let root = self.root_of(*first);
        first_chain
            .iter()
            .filter(|candidate_anchor| **candidate_anchor != root)
            .any(|candidate_anchor| {
                rest.iter().all(|rp| self.is_in_subtree(*rp, *candidate_anchor))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_primitives::ProviderId;

    fn provider(id: ProviderId, parent: Option<ProviderId>, root: ProviderId) -> Provider {
        Provider {
            id,
            name: "p".into(),
            parent_id: parent,
            root_id: root,
            generation: 0,
            traits: Default::default(),
            aggregates: Default::default(),
        }
    }

    #[test]
    fn same_subtree_true_for_shared_ancestor() {
        let root = ProviderId::generate();
        let numa0 = ProviderId::generate();
        let fpga0 = ProviderId::generate();
        let providers = vec![
            provider(root, None, root),
            provider(numa0, Some(root), root),
            provider(fpga0, Some(numa0), root),
        ];
        let tree = TreeIndex::build(&providers);
        assert!(tree.same_subtree(&[numa0, fpga0]));
    }

    #[test]
    fn same_subtree_false_across_different_roots() {
        let root_a = ProviderId::generate();
        let root_b = ProviderId::generate();
        let providers = vec![provider(root_a, None, root_a), provider(root_b, None, root_b)];
        let tree = TreeIndex::build(&providers);
        assert!(!tree.same_subtree(&[root_a, root_b]));
    }
}
