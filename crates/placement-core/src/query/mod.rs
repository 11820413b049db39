//! Query parser (§4.H / §6): parses suffixed query parameters into a
//! validated `CandidateRequest`. Pure function — never touches the store.

mod params;

use crate::{
    error::{Error, ErrorOrigin},
    solver::{CandidateRequest, GroupPolicy, ResourceGroup},
};
use std::collections::BTreeMap;

const BASES: [&str; 3] = ["resources", "required", "member_of"];

/// Parse the flat list of raw query key/value pairs (as an HTTP layer would
/// hand them over after percent-decoding) into a `CandidateRequest`.
///
/// `same_subtree` may repeat; every other recognized key is expected once.
pub fn parse(entries: &[(String, String)]) -> Result<CandidateRequest, Error> {
    let mut groups: BTreeMap<String, ResourceGroup> = BTreeMap::new();
    let mut same_subtree = Vec::new();
    let mut group_policy = GroupPolicy::None;
    let mut limit = None;

    for (key, value) in entries {
        if key == "same_subtree" {
            same_subtree.push(params::parse_same_subtree(value));
            continue;
        }
        if key == "group_policy" {
            group_policy = match value.as_str() {
                "none" => GroupPolicy::None,
                "isolate" => GroupPolicy::Isolate,
                other => {
                    return Err(Error::bad_value(
                        ErrorOrigin::Query,
                        format!("unrecognized group_policy {other:?}"),
                    ));
                }
            };
            continue;
        }
        if key == "limit" {
            limit = Some(value.parse::<usize>().map_err(|_| {
                Error::bad_value(ErrorOrigin::Query, format!("malformed limit {value:?}"))
            })?);
            continue;
        }

        let Some((base, suffix)) = BASES
            .iter()
            .find_map(|base| params::split_suffix(key, base).map(|s| (*base, s)))
        else {
            return Err(Error::bad_value(ErrorOrigin::Query, format!("unrecognized query key {key:?}")));
        };

        let group = groups.entry(suffix.to_string()).or_insert_with(|| ResourceGroup {
            suffix: suffix.to_string(),
            ..ResourceGroup::default()
        });

        match base {
            "resources" => group.resources = params::parse_resources(value)?,
            "required" => group.traits = params::parse_required(value)?,
            "member_of" => group.aggregates = params::parse_member_of(value)?,
            _ => unreachable!("BASES is exhaustive"),
        }
    }

    if groups.is_empty() {
        return Err(Error::missing_value(
            ErrorOrigin::Query,
            "at least one resources[_S] parameter is required",
        ));
    }

    Ok(CandidateRequest {
        groups: groups.into_values().collect(),
        same_subtree,
        group_policy,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_suffixed_groups_and_same_subtree() {
        let req = parse(&entries(&[
            ("resources_COMPUTE", "VCPU:1"),
            ("resources_ACCEL", "CUSTOM_FPGA:1"),
            ("same_subtree", "_COMPUTE,_ACCEL"),
            ("group_policy", "none"),
        ]))
        .unwrap();
        assert_eq!(req.groups.len(), 2);
        assert_eq!(req.same_subtree, vec![vec!["COMPUTE".to_string(), "ACCEL".to_string()]]);
    }

    #[test]
    fn rejects_unrecognized_key() {
        assert!(parse(&entries(&[("bogus", "1")])).is_err());
    }
}
