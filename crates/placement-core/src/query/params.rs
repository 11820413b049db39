use crate::{
    error::{Error, ErrorOrigin},
    index::{AggregateFilter, TraitFilter},
};
use placement_primitives::{AggregateId, ResourceClass, TraitName};
use std::{collections::BTreeMap, collections::BTreeSet, str::FromStr};

/// Parse `RC:N,RC:N,...` into a resource-class → amount map.
pub(crate) fn parse_resources(value: &str) -> Result<BTreeMap<ResourceClass, u32>, Error> {
    let mut out = BTreeMap::new();
    for token in value.split(',').filter(|t| !t.is_empty()) {
        let (rc, amount) = token
            .split_once(':')
            .ok_or_else(|| Error::bad_value(ErrorOrigin::Query, format!("malformed resources entry {token:?}")))?;
        let rc = ResourceClass::from_str(rc)?;
        let amount: u32 = amount
            .parse()
            .map_err(|_| Error::bad_value(ErrorOrigin::Query, format!("malformed resource amount {amount:?}")))?;
        out.insert(rc, amount);
    }
    Ok(out)
}

/// Parse the `required[_S]` grammar (§6): comma = AND, `!` = forbidden,
/// `&` within a token (optionally prefixed `in:`) = an any-of group.
pub(crate) fn parse_required(value: &str) -> Result<TraitFilter, Error> {
    let mut filter = TraitFilter::default();
    for token in value.split(',').filter(|t| !t.is_empty()) {
        if let Some(rest) = token.strip_prefix('!') {
            filter.forbidden.insert(TraitName::from_str(rest)?);
        } else {
            let body = token.strip_prefix("in:").unwrap_or(token);
            if body.contains('&') {
                let group = body
                    .split('&')
                    .map(TraitName::from_str)
                    .collect::<Result<BTreeSet<_>, _>>()?;
                filter.any_of.push(group);
            } else if token.starts_with("in:") {
                filter.any_of.push(BTreeSet::from([TraitName::from_str(body)?]));
            } else {
                filter.required.insert(TraitName::from_str(body)?);
            }
        }
    }
    Ok(filter)
}

/// Parse the `member_of[_S]` grammar (§6): comma = AND of OR-groups, `&`
/// (optionally prefixed `in:` on the first member) joins aggregates in an
/// OR-group.
pub(crate) fn parse_member_of(value: &str) -> Result<AggregateFilter, Error> {
    let mut filter = AggregateFilter::default();
    for token in value.split(',').filter(|t| !t.is_empty()) {
        let token = token.strip_prefix("in:").unwrap_or(token);
        let group = token
            .split('&')
            .map(AggregateId::from_str)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .collect::<BTreeSet<_>>();
        filter.member_of.push(group);
    }
    Ok(filter)
}

/// Parse one `same_subtree` value into its list of referenced suffixes
/// (leading `_` stripped; an empty token stays empty so validation can
/// reject it as referencing the unsuffixed group).
pub(crate) fn parse_same_subtree(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.strip_prefix('_').unwrap_or(t).to_string())
        .collect()
}

/// Split a recognized base key (`resources`, `required`, `member_of`) and
/// its suffix out of a raw query key, e.g. `resources_COMPUTE` -> `("resources", "COMPUTE")`.
pub(crate) fn split_suffix<'a>(key: &'a str, base: &str) -> Option<&'a str> {
    if key == base {
        Some("")
    } else {
        key.strip_prefix(base)?.strip_prefix('_')
    }
}
