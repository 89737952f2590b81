//! Inclusion between permissions.
//!
//! A condition includes another when adding the other as an alternative does not change
//! its normal form: `normalize(Or(a, b)) == normalize(a)`.

use crate::permission::Permission;
use crate::result::Result;
use rolekit_core::{Condition, NormalizedCondition, normalize, normalize_or};

/// Whether `p1` already grants everything `p2` grants.
pub fn permission_includes(p1: &Permission, p2: &Permission) -> Result<bool> {
    if p1.target_address != p2.target_address {
        return Ok(false);
    }
    if (p2.send && !p1.send) || (p2.delegatecall && !p1.delegatecall) {
        return Ok(false);
    }

    match (p1.selector, p2.selector) {
        (None, None) => Ok(true),
        (Some(s1), Some(s2)) if s1 == s2 => match (&p1.condition, &p2.condition) {
            (None, _) => Ok(true),
            (Some(_), None) => Ok(false),
            (Some(c1), Some(c2)) => condition_includes(c1, c2),
        },
        _ => Ok(false),
    }
}

/// Whether every calldata matching `c2` also matches `c1`, as far as normalization can tell.
pub fn condition_includes(c1: &Condition, c2: &Condition) -> Result<bool> {
    normalized_includes(&normalize(c1)?, &normalize(c2)?)
}

pub fn normalized_includes(c1: &NormalizedCondition, c2: &NormalizedCondition) -> Result<bool> {
    if c1.id() == c2.id() {
        return Ok(true);
    }
    let combined = normalize_or(vec![c1.clone(), c2.clone()])?;
    Ok(combined.id() == c1.id())
}
