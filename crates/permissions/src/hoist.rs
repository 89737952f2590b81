//! Choosing the stored representation of a condition.
//!
//! Conditions are deduplicated on-chain by id, and equivalent conditions may be stored
//! under different ids depending on where their `Or`s sit. Given a reference set of
//! permissions (probes), the representation whose branches line up with the most probes
//! is preferred.

use crate::includes::permission_includes;
use crate::permission::Permission;
use crate::result::Result;
use rolekit_core::{ConditionNode, NormalizedCondition, Operator, hoist_condition, hoist_top_ors, normalize};
use tracing::{debug, trace};

/// Picks the representation of the permission's condition to store.
///
/// Without probes this is the normal form. With probes, the normal form and each hoisted
/// candidate are scored, and a candidate only replaces the normal form with a strictly
/// higher score. Candidates that cannot be built are skipped. Returns `None` for
/// permissions without a condition.
pub fn maybe_hoist(
    permission: &Permission,
    probes: Option<&[Permission]>,
) -> Result<Option<NormalizedCondition>> {
    let Some(condition) = &permission.condition else {
        return Ok(None);
    };
    let naive = normalize(condition)?;
    let Some(probes) = probes.filter(|probes| !probes.is_empty()) else {
        return Ok(Some(naive));
    };

    let mut candidates = Vec::new();
    match hoist_condition(&naive) {
        Ok(candidate) => candidates.push(candidate),
        Err(err) => debug!("skipping fully hoisted form of {}: {}", naive.id(), err),
    }
    match hoist_top_ors(&naive) {
        Ok(hoisted) => candidates.extend(hoisted),
        Err(err) => debug!("skipping single Or hoists of {}: {}", naive.id(), err),
    }

    let mut best_score = score(permission, &naive, probes)?;
    let mut best = naive;
    for candidate in candidates {
        if candidate.id() == best.id() {
            continue;
        }
        let candidate_score = score(permission, &candidate, probes)?;
        trace!("hoisted candidate {} scores {}", candidate.id(), candidate_score);
        if candidate_score > best_score {
            best_score = candidate_score;
            best = candidate;
        }
    }

    debug!("picked {} with {} probe matches", best.id(), best_score);
    Ok(Some(best))
}

/// Number of probes including at least one branch of `form`.
fn score(
    permission: &Permission,
    form: &NormalizedCondition,
    probes: &[Permission],
) -> Result<usize> {
    let branches = if form.operator() == Operator::Or {
        form.children()
    } else {
        std::slice::from_ref(form)
    };

    let narrowed: Vec<Permission> = branches
        .iter()
        .map(|branch| Permission {
            condition: Some(branch.to_condition()),
            ..permission.clone()
        })
        .collect();

    let mut score = 0;
    for probe in probes {
        for branch in &narrowed {
            if permission_includes(probe, branch)? {
                score += 1;
                break;
            }
        }
    }
    Ok(score)
}
