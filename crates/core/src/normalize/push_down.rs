//! Pushes `Or` nodes down into the structure their branches share.
//!
//! ```text
//! Or(Matches(a, b, c), Matches(a, b, d))  ->  Matches(a, b, Or(c, d))
//! Or(And(a, b, c), And(a, b, d))          ->  And(a, b, Or(c, d))
//! Or(And(a, b), And(a, b, c))             ->  And(a, b)
//! ```
//!
//! A rewrite only applies when every branch has the same top operator and the branches
//! differ in exactly one place (the hinge). Anything else is left as it is. Results are
//! renormalized, which may cascade into further push-downs one level deeper.

use super::{Draft, normalize_node};
use crate::condition::{ConditionId, ConditionNode, NormalizedCondition, Operator};
use crate::result::Result;
use std::collections::HashSet;
use tracing::trace;

/// Returns the pushed-down normal form, or `None` when the rewrite does not apply.
pub(super) fn push_down_or(draft: &Draft) -> Result<Option<NormalizedCondition>> {
    if draft.operator != Operator::Or || draft.children.len() < 2 {
        return Ok(None);
    }

    let operator = draft.children[0].operator();
    if !draft.children.iter().all(|b| b.operator() == operator) {
        return Ok(None);
    }

    match operator {
        Operator::Matches => push_down_matches(&draft.children),
        Operator::And => push_down_and(&draft.children),
        _ => Ok(None),
    }
}

fn push_down_matches(branches: &[NormalizedCondition]) -> Result<Option<NormalizedCondition>> {
    let Some(hinge) = find_matches_hinge(branches) else {
        return Ok(None);
    };

    let alternatives = branches
        .iter()
        .map(|branch| branch.children()[hinge].clone())
        .collect();
    let pushed = normalize_node(Draft::logical(Operator::Or, alternatives))?;

    let mut shared = Draft::reopen(&branches[0]);
    shared.children[hinge] = pushed;

    trace!(
        "pushed Or over {} Matches branches down to child {}",
        branches.len(),
        hinge
    );
    normalize_node(shared).map(Some)
}

/// Index of the only child position at which the `Matches` branches differ.
fn find_matches_hinge(branches: &[NormalizedCondition]) -> Option<usize> {
    let first = branches.first()?;
    let same_shape = branches.iter().all(|branch| {
        branch.param_type() == first.param_type()
            && branch.comp_value() == first.comp_value()
            && branch.children().len() == first.children().len()
    });
    if !same_shape {
        return None;
    }

    let mut differing = (0..first.children().len()).filter(|&index| {
        let expected = first.children()[index].id();
        branches
            .iter()
            .any(|branch| branch.children()[index].id() != expected)
    });
    let hinge = differing.next()?;
    if differing.next().is_some() {
        return None;
    }
    Some(hinge)
}

fn push_down_and(branches: &[NormalizedCondition]) -> Result<Option<NormalizedCondition>> {
    let Some((first, rest)) = branches.split_first() else {
        return Ok(None);
    };

    let common: Vec<NormalizedCondition> = first
        .children()
        .iter()
        .filter(|child| {
            rest.iter()
                .all(|branch| branch.children().iter().any(|c| c.id() == child.id()))
        })
        .cloned()
        .collect();
    if common.is_empty() {
        return Ok(None);
    }
    let common_ids: HashSet<ConditionId> = common.iter().map(NormalizedCondition::id).collect();

    // A branch without a child of its own (hinge -1) is exactly the common part, which every
    // other branch implies. The Or then reduces to that common part.
    let mut implied = false;
    let mut hinges = Vec::with_capacity(branches.len());
    for branch in branches {
        let mut extra = branch
            .children()
            .iter()
            .filter(|child| !common_ids.contains(&child.id()));
        match (extra.next(), extra.next()) {
            (None, _) => implied = true,
            (Some(hinge), None) => hinges.push(hinge.clone()),
            (Some(_), Some(_)) => return Ok(None),
        }
    }

    let mut children = common;
    if implied {
        trace!("Or over {} And branches implied by their common part", branches.len());
    } else {
        trace!("pushed Or over {} And branches into their hinges", branches.len());
        children.push(normalize_node(Draft::logical(Operator::Or, hinges))?);
    }

    normalize_node(Draft::logical(Operator::And, children)).map(Some)
}
