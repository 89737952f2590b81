//! Hoisting `Or` nodes towards the root.
//!
//! The opposite direction of the push-down done during normalization:
//!
//! ```text
//! Matches(a, Or(b, c))  ->  Or(Matches(a, b), Matches(a, c))
//! And(a, Or(b, c))      ->  Or(And(a, b), And(a, c))
//! ```
//!
//! Both shapes match exactly the same calldata, but they are stored under different ids.
//! Hoisted forms are sealed without pushing the top-level `Or` back down, since that would
//! undo the rewrite.

use crate::condition::{ConditionNode, NormalizedCondition, Operator};
use crate::normalize::{Draft, normalize_node, seal_hoisted_or};
use crate::result::{Error, Result};
use tracing::trace;

/// Most branches a hoisted `Or` can have and still be packed.
const MAX_HOISTED_BRANCHES: usize = 255;

/// Hoists every `Or` nested in `Matches`/`And` structure up to a single top-level `Or`.
///
/// Several `Or` children of one node are distributed into their cartesian product.
/// Negations and array quantifiers are opaque: `Or`s below them stay where they are. A
/// condition without a hoistable `Or` is returned unchanged. Fails when the product has
/// more branches than a packed condition can hold.
pub fn hoist_condition(condition: &NormalizedCondition) -> Result<NormalizedCondition> {
    let branches = hoisted_branches(condition)?;
    if branches.len() < 2 {
        return Ok(condition.clone());
    }
    trace!("hoisted {} into {} Or branches", condition.id(), branches.len());
    seal_hoisted_or(branches)
}

/// For a `Matches` node, one candidate per `Or` child with exactly that `Or` hoisted.
///
/// Returns no candidates for any other node.
pub fn hoist_top_ors(condition: &NormalizedCondition) -> Result<Vec<NormalizedCondition>> {
    if condition.operator() != Operator::Matches {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for (index, child) in condition.children().iter().enumerate() {
        if child.operator() != Operator::Or {
            continue;
        }
        let branches = child
            .children()
            .iter()
            .map(|alternative| {
                let mut draft = Draft::reopen(condition);
                draft.children[index] = alternative.clone();
                normalize_node(draft)
            })
            .collect::<Result<Vec<_>>>()?;
        trace!("hoisted Or at child {} of {}", index, condition.id());
        candidates.push(seal_hoisted_or(branches)?);
    }
    Ok(candidates)
}

/// The `Or`-free alternatives a node expands into.
fn hoisted_branches(node: &NormalizedCondition) -> Result<Vec<NormalizedCondition>> {
    match node.operator() {
        Operator::Or => {
            let mut branches = Vec::new();
            for child in node.children() {
                branches.extend(hoisted_branches(child)?);
            }
            Ok(branches)
        }
        Operator::Matches | Operator::And => distribute(node),
        _ => Ok(vec![node.clone()]),
    }
}

/// Rebuilds `node` once for every combination of its children's alternatives.
fn distribute(node: &NormalizedCondition) -> Result<Vec<NormalizedCondition>> {
    let alternatives = node
        .children()
        .iter()
        .map(hoisted_branches)
        .collect::<Result<Vec<_>>>()?;
    if alternatives.iter().all(|a| a.len() == 1) {
        return Ok(vec![node.clone()]);
    }
    let product = alternatives
        .iter()
        .try_fold(1usize, |n, a| n.checked_mul(a.len()))
        .filter(|&n| n <= MAX_HOISTED_BRANCHES);
    if product.is_none() {
        return Err(Error::StructuralViolation(format!(
            "hoisting {} would exceed {} Or branches",
            node.id(),
            MAX_HOISTED_BRANCHES
        )));
    }

    let mut combinations: Vec<Vec<NormalizedCondition>> = vec![Vec::new()];
    for options in &alternatives {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |option| {
                    let mut combination = prefix.clone();
                    combination.push(option.clone());
                    combination
                })
            })
            .collect();
    }

    combinations
        .into_iter()
        .map(|children| {
            let mut draft = Draft::reopen(node);
            draft.children = children;
            normalize_node(draft)
        })
        .collect()
}
