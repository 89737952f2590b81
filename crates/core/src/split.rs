//! Splitting a known part off a combined condition.
//!
//! Merging two conditional grants on one function produces `Or(c1, c2)`, which normalization
//! may push deep into the tree. Splitting inverts that: given the combined condition and one
//! of the merged parts, it returns what is left, so that
//! `normalize(Or(split, remainder)) == normalize(combined)`.

use crate::condition::{Condition, ConditionId, ConditionNode, NormalizedCondition, Operator};
use crate::normalize::{Draft, normalize, normalize_and, normalize_node, normalize_or};
use crate::result::{Error, Result};
use std::collections::HashSet;
use tracing::trace;

/// Splits `split` off `combined`, returning the remainder, or `None` if nothing remains.
///
/// Fails with [`Error::InconsistentStructure`] if `split` is not a structural part of
/// `combined`.
pub fn split_condition(
    combined: &Condition,
    split: &Condition,
) -> Result<Option<NormalizedCondition>> {
    split_normalized(&normalize(combined)?, &normalize(split)?)
}

/// Same as [`split_condition`] for conditions that are already normalized.
pub fn split_normalized(
    combined: &NormalizedCondition,
    split: &NormalizedCondition,
) -> Result<Option<NormalizedCondition>> {
    if combined.id() == split.id() {
        return Ok(None);
    }

    if combined.operator() == Operator::Or {
        return split_branches(combined, split).map(Some);
    }

    if combined.operator() != split.operator() || combined.param_type() != split.param_type() {
        return Err(Error::InconsistentStructure(format!(
            "cannot split {:?}/{:?} off {:?}/{:?}",
            split.operator(),
            split.param_type(),
            combined.operator(),
            combined.param_type()
        )));
    }

    match combined.operator() {
        Operator::And => split_and(combined, split).map(Some),
        _ if !combined.children().is_empty() => split_positional(combined, split).map(Some),
        op => Err(Error::InconsistentStructure(format!(
            "{op:?} leaves {} and {} differ and cannot be split",
            combined.id(),
            split.id()
        ))),
    }
}

/// Removes the split's branches from the combined `Or`.
fn split_branches(
    combined: &NormalizedCondition,
    split: &NormalizedCondition,
) -> Result<NormalizedCondition> {
    let removed: &[NormalizedCondition] = if split.operator() == Operator::Or {
        split.children()
    } else {
        std::slice::from_ref(split)
    };

    let combined_ids: HashSet<ConditionId> =
        combined.children().iter().map(NormalizedCondition::id).collect();
    if let Some(missing) = removed.iter().find(|b| !combined_ids.contains(&b.id())) {
        return Err(Error::InconsistentStructure(format!(
            "branch {} is not part of the combined Or {}",
            missing.id(),
            combined.id()
        )));
    }

    let removed_ids: HashSet<ConditionId> = removed.iter().map(NormalizedCondition::id).collect();
    let mut remaining: Vec<NormalizedCondition> = combined
        .children()
        .iter()
        .filter(|branch| !removed_ids.contains(&branch.id()))
        .cloned()
        .collect();

    trace!(
        "split {} of {} Or branches, {} remain",
        removed.len(),
        combined.children().len(),
        remaining.len()
    );

    match remaining.len() {
        0 => Err(Error::InvariantViolation(format!(
            "split {} removed every branch of {} without being equal to it",
            split.id(),
            combined.id()
        ))),
        1 => remaining.pop().ok_or_else(|| {
            Error::InvariantViolation("remaining branch disappeared".into())
        }),
        _ => normalize_or(remaining),
    }
}

/// Exactly one child of each `And` may differ; that pair is split recursively.
fn split_and(
    combined: &NormalizedCondition,
    split: &NormalizedCondition,
) -> Result<NormalizedCondition> {
    let combined_ids: HashSet<ConditionId> =
        combined.children().iter().map(NormalizedCondition::id).collect();
    let split_ids: HashSet<ConditionId> =
        split.children().iter().map(NormalizedCondition::id).collect();

    let combined_only: Vec<&NormalizedCondition> = combined
        .children()
        .iter()
        .filter(|c| !split_ids.contains(&c.id()))
        .collect();
    let split_only: Vec<&NormalizedCondition> = split
        .children()
        .iter()
        .filter(|c| !combined_ids.contains(&c.id()))
        .collect();

    let (&[combined_child], &[split_child]) = (combined_only.as_slice(), split_only.as_slice())
    else {
        return Err(Error::InconsistentStructure(format!(
            "And branches differ in {} and {} places, expected exactly one",
            combined_only.len(),
            split_only.len()
        )));
    };

    let remainder = split_differing_child(combined_child, split_child)?;
    let children = combined
        .children()
        .iter()
        .map(|child| {
            if child.id() == combined_child.id() {
                remainder.clone()
            } else {
                child.clone()
            }
        })
        .collect();
    normalize_and(children)
}

/// `Matches` and array nodes: children are positional and exactly one may differ.
fn split_positional(
    combined: &NormalizedCondition,
    split: &NormalizedCondition,
) -> Result<NormalizedCondition> {
    if combined.children().len() != split.children().len()
        || combined.comp_value() != split.comp_value()
    {
        return Err(Error::InconsistentStructure(format!(
            "{:?} nodes {} and {} have different shapes",
            combined.operator(),
            combined.id(),
            split.id()
        )));
    }

    let mut differing = combined
        .children()
        .iter()
        .zip(split.children())
        .enumerate()
        .filter(|(_, (c, s))| c.id() != s.id());
    let Some((index, (combined_child, split_child))) = differing.next() else {
        return Err(Error::InvariantViolation(format!(
            "{} and {} differ but none of their children do",
            combined.id(),
            split.id()
        )));
    };
    if differing.next().is_some() {
        return Err(Error::InconsistentStructure(format!(
            "{:?} children differ in more than one position",
            combined.operator()
        )));
    }

    let remainder = split_differing_child(combined_child, split_child)?;
    let mut draft = Draft::reopen(combined);
    draft.children[index] = remainder;
    trace!("split {:?} child {}", combined.operator(), index);
    normalize_node(draft)
}

fn split_differing_child(
    combined: &NormalizedCondition,
    split: &NormalizedCondition,
) -> Result<NormalizedCondition> {
    split_normalized(combined, split)?.ok_or_else(|| {
        Error::InvariantViolation(format!(
            "children {} and {} differ but split to nothing",
            combined.id(),
            split.id()
        ))
    })
}
