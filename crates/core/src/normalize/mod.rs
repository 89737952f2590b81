//! Canonicalization of condition trees.
//!
//! Normalization runs bottom-up. Every step receives a node whose children are already in
//! normal form and produces a new node; the input tree is never touched. Two conditions
//! that only differ in ways the steps normalize away (nesting of logical nodes, duplicate
//! or reordered branches, trailing `Pass` children, redundant tuple structure, `Or`s that
//! can be pushed into a shared structure) end up with the same [`ConditionId`].

mod push_down;

use crate::condition::{
    Condition, ConditionId, ConditionNode, NormalizedCondition, Operator, ParameterType,
};
use crate::hex_bytes::HexBytes;
use crate::result::Result;
use std::collections::HashSet;

/// Rewrites a condition into its normal form.
pub fn normalize(condition: &Condition) -> Result<NormalizedCondition> {
    let children = condition
        .children
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;

    normalize_node(Draft::new(
        condition.param_type,
        condition.operator,
        condition.comp_value.clone(),
        children,
    ))
}

/// Normalizes `Or(branches...)` without renormalizing the branches themselves.
pub fn normalize_or(branches: Vec<NormalizedCondition>) -> Result<NormalizedCondition> {
    normalize_node(Draft::logical(Operator::Or, branches))
}

/// Normalizes `And(branches...)` without renormalizing the branches themselves.
pub fn normalize_and(branches: Vec<NormalizedCondition>) -> Result<NormalizedCondition> {
    normalize_node(Draft::logical(Operator::And, branches))
}

/// Builds an `Or` over already normalized branches, deduplicated and ordered like a normal
/// form but without pushing it down into the branches. A single remaining branch is
/// returned as is.
pub(crate) fn seal_hoisted_or(branches: Vec<NormalizedCondition>) -> Result<NormalizedCondition> {
    let draft = flatten_nested_branches(Draft::logical(Operator::Or, branches));
    let draft = dedupe_branches(draft);
    match unwrap_single_branch(draft) {
        Unwrapped::Child(child) => Ok(child),
        Unwrapped::Node(draft) => order_branches(draft).seal(),
    }
}

/// A node under construction: children normalized, the node itself not yet.
#[derive(Clone, Debug)]
pub(crate) struct Draft {
    pub(crate) param_type: ParameterType,
    pub(crate) operator: Operator,
    pub(crate) comp_value: Option<HexBytes>,
    pub(crate) children: Vec<NormalizedCondition>,
}

impl Draft {
    pub(crate) fn new(
        param_type: ParameterType,
        operator: Operator,
        comp_value: Option<HexBytes>,
        children: Vec<NormalizedCondition>,
    ) -> Self {
        Self {
            param_type,
            operator,
            // an empty compValue is the same as none at all
            comp_value: comp_value.filter(|value| !value.is_empty()),
            children,
        }
    }

    pub(crate) fn logical(operator: Operator, children: Vec<NormalizedCondition>) -> Self {
        Self::new(ParameterType::None, operator, None, children)
    }

    /// Reopens a normalized node, e.g. to swap one of its children.
    pub(crate) fn reopen(node: &NormalizedCondition) -> Self {
        let (param_type, operator, comp_value, children) = node.clone().into_parts();
        Self::new(param_type, operator, comp_value, children)
    }

    fn seal(self) -> Result<NormalizedCondition> {
        NormalizedCondition::seal(
            self.param_type,
            self.operator,
            self.comp_value,
            self.children,
        )
    }
}

enum Unwrapped {
    Node(Draft),
    Child(NormalizedCondition),
}

/// Runs the normalization pipeline on a node whose children are normalized.
pub(crate) fn normalize_node(draft: Draft) -> Result<NormalizedCondition> {
    let draft = collapse_static_tuple(draft);
    let draft = prune_trailing_pass(draft);
    let draft = flatten_nested_branches(draft);
    let draft = dedupe_branches(draft);
    let draft = match unwrap_single_branch(draft) {
        Unwrapped::Child(child) => return Ok(child),
        Unwrapped::Node(draft) => draft,
    };

    if let Some(pushed) = push_down::push_down_or(&draft)? {
        return Ok(pushed);
    }

    order_branches(draft).seal()
}

/// A `Pass`/`EqualTo` tuple of static fields is itself just a static value.
fn collapse_static_tuple(draft: Draft) -> Draft {
    let collapsible = draft.param_type == ParameterType::Tuple
        && matches!(draft.operator, Operator::Pass | Operator::EqualTo)
        && draft
            .children
            .iter()
            .all(|child| child.param_type() == ParameterType::Static);
    if !collapsible {
        return draft;
    }

    Draft::new(
        ParameterType::Static,
        draft.operator,
        draft.comp_value,
        Vec::new(),
    )
}

/// Drops trailing `Pass` children of `Matches` nodes where they add no matching power.
///
/// Calldata and ABI encoded arguments are decoded by position, so trailing unchecked
/// parameters can go. At least one child always remains. Dynamic tuples keep every field
/// up to and including their first dynamic field, which is what makes them dynamic.
fn prune_trailing_pass(mut draft: Draft) -> Draft {
    if draft.operator != Operator::Matches {
        return draft;
    }

    let keep_at_least = match draft.param_type {
        ParameterType::Calldata | ParameterType::AbiEncoded => 1,
        ParameterType::Tuple => match draft.children.iter().position(|c| !c.is_inline()) {
            Some(first_dynamic) => first_dynamic + 1,
            None => return draft,
        },
        _ => return draft,
    };

    let last_checked = draft
        .children
        .iter()
        .rposition(|child| child.operator() != Operator::Pass)
        .map_or(0, |index| index + 1);

    draft.children.truncate(keep_at_least.max(last_checked));
    draft
}

/// `And(And(a, b), c)` becomes `And(a, b, c)`; same for `Or`. `Nor` is left alone.
fn flatten_nested_branches(mut draft: Draft) -> Draft {
    if !matches!(draft.operator, Operator::And | Operator::Or) {
        return draft;
    }
    if !draft.children.iter().any(|c| c.operator() == draft.operator) {
        return draft;
    }

    let operator = draft.operator;
    draft.children = draft
        .children
        .into_iter()
        .flat_map(|child| {
            if child.operator() == operator {
                let (_, _, _, grandchildren) = child.into_parts();
                grandchildren
            } else {
                vec![child]
            }
        })
        .collect();
    draft
}

fn dedupe_branches(mut draft: Draft) -> Draft {
    if !draft.operator.is_logical() {
        return draft;
    }

    let mut seen: HashSet<ConditionId> = HashSet::with_capacity(draft.children.len());
    draft.children.retain(|child| seen.insert(child.id()));
    draft
}

/// Single-branch `And`/`Or` nodes collapse into the branch. A lone `Nor` branch still
/// negates, so it stays.
fn unwrap_single_branch(mut draft: Draft) -> Unwrapped {
    if matches!(draft.operator, Operator::And | Operator::Or)
        && draft.children.len() == 1
        && let Some(child) = draft.children.pop()
    {
        return Unwrapped::Child(child);
    }
    Unwrapped::Node(draft)
}

/// Sorts logical branches by id, then moves branches that carry their own calldata subtree
/// to the front. The sort is stable, so the id order holds within both groups.
fn order_branches(mut draft: Draft) -> Draft {
    if !draft.operator.is_logical() {
        return draft;
    }

    draft.children.sort_by_key(NormalizedCondition::id);
    let (mut ordered, rest): (Vec<_>, Vec<_>) = draft
        .children
        .into_iter()
        .partition(|child| child.param_type().is_embedded_calldata());
    ordered.extend(rest);
    draft.children = ordered;
    draft
}
