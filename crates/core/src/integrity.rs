//! Structural integrity checks for condition trees.
//!
//! The contract rejects conditions whose shape it cannot decode or evaluate. These checks
//! catch the same mistakes before any call is built: operators paired with parameter types
//! they cannot evaluate, missing or malformed comparison values, and children of one
//! composite node resolving to incompatible types.

use crate::condition::{Condition, ConditionNode, Operator, ParameterType};
use crate::result::{Error, Result};

/// Upper bound on `ArraySubset` children imposed by the contract's 256-bit bitmap.
const MAX_ARRAY_SUBSET_CHILDREN: usize = 256;

/// Checks a condition that is scoped to a function: the tree must be sound and the root must
/// resolve to `AbiEncoded`.
pub fn check_root_condition_integrity(condition: &Condition) -> Result<()> {
    let root_type = condition.resolved_param_type();
    if root_type != ParameterType::AbiEncoded {
        return Err(Error::StructuralViolation(format!(
            "root param type must be AbiEncoded, got {root_type:?}"
        )));
    }
    check_condition_integrity(condition)
}

/// Recursively checks operator rules and children type consistency.
pub fn check_condition_integrity(condition: &Condition) -> Result<()> {
    check_operator(condition)?;
    check_consistent_children_types(condition)?;
    condition
        .children
        .iter()
        .try_for_each(check_condition_integrity)
}

fn check_operator(condition: &Condition) -> Result<()> {
    use ParameterType as P;

    let op = condition.operator;
    let param_type = condition.param_type;
    let children = condition.children.len();
    let comp_value = condition.comp_value.as_deref().filter(|v| !v.is_empty());

    let violation =
        |msg: String| -> Result<()> { Err(Error::StructuralViolation(format!("{op:?}: {msg}"))) };
    let expect_types = |allowed: &[ParameterType]| -> Result<()> {
        if allowed.contains(&param_type) {
            Ok(())
        } else {
            violation(format!("unsupported param type {param_type:?}"))
        }
    };

    if !op.has_comp_value() && comp_value.is_some() {
        return violation("must not have a compValue".into());
    }
    if op.has_comp_value() && comp_value.is_none() {
        return violation("requires a compValue".into());
    }
    if op.requires_word_comp_value() && comp_value.is_some_and(|v| v.len() != 32) {
        return violation("compValue must be exactly 32 bytes".into());
    }

    match op {
        Operator::Pass => Ok(()),
        Operator::And | Operator::Or | Operator::Nor => {
            expect_types(&[P::None])?;
            if children == 0 {
                return violation("requires at least one child".into());
            }
            Ok(())
        }
        Operator::Matches => {
            expect_types(&[P::Tuple, P::Array, P::Calldata, P::AbiEncoded])?;
            if children == 0 {
                return violation("requires at least one child".into());
            }
            Ok(())
        }
        Operator::ArraySome | Operator::ArrayEvery => {
            expect_types(&[P::Array])?;
            if children != 1 {
                return violation(format!("requires exactly one child, got {children}"));
            }
            Ok(())
        }
        Operator::ArraySubset => {
            expect_types(&[P::Array])?;
            if children == 0 || children > MAX_ARRAY_SUBSET_CHILDREN {
                return violation(format!(
                    "requires between 1 and {MAX_ARRAY_SUBSET_CHILDREN} children, got {children}"
                ));
            }
            Ok(())
        }
        Operator::EqualToAvatar => expect_types(&[P::Static]),
        Operator::EqualTo => {
            expect_types(&[P::Static, P::Dynamic, P::Dynamic32, P::Tuple, P::Array])?;
            // collapsed static tuples compare several words at once
            if param_type == P::Static && comp_value.is_some_and(|v| v.len() % 32 != 0) {
                return violation("compValue of a static value must be whole 32-byte words".into());
            }
            Ok(())
        }
        Operator::GreaterThan
        | Operator::LessThan
        | Operator::SignedIntGreaterThan
        | Operator::SignedIntLessThan
        | Operator::WithinAllowance => expect_types(&[P::Static]),
        Operator::Bitmask => expect_types(&[P::Static, P::Dynamic]),
        Operator::Custom => Ok(()),
        Operator::EtherWithinAllowance | Operator::CallWithinAllowance => {
            expect_types(&[P::None])
        }
    }
}

/// Branches of a logical node and elements of an array must resolve to one type. Children
/// resolving to `None` are ignored. `Dynamic` may mix with `Calldata`/`AbiEncoded`, which
/// are decoded out of dynamic bytes.
fn check_consistent_children_types(condition: &Condition) -> Result<()> {
    if !condition.operator.is_logical() && condition.param_type != ParameterType::Array {
        return Ok(());
    }

    let mut resolved = condition
        .children
        .iter()
        .map(Condition::resolved_param_type)
        .filter(|t| *t != ParameterType::None);
    let Some(mut expected) = resolved.next() else {
        return Ok(());
    };

    for actual in resolved {
        if actual == expected {
            continue;
        }
        match (expected, actual) {
            (ParameterType::Dynamic, t) if t.is_embedded_calldata() => expected = t,
            (t, ParameterType::Dynamic) if t.is_embedded_calldata() => {}
            (a, b) => {
                return Err(Error::StructuralViolation(format!(
                    "mixed children types {a:?} and {b:?} under {:?}",
                    condition.operator
                )));
            }
        }
    }
    Ok(())
}
