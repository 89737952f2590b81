//! Differences between two permission snapshots, as targets and as calls.

use crate::calls::{Call, grant, revoke};
use crate::permission::Permission;
use crate::result::Result;
use crate::target::{Clearance, FunctionKey, Target, check_targets_integrity, targets_from_permissions};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Calls revoking what is no longer wanted and granting what is new.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CallDiff {
    pub minus: Vec<Call>,
    pub plus: Vec<Call>,
}

impl CallDiff {
    /// `minus` followed by `plus`, the order they have to be executed in.
    pub fn into_calls(self) -> Vec<Call> {
        let mut calls = self.minus;
        calls.extend(self.plus);
        calls
    }

    pub fn is_empty(&self) -> bool {
        self.minus.is_empty() && self.plus.is_empty()
    }
}

/// What `next` has that `prev` does not.
///
/// A target that is new or scoped differently is returned whole. For a target scoped the
/// same way in both, only its functions missing from `prev` are returned, compared by
/// selector, wildcarding, execution options and normalized condition.
pub fn diff_targets(prev: &[Target], next: &[Target]) -> Result<Vec<Target>> {
    let mut diff = Vec::new();

    for target in next {
        let Some(previous) = prev.iter().find(|p| p.address == target.address) else {
            diff.push(target.clone());
            continue;
        };
        if !previous.same_scope(target) {
            diff.push(target.clone());
            continue;
        }
        if target.clearance != Clearance::Function {
            continue;
        }

        let known = previous
            .functions
            .iter()
            .map(|f| f.key())
            .collect::<Result<HashSet<FunctionKey>>>()?;
        let mut functions = Vec::new();
        for function in &target.functions {
            if !known.contains(&function.key()?) {
                functions.push(function.clone());
            }
        }
        if !functions.is_empty() {
            diff.push(Target {
                functions,
                ..target.clone()
            });
        }
    }

    Ok(diff)
}

/// Calls moving a role from the `prev` targets to the `next` targets.
///
/// `minus` revokes what only `prev` has, `plus` grants what only `next` has.
pub fn diff_role(prev: &[Target], next: &[Target]) -> Result<CallDiff> {
    check_targets_integrity(prev)?;
    check_targets_integrity(next)?;

    let diff = CallDiff {
        minus: revoke(&diff_targets(next, prev)?),
        plus: grant(&diff_targets(prev, next)?),
    };
    debug!(
        "role diff: {} revoking and {} granting calls",
        diff.minus.len(),
        diff.plus.len()
    );
    Ok(diff)
}

/// Like [`diff_role`], starting from permission intents.
pub fn diff_permissions(prev: &[Permission], next: &[Permission]) -> Result<CallDiff> {
    diff_role(
        &targets_from_permissions(prev)?,
        &targets_from_permissions(next)?,
    )
}
