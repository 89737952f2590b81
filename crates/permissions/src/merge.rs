//! Folding overlapping permission intents into one permission per destination.
//!
//! Precedence when two permissions hit the same destination:
//!
//! | existing \ incoming | Allowed        | Wildcarded        | Conditional            |
//! |---------------------|----------------|-------------------|------------------------|
//! | Allowed             | keep           | Allowed, warn     | Allowed, warn          |
//! | Wildcarded          | Allowed, warn  | keep              | Wildcarded, warn       |
//! | Conditional         | Allowed, warn  | Wildcarded, warn  | `Or(c1, c2)` or keep   |
//!
//! Differing `send`/`delegatecall` flags are a violation and invalidate the whole merge.

use crate::permission::{Permission, PermissionKind, Selector};
use crate::result::Result;
use alloy_primitives::Address;
use rolekit_core::{normalize, normalize_or};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// A narrower grant absorbed by a broader one on the same destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeWarning {
    pub target_address: Address,
    pub selector: Option<Selector>,
    pub message: String,
}

/// Two permissions on the same destination that disagree on execution options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeViolation {
    pub target_address: Address,
    pub selector: Option<Selector>,
    pub message: String,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_destination(f, self.target_address, self.selector)?;
        write!(f, ": {}", self.message)
    }
}

impl fmt::Display for MergeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_destination(f, self.target_address, self.selector)?;
        write!(f, ": {}", self.message)
    }
}

fn write_destination(
    f: &mut fmt::Formatter<'_>,
    target_address: Address,
    selector: Option<Selector>,
) -> fmt::Result {
    match selector {
        Some(selector) => write!(f, "{target_address}.{selector}"),
        None => write!(f, "{target_address}"),
    }
}

/// Result of [`merge_permissions`].
///
/// Violations are reported as data so callers can surface all of them at once. Whenever
/// there is at least one, `permissions` is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub permissions: Vec<Permission>,
    pub warnings: Vec<MergeWarning>,
    pub violations: Vec<MergeViolation>,
}

impl MergeOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

enum Pairing {
    Merged(Permission, Option<String>),
    Violation(String),
}

/// Merges permissions left to right, keeping the order in which destinations first appear.
pub fn merge_permissions(permissions: &[Permission]) -> Result<MergeOutcome> {
    let mut outcome = MergeOutcome::default();

    for incoming in permissions {
        let collisions: Vec<usize> = outcome
            .permissions
            .iter()
            .enumerate()
            .filter(|(_, existing)| collides(existing, incoming))
            .map(|(index, _)| index)
            .collect();
        let Some((&first, rest)) = collisions.split_first() else {
            outcome.permissions.push(incoming.clone());
            continue;
        };

        // An allowed target collides with every function on it, so one incoming permission
        // may fold several existing entries into one.
        let mut merged = incoming.clone();
        let mut violated = false;
        for &index in &collisions {
            let existing = &outcome.permissions[index];
            match merge_pair(existing, &merged)? {
                Pairing::Merged(permission, note) => {
                    if let Some(message) = note {
                        let warning = MergeWarning {
                            target_address: incoming.target_address,
                            selector: existing.selector.or(incoming.selector),
                            message,
                        };
                        warn!("merge warning: {}", warning);
                        outcome.warnings.push(warning);
                    }
                    merged = permission;
                }
                Pairing::Violation(message) => {
                    let violation = MergeViolation {
                        target_address: incoming.target_address,
                        selector: existing.selector.or(incoming.selector),
                        message,
                    };
                    warn!("merge violation: {}", violation);
                    outcome.violations.push(violation);
                    violated = true;
                    break;
                }
            }
        }
        if violated {
            continue;
        }

        outcome.permissions[first] = merged;
        for &index in rest.iter().rev() {
            outcome.permissions.remove(index);
        }
    }

    debug!(
        "merged {} permissions into {} ({} warnings, {} violations)",
        permissions.len(),
        outcome.permissions.len(),
        outcome.warnings.len(),
        outcome.violations.len()
    );

    if !outcome.violations.is_empty() {
        outcome.permissions.clear();
    }
    Ok(outcome)
}

/// Same target, and either side allows the whole target or both name the same function.
fn collides(a: &Permission, b: &Permission) -> bool {
    a.target_address == b.target_address
        && match (a.selector, b.selector) {
            (Some(sa), Some(sb)) => sa == sb,
            _ => true,
        }
}

fn merge_pair(existing: &Permission, incoming: &Permission) -> Result<Pairing> {
    if existing.execution_options() != incoming.execution_options() {
        return Ok(Pairing::Violation(format!(
            "execution options {:?} and {:?} cannot be merged",
            existing.execution_options(),
            incoming.execution_options()
        )));
    }

    use PermissionKind::*;
    let pairing = match (existing.kind(), incoming.kind()) {
        (Allowed, Allowed) | (Wildcarded(_), Wildcarded(_)) => {
            Pairing::Merged(existing.clone(), None)
        }
        (Allowed, _) => Pairing::Merged(
            existing.clone(),
            Some("function permission absorbed by target-wide allowance".into()),
        ),
        (_, Allowed) => Pairing::Merged(
            incoming.clone(),
            Some("function permission absorbed by target-wide allowance".into()),
        ),
        (Wildcarded(_), Conditional(..)) => Pairing::Merged(
            existing.clone(),
            Some("condition absorbed by wildcarded function".into()),
        ),
        (Conditional(..), Wildcarded(_)) => Pairing::Merged(
            incoming.clone(),
            Some("condition absorbed by wildcarded function".into()),
        ),
        (Conditional(_, c1), Conditional(_, c2)) => {
            let n1 = normalize(c1)?;
            let n2 = normalize(c2)?;
            if n1.id() == n2.id() {
                Pairing::Merged(existing.clone(), None)
            } else {
                let combined = normalize_or(vec![n1, n2])?;
                Pairing::Merged(
                    Permission {
                        condition: Some(combined.to_condition()),
                        ..existing.clone()
                    },
                    None,
                )
            }
        }
    };
    Ok(pairing)
}
