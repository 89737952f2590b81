//! Edit intents against a role's on-chain permission state.
//!
//! Calls are produced here and encoded elsewhere; nothing in this crate executes them.

use crate::permission::{ExecutionOptions, Selector};
use crate::target::{Clearance, Target};
use alloy_primitives::Address;
use rolekit_core::Condition;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One contract entry point of the permission contract, with its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Call {
    AllowTarget {
        target: Address,
        execution_options: ExecutionOptions,
    },
    ScopeTarget {
        target: Address,
    },
    RevokeTarget {
        target: Address,
    },
    AllowFunction {
        target: Address,
        selector: Selector,
        execution_options: ExecutionOptions,
    },
    ScopeFunction {
        target: Address,
        selector: Selector,
        condition: Condition,
        execution_options: ExecutionOptions,
    },
    RevokeFunction {
        target: Address,
        selector: Selector,
    },
}

impl Call {
    pub fn target(&self) -> Address {
        match self {
            Self::AllowTarget { target, .. }
            | Self::ScopeTarget { target }
            | Self::RevokeTarget { target }
            | Self::AllowFunction { target, .. }
            | Self::ScopeFunction { target, .. }
            | Self::RevokeFunction { target, .. } => *target,
        }
    }

    /// Selector of function-level calls.
    pub fn selector(&self) -> Option<Selector> {
        match self {
            Self::AllowFunction { selector, .. }
            | Self::ScopeFunction { selector, .. }
            | Self::RevokeFunction { selector, .. } => Some(*selector),
            Self::AllowTarget { .. } | Self::ScopeTarget { .. } | Self::RevokeTarget { .. } => {
                None
            }
        }
    }

    /// Whether executing `self` after `earlier` leaves nothing of `earlier`'s effect.
    ///
    /// Allowing or revoking a target overrides everything done to it before. Scoping a
    /// target overrides earlier target-level calls. A function-level call overrides earlier
    /// calls on the same function.
    pub fn supersedes(&self, earlier: &Call) -> bool {
        if self.target() != earlier.target() {
            return false;
        }
        match self {
            Self::AllowTarget { .. } | Self::RevokeTarget { .. } => true,
            Self::ScopeTarget { .. } => earlier.selector().is_none(),
            Self::AllowFunction { selector, .. }
            | Self::ScopeFunction { selector, .. }
            | Self::RevokeFunction { selector, .. } => earlier.selector() == Some(*selector),
        }
    }
}

/// Calls that open up the targets as described.
///
/// Targets are expected to pass [`crate::check_targets_integrity`]; a function that is
/// neither wildcarded nor carries a condition is granted as wildcarded.
pub fn grant(targets: &[Target]) -> Vec<Call> {
    let mut calls = Vec::new();
    for target in targets {
        match target.clearance {
            Clearance::None => {}
            Clearance::Target => calls.push(Call::AllowTarget {
                target: target.address,
                execution_options: target.execution_options,
            }),
            Clearance::Function => {
                calls.push(Call::ScopeTarget {
                    target: target.address,
                });
                calls.extend(target.functions.iter().map(|function| {
                    match (function.wildcarded, &function.condition) {
                        (false, Some(condition)) => Call::ScopeFunction {
                            target: target.address,
                            selector: function.selector,
                            condition: condition.clone(),
                            execution_options: function.execution_options,
                        },
                        _ => Call::AllowFunction {
                            target: target.address,
                            selector: function.selector,
                            execution_options: function.execution_options,
                        },
                    }
                }));
            }
        }
    }
    calls
}

/// Calls that close the targets as described again.
pub fn revoke(targets: &[Target]) -> Vec<Call> {
    let mut calls = Vec::new();
    for target in targets {
        match target.clearance {
            Clearance::None => {}
            Clearance::Target => calls.push(Call::RevokeTarget {
                target: target.address,
            }),
            Clearance::Function => {
                calls.extend(target.functions.iter().map(|function| Call::RevokeFunction {
                    target: target.address,
                    selector: function.selector,
                }))
            }
        }
    }
    calls
}

/// Drops calls whose effect a later call fully overrides. Order is preserved.
///
/// Only calls that are themselves kept count as overriding, so a call superseded by an
/// intermediate call that is dropped in turn survives if nothing kept overrides it.
pub fn remove_obsolete_calls(calls: &[Call]) -> Vec<Call> {
    let mut kept: Vec<&Call> = Vec::with_capacity(calls.len());
    for call in calls.iter().rev() {
        if !kept.iter().any(|later| later.supersedes(call)) {
            kept.push(call);
        }
    }
    kept.reverse();

    if kept.len() < calls.len() {
        debug!("removed {} obsolete calls", calls.len() - kept.len());
    }
    kept.into_iter().cloned().collect()
}
