//! Materialized per-address permission state, as stored on-chain for a role.

use crate::merge::merge_permissions;
use crate::permission::{ExecutionOptions, Permission, PermissionKind, Selector};
use crate::result::{Error, Result};
use alloy_primitives::Address;
use rolekit_core::{Condition, ConditionId, check_root_condition_integrity, normalize};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// How far a target is opened up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Clearance {
    #[default]
    None = 0,
    /// Every function of the target.
    Target = 1,
    /// Only the listed functions.
    Function = 2,
}

impl TryFrom<u8> for Clearance {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Target,
            2 => Self::Function,
            other => return Err(Error::UnknownClearance(other)),
        })
    }
}

impl From<Clearance> for u8 {
    fn from(value: Clearance) -> Self {
        value as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub selector: Selector,
    pub execution_options: ExecutionOptions,
    pub wildcarded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Function {
    /// Identity used when comparing snapshots: conditions compare by normal form.
    pub(crate) fn key(&self) -> Result<FunctionKey> {
        let condition = match &self.condition {
            Some(condition) => Some(normalize(condition)?.id()),
            None => None,
        };
        Ok(FunctionKey {
            selector: self.selector,
            wildcarded: self.wildcarded,
            execution_options: self.execution_options,
            condition,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FunctionKey {
    selector: Selector,
    wildcarded: bool,
    execution_options: ExecutionOptions,
    condition: Option<ConditionId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub address: Address,
    pub clearance: Clearance,
    pub execution_options: ExecutionOptions,
    #[serde(default)]
    pub functions: Vec<Function>,
}

impl Target {
    /// Whether both targets open up the address the same way, ignoring their functions.
    pub fn same_scope(&self, other: &Target) -> bool {
        self.address == other.address
            && self.clearance == other.clearance
            && self.execution_options == other.execution_options
    }
}

/// Rejects duplicate targets and target shapes the contract cannot represent.
pub fn check_targets_integrity(targets: &[Target]) -> Result<()> {
    let mut addresses = HashSet::with_capacity(targets.len());
    for target in targets {
        if !addresses.insert(target.address) {
            return Err(Error::InconsistentStructure(format!(
                "duplicate target {}",
                target.address
            )));
        }
        check_target_integrity(target)?;
    }
    Ok(())
}

fn check_target_integrity(target: &Target) -> Result<()> {
    let scoped = target.clearance == Clearance::Function;
    if scoped == target.functions.is_empty() {
        return Err(Error::InconsistentStructure(format!(
            "target {} has clearance {:?} and {} functions",
            target.address,
            target.clearance,
            target.functions.len()
        )));
    }

    let mut selectors = HashSet::with_capacity(target.functions.len());
    for function in &target.functions {
        if !selectors.insert(function.selector) {
            return Err(Error::InconsistentStructure(format!(
                "duplicate function {}.{}",
                target.address, function.selector
            )));
        }
        match (function.wildcarded, &function.condition) {
            (true, Some(_)) => {
                return Err(Error::InconsistentStructure(format!(
                    "wildcarded function {}.{} carries a condition",
                    target.address, function.selector
                )));
            }
            (false, None) => {
                return Err(Error::InconsistentStructure(format!(
                    "scoped function {}.{} has no condition",
                    target.address, function.selector
                )));
            }
            (false, Some(condition)) => check_root_condition_integrity(condition)?,
            (true, None) => {}
        }
    }
    Ok(())
}

/// Merges permissions and materializes them into one target per address.
///
/// Conditions are stored in normal form. Merge violations fail the whole operation.
pub fn targets_from_permissions(permissions: &[Permission]) -> Result<Vec<Target>> {
    let outcome = merge_permissions(permissions)?;
    if let Some(first) = outcome.violations.first() {
        return Err(Error::MergeViolation {
            count: outcome.violations.len(),
            first: first.to_string(),
        });
    }

    let normalized = outcome
        .permissions
        .into_iter()
        .map(|permission| {
            let condition = match &permission.condition {
                Some(condition) => Some(normalize(condition)?.to_condition()),
                None => None,
            };
            Ok(Permission {
                condition,
                ..permission
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(materialize(&normalized))
}

/// Builds targets from already merged permissions, storing conditions exactly as given.
///
/// Permissions are grouped by address in order of first appearance, functions are sorted by
/// selector.
pub fn materialize(permissions: &[Permission]) -> Vec<Target> {
    let mut targets: Vec<Target> = Vec::new();

    for permission in permissions {
        let index = match targets
            .iter()
            .position(|t| t.address == permission.target_address)
        {
            Some(index) => index,
            None => {
                targets.push(Target {
                    address: permission.target_address,
                    clearance: Clearance::None,
                    execution_options: ExecutionOptions::None,
                    functions: Vec::new(),
                });
                targets.len() - 1
            }
        };
        let target = &mut targets[index];

        match permission.kind() {
            PermissionKind::Allowed => {
                target.clearance = Clearance::Target;
                target.execution_options = permission.execution_options();
                target.functions.clear();
            }
            _ if target.clearance == Clearance::Target => {}
            PermissionKind::Wildcarded(selector) => {
                target.clearance = Clearance::Function;
                target.functions.push(Function {
                    selector,
                    execution_options: permission.execution_options(),
                    wildcarded: true,
                    condition: None,
                });
            }
            PermissionKind::Conditional(selector, condition) => {
                target.clearance = Clearance::Function;
                target.functions.push(Function {
                    selector,
                    execution_options: permission.execution_options(),
                    wildcarded: false,
                    condition: Some(condition.clone()),
                });
            }
        }
    }

    for target in &mut targets {
        target.functions.sort_by_key(|f| f.selector);
    }
    debug!(
        "materialized {} permissions into {} targets",
        permissions.len(),
        targets.len()
    );
    targets
}
