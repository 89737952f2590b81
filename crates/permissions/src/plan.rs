//! End-to-end planning of a role update.

use crate::calls::{Call, remove_obsolete_calls};
use crate::diff::diff_role;
use crate::hoist::maybe_hoist;
use crate::merge::{MergeWarning, merge_permissions};
use crate::permission::Permission;
use crate::result::{Error, Result};
use crate::target::{Target, materialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the role update planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Pick stored condition representations against the probes
    pub hoist_conditions: bool,
    /// Drop calls a later call overrides
    pub prune_obsolete_calls: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            hoist_conditions: true,
            prune_obsolete_calls: true,
        }
    }
}

impl PlanConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Result of [`plan_apply_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Calls to execute, in order.
    pub calls: Vec<Call>,
    /// The targets the role ends up with.
    pub targets: Vec<Target>,
    /// Grants absorbed while merging the desired permissions.
    pub warnings: Vec<MergeWarning>,
}

/// Plans the calls that move a role from `current` to the `desired` permissions.
///
/// `probes` is the reference set conditions are aligned with when hoisting is enabled.
pub fn plan_apply_role(
    current: &[Target],
    desired: &[Permission],
    probes: Option<&[Permission]>,
    config: &PlanConfig,
) -> Result<Plan> {
    let merged = merge_permissions(desired)?;
    if let Some(first) = merged.violations.first() {
        return Err(Error::MergeViolation {
            count: merged.violations.len(),
            first: first.to_string(),
        });
    }

    let probes = probes.filter(|_| config.hoist_conditions);
    let permissions = merged
        .permissions
        .into_iter()
        .map(|permission| {
            let condition = maybe_hoist(&permission, probes)?.map(|c| c.to_condition());
            Ok(Permission {
                condition,
                ..permission
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let targets = materialize(&permissions);

    let mut calls = diff_role(current, &targets)?.into_calls();
    if config.prune_obsolete_calls {
        calls = remove_obsolete_calls(&calls);
    }

    debug!(
        "planned {} calls for {} targets",
        calls.len(),
        targets.len()
    );
    Ok(Plan {
        calls,
        targets,
        warnings: merged.warnings,
    })
}
