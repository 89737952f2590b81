pub mod calls;
pub mod diff;
pub mod hoist;
pub mod includes;
pub mod merge;
pub mod permission;
pub mod plan;
pub mod result;
pub mod target;

pub use calls::{Call, grant, remove_obsolete_calls, revoke};
pub use diff::{CallDiff, diff_permissions, diff_role, diff_targets};
pub use hoist::maybe_hoist;
pub use includes::{condition_includes, normalized_includes, permission_includes};
pub use merge::{MergeOutcome, MergeViolation, MergeWarning, merge_permissions};
pub use permission::{ExecutionOptions, Permission, PermissionKind, Selector};
pub use plan::{Plan, PlanConfig, plan_apply_role};
pub use result::{Error, Result};
pub use target::{
    Clearance, Function, Target, check_targets_integrity, materialize, targets_from_permissions,
};
