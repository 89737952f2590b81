pub mod condition;
pub mod condition_id;
pub mod hex_bytes;
pub mod hoist;
pub mod integrity;
pub mod normalize;
pub mod result;
pub mod split;

pub use condition::{Condition, ConditionId, ConditionNode, NormalizedCondition, Operator, ParameterType};
pub use condition_id::{SINGLETON_FACTORY, condition_id};
pub use hex_bytes::HexBytes;
pub use hoist::{hoist_condition, hoist_top_ors};
pub use integrity::{check_condition_integrity, check_root_condition_integrity};
pub use normalize::{normalize, normalize_and, normalize_or};
pub use result::{Error, Result};
pub use split::{split_condition, split_normalized};

/// Checks a function-scope condition and brings it into normal form.
///
/// This is the entry point for conditions coming from outside: integrity is checked on the
/// raw tree, so violations name the operators and types as they were authored.
///
/// # Example
/// ```rust,ignore
/// let scoped = check_and_normalize(&permission_condition)?;
/// println!("stored at {}", scoped.id());
/// ```
pub fn check_and_normalize(condition: &Condition) -> Result<NormalizedCondition> {
    check_root_condition_integrity(condition)?;
    normalize(condition)
}
