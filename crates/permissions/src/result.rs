//! Permission algebra results and error types

use thiserror::Error;

/// Error type for permission merging, materialization and diffing.
#[derive(Debug, Error)]
pub enum Error {
    /// Condition algebra failed.
    #[error("condition error: {0}")]
    Core(#[from] rolekit_core::Error),

    /// Permissions aimed at one destination disagree on execution options.
    #[error("{count} merge violation(s), first: {first}")]
    MergeViolation { count: usize, first: String },

    /// Planner configuration could not be parsed.
    #[error("invalid plan config: {0}")]
    Config(#[from] serde_json::Error),

    /// Malformed target snapshot: duplicate addresses or functions, or a clearance that
    /// disagrees with the function list.
    #[error("inconsistent structure: {0}")]
    InconsistentStructure(String),

    /// Clearance wire value outside the known set.
    #[error("unknown clearance: {0}")]
    UnknownClearance(u8),

    /// Execution options wire value outside the known set.
    #[error("unknown execution options: {0}")]
    UnknownExecutionOptions(u8),
}

/// Permission result type
pub type Result<T> = std::result::Result<T, Error>;
