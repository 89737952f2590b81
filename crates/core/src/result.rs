//! Core results and error types

use thiserror::Error;

/// Core error type encompassing all condition algebra errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to decode hex string.
    #[error("hex decode failed: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Two conditions that should share a structure do not, e.g. a split that is not a
    /// sub-condition of the combined condition.
    #[error("inconsistent structure: {0}")]
    InconsistentStructure(String),

    /// A state the algorithms rule out was reached. Indicates a bug, not bad input.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The condition fails the integrity rules (children types, root type, compValue).
    #[error("structural violation: {0}")]
    StructuralViolation(String),

    /// Operator wire value outside the known set.
    #[error("unknown operator: {0}")]
    UnknownOperator(u8),

    /// Parameter type wire value outside the known set.
    #[error("unknown parameter type: {0}")]
    UnknownParameterType(u8),
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
