//! Permission intents as authored, before they are merged into targets.

use crate::result::Error;
use alloy_primitives::{Address, FixedBytes};
use rolekit_core::Condition;
use serde::{Deserialize, Serialize};

/// 4-byte function selector.
pub type Selector = FixedBytes<4>;

/// Execution modes granted alongside a call permission. Wire value is the on-chain enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ExecutionOptions {
    #[default]
    None = 0,
    Send = 1,
    DelegateCall = 2,
    Both = 3,
}

impl ExecutionOptions {
    pub fn from_flags(send: bool, delegatecall: bool) -> Self {
        match (send, delegatecall) {
            (false, false) => Self::None,
            (true, false) => Self::Send,
            (false, true) => Self::DelegateCall,
            (true, true) => Self::Both,
        }
    }

    pub fn send(self) -> bool {
        matches!(self, Self::Send | Self::Both)
    }

    pub fn delegatecall(self) -> bool {
        matches!(self, Self::DelegateCall | Self::Both)
    }
}

impl TryFrom<u8> for ExecutionOptions {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Send,
            2 => Self::DelegateCall,
            3 => Self::Both,
            other => return Err(Error::UnknownExecutionOptions(other)),
        })
    }
}

impl From<ExecutionOptions> for u8 {
    fn from(value: ExecutionOptions) -> Self {
        value as u8
    }
}

/// A grant of call access to a target, optionally narrowed to one function and one
/// condition.
///
/// A condition is only meaningful together with a selector; without one the permission
/// allows the whole target and the condition is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub target_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub send: bool,
    #[serde(default)]
    pub delegatecall: bool,
}

/// The three disjoint permission shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionKind<'a> {
    /// Any function of the target.
    Allowed,
    /// One function, any calldata.
    Wildcarded(Selector),
    /// One function, calldata matching the condition.
    Conditional(Selector, &'a Condition),
}

impl Permission {
    /// Allows calling any function of `target_address`.
    pub fn allow_target(target_address: Address) -> Self {
        Self {
            target_address,
            selector: None,
            condition: None,
            send: false,
            delegatecall: false,
        }
    }

    /// Allows calling one function with any calldata.
    pub fn allow_function(target_address: Address, selector: Selector) -> Self {
        Self {
            selector: Some(selector),
            ..Self::allow_target(target_address)
        }
    }

    /// Allows calling one function with calldata matching `condition`.
    pub fn scope_function(target_address: Address, selector: Selector, condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::allow_function(target_address, selector)
        }
    }

    pub fn with_send(mut self, send: bool) -> Self {
        self.send = send;
        self
    }

    pub fn with_delegatecall(mut self, delegatecall: bool) -> Self {
        self.delegatecall = delegatecall;
        self
    }

    pub fn kind(&self) -> PermissionKind<'_> {
        match (self.selector, &self.condition) {
            (None, _) => PermissionKind::Allowed,
            (Some(selector), None) => PermissionKind::Wildcarded(selector),
            (Some(selector), Some(condition)) => PermissionKind::Conditional(selector, condition),
        }
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::from_flags(self.send, self.delegatecall)
    }
}
