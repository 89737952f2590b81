//! Shared fixtures for the integration tests.

use alloy_primitives::{Address, address, fixed_bytes};
use rolekit_core::{Condition, ConditionId, Operator, ParameterType, normalize};
use rolekit_permissions::{Call, Clearance, ExecutionOptions, Function, Selector, Target};
use std::collections::BTreeMap;

/// Mock token the role is allowed to interact with
pub const TOKEN: Address = address!("1111111111111111111111111111111111111111");

/// Mock pool the role is allowed to interact with
pub const POOL: Address = address!("2222222222222222222222222222222222222222");

/// Mock avatar receiving funds
pub const AVATAR: Address = address!("3333333333333333333333333333333333333333");

/// `transfer(address,uint256)`
pub const TRANSFER: Selector = fixed_bytes!("a9059cbb");

/// `approve(address,uint256)`
pub const APPROVE: Selector = fixed_bytes!("095ea7b3");

/// `deposit(uint256)`
pub const DEPOSIT: Selector = fixed_bytes!("b6b55f25");

/// Right-aligned 32-byte ABI word.
pub fn word(value: u64) -> Vec<u8> {
    let mut word = vec![0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Address padded to an ABI word.
pub fn address_word(address: Address) -> Vec<u8> {
    let mut word = vec![0u8; 12];
    word.extend_from_slice(address.as_slice());
    word
}

/// ABI encoding of a `bytes` value, including the leading offset word.
pub fn encoded_bytes(payload: &[u8]) -> Vec<u8> {
    let mut encoded = word(0x20);
    encoded.extend(word(payload.len() as u64));
    encoded.extend_from_slice(payload);
    let padded = encoded.len().div_ceil(32) * 32;
    encoded.resize(padded, 0);
    encoded
}

pub fn eq(value: u64) -> Condition {
    Condition::equal_to(ParameterType::Static, word(value))
}

pub fn gt(value: u64) -> Condition {
    Condition::new(ParameterType::Static, Operator::GreaterThan).with_comp_value(word(value))
}

pub fn abi(children: Vec<Condition>) -> Condition {
    Condition::matches(ParameterType::AbiEncoded, children)
}

pub fn id(condition: &Condition) -> ConditionId {
    normalize(condition)
        .unwrap_or_else(|err| panic!("fixture condition does not normalize: {err}"))
        .id()
}

/// On-chain permission state of one role, updated by replaying calls.
///
/// Function entries survive target-level calls like they do in contract storage; they only
/// show in [`RoleState::targets`] while the target is scoped.
#[derive(Clone, Debug, Default)]
pub struct RoleState {
    targets: BTreeMap<Address, StoredTarget>,
}

#[derive(Clone, Debug, Default)]
struct StoredTarget {
    clearance: Clearance,
    execution_options: ExecutionOptions,
    functions: BTreeMap<Selector, Function>,
}

impl RoleState {
    pub fn from_targets(targets: &[Target]) -> Self {
        let mut state = Self::default();
        for target in targets {
            state.targets.insert(
                target.address,
                StoredTarget {
                    clearance: target.clearance,
                    execution_options: target.execution_options,
                    functions: target
                        .functions
                        .iter()
                        .map(|f| (f.selector, f.clone()))
                        .collect(),
                },
            );
        }
        state
    }

    pub fn apply(&mut self, calls: &[Call]) {
        for call in calls {
            let stored = self.targets.entry(call.target()).or_default();
            match call {
                Call::AllowTarget {
                    execution_options, ..
                } => {
                    stored.clearance = Clearance::Target;
                    stored.execution_options = *execution_options;
                }
                Call::ScopeTarget { .. } => {
                    stored.clearance = Clearance::Function;
                    stored.execution_options = ExecutionOptions::None;
                }
                Call::RevokeTarget { .. } => {
                    stored.clearance = Clearance::None;
                    stored.execution_options = ExecutionOptions::None;
                }
                Call::AllowFunction {
                    selector,
                    execution_options,
                    ..
                } => {
                    stored.functions.insert(
                        *selector,
                        Function {
                            selector: *selector,
                            execution_options: *execution_options,
                            wildcarded: true,
                            condition: None,
                        },
                    );
                }
                Call::ScopeFunction {
                    selector,
                    condition,
                    execution_options,
                    ..
                } => {
                    stored.functions.insert(
                        *selector,
                        Function {
                            selector: *selector,
                            execution_options: *execution_options,
                            wildcarded: false,
                            condition: Some(condition.clone()),
                        },
                    );
                }
                Call::RevokeFunction { selector, .. } => {
                    stored.functions.remove(selector);
                }
            }
        }
    }

    /// The effective targets, sorted by address.
    pub fn targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .filter_map(|(address, stored)| match stored.clearance {
                Clearance::None => None,
                Clearance::Target => Some(Target {
                    address: *address,
                    clearance: Clearance::Target,
                    execution_options: stored.execution_options,
                    functions: Vec::new(),
                }),
                Clearance::Function if stored.functions.is_empty() => None,
                Clearance::Function => Some(Target {
                    address: *address,
                    clearance: Clearance::Function,
                    execution_options: ExecutionOptions::None,
                    functions: stored.functions.values().cloned().collect(),
                }),
            })
            .collect()
    }
}

/// Comparable form of a snapshot: sorted, conditions reduced to their normalized id.
pub type CanonicalTarget = (
    Address,
    Clearance,
    ExecutionOptions,
    Vec<(Selector, ExecutionOptions, bool, Option<ConditionId>)>,
);

pub fn canonical(targets: &[Target]) -> Vec<CanonicalTarget> {
    let mut canonical: Vec<CanonicalTarget> = targets
        .iter()
        .filter(|t| t.clearance != Clearance::None)
        .map(|target| {
            let mut functions: Vec<_> = target
                .functions
                .iter()
                .map(|f| {
                    (
                        f.selector,
                        f.execution_options,
                        f.wildcarded,
                        f.condition.as_ref().map(id),
                    )
                })
                .collect();
            functions.sort();
            (
                target.address,
                target.clearance,
                target.execution_options,
                functions,
            )
        })
        .collect();
    canonical.sort_by_key(|t| t.0);
    canonical
}
