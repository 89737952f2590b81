//! Content addressing of normalized conditions.
//!
//! The permission contract stores every condition as the runtime code of a data contract
//! deployed through the ERC-2470 singleton factory. The address of that contract doubles as
//! the condition's identity, so the derivation below must match the contract byte for byte:
//!
//! ```text
//! header   = parent << 8 | paramType << 5 | operator            (u16, big-endian)
//! payload  = keccak256(compValue)        for EqualTo
//!          | leftpad32(compValue)        for other comparison operators
//!          | (nothing)                   for operators without a comparison value
//! packed   = header_0 .. header_n || payload_0 .. payload_n
//! initcode = 0x63 || be32(len(packed) + 1) || 0x80600e6000396000f3 || 0x00 || packed
//! address  = keccak256(0xff || factory || salt || keccak256(initcode))[12..]
//! ```

use crate::condition::{ConditionId, ConditionNode, NormalizedCondition, Operator, ParameterType};
use crate::result::{Error, Result};
use alloy_primitives::{Address, address};
use sha3::{Digest, Keccak256};
use std::collections::VecDeque;

/// ERC-2470 singleton factory the condition data contracts are deployed through.
pub const SINGLETON_FACTORY: Address = address!("ce0042b868300000d44a59004da54a005ffdcf9f");

/// CREATE2 salt used for every condition data contract.
pub const ZERO_SALT: [u8; 32] = [0u8; 32];

/// `PUSH4 <len>` opcode opening the init code.
const INIT_CODE_PUSH4: u8 = 0x63;

/// `DUP1 PUSH1 0x0e PUSH1 0x00 CODECOPY PUSH1 0x00 RETURN`: copies everything after the
/// 14-byte preamble into memory and returns it as runtime code.
const INIT_CODE_COPY_RETURN: [u8; 9] = [0x80, 0x60, 0x0e, 0x60, 0x00, 0x39, 0x60, 0x00, 0xf3];

/// Leading `STOP` so the data contract cannot be called into.
const DATA_PREFIX: u8 = 0x00;

/// Size of an ABI word.
const WORD: usize = 32;

/// One node of a breadth-first flattened condition tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatCondition {
    /// Position of the parent in the flattened list; the root points at itself.
    pub parent: usize,
    pub param_type: ParameterType,
    pub operator: Operator,
    /// Comparison value with the ABI head word already stripped where it is extraneous.
    pub comp_value: Option<Vec<u8>>,
}

/// Flattens a normalized tree breadth-first.
///
/// `EqualTo` values of non-inline types are ABI encoded with a leading offset word. Only the
/// payload after it takes part in the comparison, so the head word is stripped here.
pub fn flatten_condition(root: &NormalizedCondition) -> Result<Vec<FlatCondition>> {
    let mut flat = Vec::new();
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((node, parent)) = queue.pop_front() {
        let index = flat.len();
        let comp_value = match node.comp_value() {
            Some(value) if node.operator() == Operator::EqualTo && !node.is_inline() => {
                let payload = value.get(WORD..).ok_or_else(|| {
                    Error::StructuralViolation(format!(
                        "EqualTo on {:?} requires an ABI encoded compValue, got {} bytes",
                        node.param_type(),
                        value.len()
                    ))
                })?;
                Some(payload.to_vec())
            }
            Some(value) => Some(value.to_vec()),
            None => None,
        };

        flat.push(FlatCondition {
            parent,
            param_type: node.param_type(),
            operator: node.operator(),
            comp_value,
        });
        queue.extend(node.children().iter().map(|child| (child, index)));
    }

    Ok(flat)
}

/// Packs flattened conditions into the byte layout stored on-chain.
pub fn pack_conditions(conditions: &[FlatCondition]) -> Result<Vec<u8>> {
    let payload_count = conditions
        .iter()
        .filter(|c| c.operator.has_comp_value())
        .count();
    let mut packed = Vec::with_capacity(conditions.len() * 2 + payload_count * WORD);

    for condition in conditions {
        let parent = u8::try_from(condition.parent).map_err(|_| {
            Error::StructuralViolation(format!(
                "condition has too many nodes to pack: parent index {} exceeds 255",
                condition.parent
            ))
        })?;
        let header = (u16::from(parent) << 8)
            | (u16::from(u8::from(condition.param_type)) << 5)
            | u16::from(u8::from(condition.operator));
        packed.extend_from_slice(&header.to_be_bytes());
    }

    for condition in conditions {
        if !condition.operator.has_comp_value() {
            continue;
        }
        let value = condition.comp_value.as_deref().ok_or_else(|| {
            Error::StructuralViolation(format!(
                "{:?} requires a compValue",
                condition.operator
            ))
        })?;
        if condition.operator == Operator::EqualTo {
            packed.extend_from_slice(&keccak256(value));
        } else {
            packed.extend_from_slice(&left_pad_word(condition.operator, value)?);
        }
    }

    Ok(packed)
}

/// Derives the content id of a normalized condition.
pub fn condition_id(condition: &NormalizedCondition) -> Result<ConditionId> {
    let packed = pack_conditions(&flatten_condition(condition)?)?;
    let init_code = init_code(&packed)?;
    Ok(ConditionId::from(create2_address(
        SINGLETON_FACTORY,
        &ZERO_SALT,
        &keccak256(&init_code),
    )))
}

/// Wraps packed conditions into init code that deploys them as runtime code.
pub fn init_code(packed: &[u8]) -> Result<Vec<u8>> {
    let runtime_len = u32::try_from(packed.len() + 1).map_err(|_| {
        Error::StructuralViolation(format!("packed condition too large: {} bytes", packed.len()))
    })?;

    let mut code = Vec::with_capacity(packed.len() + 15);
    code.push(INIT_CODE_PUSH4);
    code.extend_from_slice(&runtime_len.to_be_bytes());
    code.extend_from_slice(&INIT_CODE_COPY_RETURN);
    code.push(DATA_PREFIX);
    code.extend_from_slice(packed);
    Ok(code)
}

fn create2_address(deployer: Address, salt: &[u8; 32], init_code_hash: &[u8; 32]) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update([0xff]);
    hasher.update(deployer.as_slice());
    hasher.update(salt);
    hasher.update(init_code_hash);
    let hash: [u8; 32] = hasher.finalize().into();
    Address::from_slice(&hash[12..])
}

fn left_pad_word(operator: Operator, value: &[u8]) -> Result<[u8; WORD]> {
    if value.len() > WORD {
        return Err(Error::StructuralViolation(format!(
            "{:?} compValue must fit 32 bytes, got {}",
            operator,
            value.len()
        )));
    }
    let mut word = [0u8; WORD];
    word[WORD - value.len()..].copy_from_slice(value);
    Ok(word)
}

fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}
