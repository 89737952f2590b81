//! Condition trees matched against calldata.
//!
//! [`Condition`] is the raw, freely constructible tree. [`NormalizedCondition`] is the sealed
//! canonical form produced by [`crate::normalize`]: every node carries its [`ConditionId`],
//! and since nodes cannot be modified after construction the id can never go stale.

use crate::hex_bytes::HexBytes;
use crate::result::Error;
use alloy_primitives::Address;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// ABI shape a condition node is matched against. Wire value occupies 3 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ParameterType {
    /// Logical combinators; the type is resolved from the children.
    None = 0,
    Static = 1,
    Dynamic = 2,
    Tuple = 3,
    Array = 4,
    /// Calldata with a 4-byte selector in front of the ABI encoded arguments.
    Calldata = 5,
    /// ABI encoded arguments without a selector.
    AbiEncoded = 6,
    Dynamic32 = 7,
}

impl ParameterType {
    /// Composite types carry children describing their components.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            Self::Tuple | Self::Array | Self::Calldata | Self::AbiEncoded
        )
    }

    /// Types that are decoded out of a dynamic byte string and keep their own subtree.
    pub fn is_embedded_calldata(self) -> bool {
        matches!(self, Self::Calldata | Self::AbiEncoded)
    }
}

impl TryFrom<u8> for ParameterType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Static,
            2 => Self::Dynamic,
            3 => Self::Tuple,
            4 => Self::Array,
            5 => Self::Calldata,
            6 => Self::AbiEncoded,
            7 => Self::Dynamic32,
            other => return Err(Error::UnknownParameterType(other)),
        })
    }
}

impl From<ParameterType> for u8 {
    fn from(value: ParameterType) -> Self {
        value as u8
    }
}

/// Comparison or combinator applied at a condition node. Wire value occupies 5 bits.
///
/// Gaps in the numbering are reserved by the on-chain contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Operator {
    Pass = 0,
    And = 1,
    Or = 2,
    Nor = 3,
    Matches = 5,
    ArraySome = 6,
    ArrayEvery = 7,
    ArraySubset = 8,
    EqualToAvatar = 15,
    EqualTo = 16,
    GreaterThan = 17,
    LessThan = 18,
    SignedIntGreaterThan = 19,
    SignedIntLessThan = 20,
    Bitmask = 21,
    Custom = 22,
    WithinAllowance = 28,
    EtherWithinAllowance = 29,
    CallWithinAllowance = 30,
}

impl Operator {
    /// Whether nodes with this operator carry a comparison value.
    pub fn has_comp_value(self) -> bool {
        self >= Self::EqualTo
    }

    /// `And`, `Or` and `Nor`.
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Nor)
    }

    /// Operators whose comparison value is packed verbatim and therefore must fit a word.
    pub fn requires_word_comp_value(self) -> bool {
        self.has_comp_value() && self != Self::EqualTo
    }
}

impl TryFrom<u8> for Operator {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Pass,
            1 => Self::And,
            2 => Self::Or,
            3 => Self::Nor,
            5 => Self::Matches,
            6 => Self::ArraySome,
            7 => Self::ArrayEvery,
            8 => Self::ArraySubset,
            15 => Self::EqualToAvatar,
            16 => Self::EqualTo,
            17 => Self::GreaterThan,
            18 => Self::LessThan,
            19 => Self::SignedIntGreaterThan,
            20 => Self::SignedIntLessThan,
            21 => Self::Bitmask,
            22 => Self::Custom,
            28 => Self::WithinAllowance,
            29 => Self::EtherWithinAllowance,
            30 => Self::CallWithinAllowance,
            other => return Err(Error::UnknownOperator(other)),
        })
    }
}

impl From<Operator> for u8 {
    fn from(value: Operator) -> Self {
        value as u8
    }
}

/// Read access shared by raw and normalized condition trees.
pub trait ConditionNode: Sized {
    fn param_type(&self) -> ParameterType;
    fn operator(&self) -> Operator;
    fn comp_value(&self) -> Option<&[u8]>;
    fn children(&self) -> &[Self];

    /// The type this node is matched against. Logical `None` nodes take the type of their
    /// first child that resolves to something other than `None`.
    fn resolved_param_type(&self) -> ParameterType {
        match self.param_type() {
            ParameterType::None => self
                .children()
                .iter()
                .map(Self::resolved_param_type)
                .find(|t| *t != ParameterType::None)
                .unwrap_or(ParameterType::None),
            other => other,
        }
    }

    /// Whether the value is encoded in place in the ABI head (no offset indirection).
    fn is_inline(&self) -> bool {
        match self.param_type() {
            ParameterType::Static => true,
            ParameterType::Tuple => self.children().iter().all(Self::is_inline),
            ParameterType::None => self
                .children()
                .iter()
                .find(|c| c.resolved_param_type() != ParameterType::None)
                .is_some_and(Self::is_inline),
            _ => false,
        }
    }
}

/// Raw condition tree as authored or read from a snapshot.
///
/// An empty `children` list and an absent one are equivalent, as are an empty and an absent
/// comparison value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub param_type: ParameterType,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comp_value: Option<HexBytes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Condition>,
}

impl Condition {
    pub fn new(param_type: ParameterType, operator: Operator) -> Self {
        Self {
            param_type,
            operator,
            comp_value: None,
            children: Vec::new(),
        }
    }

    pub fn with_comp_value(mut self, comp_value: impl Into<HexBytes>) -> Self {
        self.comp_value = Some(comp_value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Condition>) -> Self {
        self.children = children;
        self
    }

    pub fn pass(param_type: ParameterType) -> Self {
        Self::new(param_type, Operator::Pass)
    }

    pub fn equal_to(param_type: ParameterType, comp_value: impl Into<HexBytes>) -> Self {
        Self::new(param_type, Operator::EqualTo).with_comp_value(comp_value)
    }

    pub fn matches(param_type: ParameterType, children: Vec<Condition>) -> Self {
        Self::new(param_type, Operator::Matches).with_children(children)
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Self::new(ParameterType::None, Operator::And).with_children(children)
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Self::new(ParameterType::None, Operator::Or).with_children(children)
    }

    pub fn nor(children: Vec<Condition>) -> Self {
        Self::new(ParameterType::None, Operator::Nor).with_children(children)
    }
}

impl ConditionNode for Condition {
    fn param_type(&self) -> ParameterType {
        self.param_type
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn comp_value(&self) -> Option<&[u8]> {
        self.comp_value.as_deref()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Content identifier of a normalized condition: the CREATE2 address its packed form is
/// deployed at. Ordered as a big-endian integer.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(Address);

impl ConditionId {
    pub const ZERO: Self = Self(Address::ZERO);

    pub fn address(&self) -> Address {
        self.0
    }

    /// Lowercase `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }

    pub fn from_hex(input: &str) -> crate::Result<Self> {
        let normalized = crate::hex_bytes::normalize_hex_string(input)?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(normalized, &mut bytes)?;
        Ok(Self(Address::new(bytes)))
    }
}

impl From<Address> for ConditionId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Debug for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ConditionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ConditionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ConditionIdVisitor;

        impl<'de> Visitor<'de> for ConditionIdVisitor {
            type Value = ConditionId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 20 byte hex address")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                ConditionId::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ConditionIdVisitor)
    }
}

/// Canonical condition tree with a content id attached to every node.
///
/// Only the canonicalizer and the rewrites built on it construct values of this type.
/// Equality and hashing go through the id.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCondition {
    param_type: ParameterType,
    operator: Operator,
    #[serde(skip_serializing_if = "Option::is_none")]
    comp_value: Option<HexBytes>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NormalizedCondition>,
    id: ConditionId,
}

impl NormalizedCondition {
    /// Seals a node whose children are already normalized, computing its id.
    pub(crate) fn seal(
        param_type: ParameterType,
        operator: Operator,
        comp_value: Option<HexBytes>,
        children: Vec<NormalizedCondition>,
    ) -> crate::Result<Self> {
        let mut node = Self {
            param_type,
            operator,
            comp_value,
            children,
            id: ConditionId::ZERO,
        };
        node.id = crate::condition_id::condition_id(&node)?;
        Ok(node)
    }

    /// Takes the node apart, dropping its id.
    pub(crate) fn into_parts(
        self,
    ) -> (
        ParameterType,
        Operator,
        Option<HexBytes>,
        Vec<NormalizedCondition>,
    ) {
        (self.param_type, self.operator, self.comp_value, self.children)
    }

    pub fn id(&self) -> ConditionId {
        self.id
    }

    /// Converts back into a raw tree, dropping the ids.
    pub fn to_condition(&self) -> Condition {
        Condition {
            param_type: self.param_type,
            operator: self.operator,
            comp_value: self.comp_value.clone(),
            children: self.children.iter().map(Self::to_condition).collect(),
        }
    }
}

impl ConditionNode for NormalizedCondition {
    fn param_type(&self) -> ParameterType {
        self.param_type
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn comp_value(&self) -> Option<&[u8]> {
        self.comp_value.as_deref()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl PartialEq for NormalizedCondition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NormalizedCondition {}

impl std::hash::Hash for NormalizedCondition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<&NormalizedCondition> for Condition {
    fn from(condition: &NormalizedCondition) -> Self {
        condition.to_condition()
    }
}
