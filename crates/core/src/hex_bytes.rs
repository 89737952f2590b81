//! Byte buffer wrapper rendering as `0x`-prefixed lowercase hexadecimal.
//!
//! Comparison values travel through JSON snapshots and call descriptors as hex strings.
//! `HexBytes` keeps them as raw bytes in memory while serializing to and from that
//! representation, and derefs to a slice so byte oriented code needs no conversions.

use crate::result::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

/// Strips an optional `0x` prefix and lowercases the remaining hex digits.
pub fn normalize_hex_string(input: &str) -> Result<String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() % 2 != 0 {
        return Err(Error::HexDecode(hex::FromHexError::OddLength));
    }
    Ok(digits.to_ascii_lowercase())
}

/// Wrapper around `Vec<u8>` that renders as `0x`-prefixed lowercase hex.
///
/// # Examples
///
/// ```
/// use rolekit_core::HexBytes;
///
/// let bytes = HexBytes::from_hex("0xDEADbeef").unwrap();
/// assert_eq!(format!("{bytes:?}"), "0xdeadbeef");
/// assert_eq!(bytes.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    /// Parses a hex string with or without the `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self> {
        let normalized = normalize_hex_string(input)?;
        Ok(Self(hex::decode(normalized)?))
    }

    /// Renders the bytes as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for HexBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for HexBytes {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<HexBytes> for Vec<u8> {
    fn from(bytes: HexBytes) -> Self {
        bytes.0
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HexBytesVisitor;

        impl<'de> Visitor<'de> for HexBytesVisitor {
            type Value = HexBytes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 0x-prefixed hex string")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                HexBytes::from_hex(v).map_err(E::custom)
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_str(HexBytesVisitor)
    }
}

impl PartialEq<Vec<u8>> for HexBytes {
    fn eq(&self, other: &Vec<u8>) -> bool {
        &self.0 == other
    }
}

impl PartialEq<HexBytes> for Vec<u8> {
    fn eq(&self, other: &HexBytes) -> bool {
        self == &other.0
    }
}
