//! Runtime representation of ABI values.

use crate::abi_type::AbiType;

/// A decoded (or directly constructed) ABI value.
///
/// `Byte` values are represented as `Uint` in 0..=255. Values are
/// immutable once constructed except through [`AbiValue::deep_copy`],
/// which produces an independently-owned tree that never aliases the
/// source buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Bool(bool),
    Uint(u128),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[AbiValue]> {
        match self {
            Self::Tuple(fields) => Some(fields),
            _ => None,
        }
    }

    /// The zero value of a type: false, 0, empty buffers, zeroed static
    /// arrays, zeroed tuple fields.
    pub fn zero(ty: &AbiType) -> Self {
        match ty {
            AbiType::Bool => Self::Bool(false),
            AbiType::Uint(_) | AbiType::Byte => Self::Uint(0),
            AbiType::Bytes => Self::Bytes(Vec::new()),
            AbiType::String => Self::String(String::new()),
            AbiType::StaticArray(elem, len) => {
                Self::Array(vec![Self::zero(elem); usize::from(*len)])
            }
            AbiType::DynamicArray(_) => Self::Array(Vec::new()),
            AbiType::Tuple(fields) => Self::Tuple(fields.iter().map(Self::zero).collect()),
        }
    }

    /// Produces a structurally identical value with freshly-owned buffers.
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Bool(b) => Self::Bool(*b),
            Self::Uint(v) => Self::Uint(*v),
            Self::Bytes(b) => Self::Bytes(b.to_vec()),
            Self::String(s) => Self::String(s.to_string()),
            Self::Array(items) => Self::Array(items.iter().map(Self::deep_copy).collect()),
            Self::Tuple(fields) => Self::Tuple(fields.iter().map(Self::deep_copy).collect()),
        }
    }
}
