//! A 512-bit unsigned integer for wide state counters.

use std::fmt;

/// A 512-bit unsigned integer stored as 64 big-endian bytes.
///
/// Supports only the arithmetic the wide state cells need: addition with
/// explicit checked and wrapping variants. Comparison follows numeric
/// order because the byte representation is big-endian.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint512(pub [u8; 64]);

impl Uint512 {
    pub const ZERO: Self = Self([0u8; 64]);
    pub const MAX: Self = Self([0xff; 64]);

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 64];
        bytes[48..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn to_be_bytes(self) -> [u8; 64] {
        self.0
    }

    /// Parses exactly 64 big-endian bytes; any other length is rejected.
    pub fn try_from_be_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 64] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Adds, returning `None` if the sum does not fit in 512 bits.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (sum, carry) = self.add_with_carry(other);
        if carry {
            None
        } else {
            Some(sum)
        }
    }

    /// Adds, discarding any carry out of the top byte.
    pub fn wrapping_add(self, other: Self) -> Self {
        self.add_with_carry(other).0
    }

    fn add_with_carry(self, other: Self) -> (Self, bool) {
        let mut out = [0u8; 64];
        let mut carry = 0u16;
        for i in (0..64).rev() {
            let sum = u16::from(self.0[i]) + u16::from(other.0[i]) + carry;
            out[i] = sum as u8;
            carry = sum >> 8;
        }
        (Self(out), carry != 0)
    }
}

impl Default for Uint512 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Uint512 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Uint512 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint512({self})")
    }
}

impl From<u64> for Uint512 {
    fn from(value: u64) -> Self {
        Self::from_u128(u128::from(value))
    }
}
