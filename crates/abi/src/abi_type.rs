//! The ABI type descriptor tree and its signature syntax.

use avm_types::error::AbiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum bit width of an ABI unsigned integer.
pub const MAX_UINT_WIDTH: u16 = 512;

/// A structural descriptor of an ABI type.
///
/// Descriptors are parsable from and printable to the canonical signature
/// syntax (`uint64`, `byte[]`, `bool[3]`, `(uint64[],string)`), so a
/// signature string losslessly determines the type tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbiType {
    /// `bool`. Standalone encoding is one byte, 0 or 1; consecutive bools
    /// inside a composite are bit-packed.
    Bool,
    /// `uintN` for N a multiple of 8 in 8..=512, big-endian.
    Uint(u16),
    /// `byte`, a single octet.
    Byte,
    /// `byte[]`, a length-prefixed byte string.
    Bytes,
    /// `string`, UTF-8 bytes with the same length-prefixed layout.
    String,
    /// `T[N]`, a fixed-length array.
    StaticArray(Box<AbiType>, u16),
    /// `T[]`, a count-prefixed dynamic array.
    DynamicArray(Box<AbiType>),
    /// `(T1,...,Tn)`.
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// A `uintN` descriptor, validating the width.
    pub fn uint(width: u16) -> Result<Self, AbiError> {
        check_uint_width(width)?;
        Ok(Self::Uint(width))
    }

    /// Whether the encoding of this type has variable length.
    pub fn is_dynamic(&self) -> bool {
        self.static_size().is_none()
    }

    /// The fixed encoded byte length of a static type, or `None` for
    /// dynamic types. Accounts for bit-packing of consecutive booleans
    /// inside tuples and for bool arrays.
    pub fn static_size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte => Some(1),
            Self::Uint(width) => Some(usize::from(*width) / 8),
            Self::Bytes | Self::String | Self::DynamicArray(_) => None,
            Self::StaticArray(elem, len) => {
                let len = usize::from(*len);
                if **elem == Self::Bool {
                    Some(len.div_ceil(8))
                } else {
                    elem.static_size().map(|size| size * len)
                }
            }
            Self::Tuple(fields) => {
                let mut total = 0usize;
                let mut i = 0;
                while i < fields.len() {
                    if fields[i] == Self::Bool {
                        let run_start = i;
                        while i < fields.len() && fields[i] == Self::Bool {
                            i += 1;
                        }
                        total += (i - run_start).div_ceil(8);
                    } else {
                        total += fields[i].static_size()?;
                        i += 1;
                    }
                }
                Some(total)
            }
        }
    }

    /// Parses a type from the canonical signature syntax.
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AbiError::Encoding("empty type string".into()));
        }
        let (base, suffixes) = if let Some(rest) = s.strip_prefix('(') {
            let close = matching_paren(rest)?;
            (Self::parse_tuple(&rest[..close])?, &rest[close + 1..])
        } else {
            let idx = s.find('[').unwrap_or(s.len());
            (Self::parse_simple(&s[..idx])?, &s[idx..])
        };
        Self::apply_suffixes(base, suffixes)
    }

    fn parse_simple(s: &str) -> Result<Self, AbiError> {
        match s {
            "bool" => Ok(Self::Bool),
            "byte" => Ok(Self::Byte),
            "string" => Ok(Self::String),
            _ => {
                if let Some(width) = s.strip_prefix("uint") {
                    let width: u16 = width.parse().map_err(|_| {
                        AbiError::Encoding(format!("invalid uint width in '{s}'"))
                    })?;
                    Self::uint(width)
                } else {
                    Err(AbiError::Encoding(format!("unknown type '{s}'")))
                }
            }
        }
    }

    fn parse_tuple(inner: &str) -> Result<Self, AbiError> {
        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(Self::Tuple(Vec::new()));
        }
        let mut fields = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (idx, c) in inner.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        AbiError::Encoding(format!("unbalanced parentheses in '({inner})'"))
                    })?;
                }
                ',' if depth == 0 => {
                    fields.push(Self::parse(&inner[start..idx])?);
                    start = idx + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(AbiError::Encoding(format!(
                "unbalanced parentheses in '({inner})'"
            )));
        }
        fields.push(Self::parse(&inner[start..])?);
        Ok(Self::Tuple(fields))
    }

    fn apply_suffixes(mut ty: Self, mut rest: &str) -> Result<Self, AbiError> {
        while !rest.is_empty() {
            let inner = rest
                .strip_prefix('[')
                .and_then(|r| r.split_once(']'))
                .ok_or_else(|| AbiError::Encoding(format!("malformed array suffix '{rest}'")))?;
            let (len_str, tail) = inner;
            ty = if len_str.is_empty() {
                if ty == Self::Byte {
                    Self::Bytes
                } else {
                    Self::DynamicArray(Box::new(ty))
                }
            } else {
                let len: u16 = len_str.parse().map_err(|_| {
                    AbiError::Encoding(format!("invalid array length '{len_str}'"))
                })?;
                Self::StaticArray(Box::new(ty), len)
            };
            rest = tail;
        }
        Ok(ty)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Byte => f.write_str("byte"),
            Self::Bytes => f.write_str("byte[]"),
            Self::String => f.write_str("string"),
            Self::Uint(width) => write!(f, "uint{width}"),
            Self::StaticArray(elem, len) => write!(f, "{elem}[{len}]"),
            Self::DynamicArray(elem) => write!(f, "{elem}[]"),
            Self::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

pub(crate) fn check_uint_width(width: u16) -> Result<(), AbiError> {
    if width == 0 || width % 8 != 0 || width > MAX_UINT_WIDTH {
        return Err(AbiError::Encoding(format!(
            "uint width must be a multiple of 8 in 8..=512, got {width}"
        )));
    }
    Ok(())
}

fn matching_paren(after_open: &str) -> Result<usize, AbiError> {
    let mut depth = 0usize;
    for (idx, c) in after_open.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Ok(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    Err(AbiError::Encoding(format!(
        "unbalanced parentheses in '({after_open}'"
    )))
}
