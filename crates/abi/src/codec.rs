//! The ABI codec: primitive encodings plus the head/tail composite layout.
//!
//! Composites are handled by a single recursive descent over the
//! [`AbiType`] descriptor tree, so the head/tail invariant holds uniformly
//! at every nesting level: static fields are encoded inline (consecutive
//! booleans bit-packed, most significant bit first), dynamic fields leave
//! a 2-byte big-endian offset in the head — relative to the start of the
//! enclosing composite — and place their content in the tail in
//! declaration order. Dynamic arrays prefix their element sequence with a
//! 2-byte big-endian count.
//!
//! Decoding never coerces: an out-of-range value, a wrong static length,
//! a backward or out-of-bounds offset, or trailing bytes all abort with
//! the matching error kind.

use crate::abi_type::{check_uint_width, AbiType};
use crate::abi_value::AbiValue;
use avm_types::error::AbiError;

/// Maximum length representable by the 2-byte prefixes and offsets.
const MAX_U16_LEN: usize = u16::MAX as usize;

/// Encodes `value` as `ty`, returning the canonical byte representation.
pub fn encode(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    match (ty, value) {
        (AbiType::Bool, AbiValue::Bool(b)) => Ok(vec![u8::from(*b)]),
        (AbiType::Uint(width), AbiValue::Uint(v)) => encode_uint(*v, *width),
        (AbiType::Byte, AbiValue::Uint(v)) => {
            let byte = u8::try_from(*v)
                .map_err(|_| AbiError::Range(format!("{v} does not fit a byte")))?;
            Ok(vec![byte])
        }
        (AbiType::Bytes, AbiValue::Bytes(data)) => encode_len_prefixed(data),
        (AbiType::String, AbiValue::String(s)) => encode_len_prefixed(s.as_bytes()),
        (AbiType::StaticArray(elem, len), AbiValue::Array(items)) => {
            if items.len() != usize::from(*len) {
                return Err(AbiError::Range(format!(
                    "static array {ty} expects {len} elements, got {}",
                    items.len()
                )));
            }
            let types = vec![elem.as_ref(); items.len()];
            encode_sequence(&types, items)
        }
        (AbiType::DynamicArray(elem), AbiValue::Array(items)) => {
            if items.len() > MAX_U16_LEN {
                return Err(AbiError::Range(format!(
                    "dynamic array of {} elements exceeds the 2-byte count",
                    items.len()
                )));
            }
            let types = vec![elem.as_ref(); items.len()];
            let mut out = (items.len() as u16).to_be_bytes().to_vec();
            out.extend(encode_sequence(&types, items)?);
            Ok(out)
        }
        (AbiType::Tuple(fields), AbiValue::Tuple(items)) => {
            if items.len() != fields.len() {
                return Err(AbiError::Range(format!(
                    "tuple {ty} expects {} fields, got {}",
                    fields.len(),
                    items.len()
                )));
            }
            let types: Vec<&AbiType> = fields.iter().collect();
            encode_sequence(&types, items)
        }
        _ => Err(AbiError::Encoding(format!(
            "value shape does not match type {ty}"
        ))),
    }
}

/// Decodes `bytes` as `ty`. The buffer must be consumed exactly.
pub fn decode(ty: &AbiType, bytes: &[u8]) -> Result<AbiValue, AbiError> {
    let (value, used) = decode_prefix(ty, bytes)?;
    if used != bytes.len() {
        return Err(AbiError::Encoding(format!(
            "{} trailing bytes after {ty}",
            bytes.len() - used
        )));
    }
    Ok(value)
}

/// Encodes an unsigned integer big-endian in exactly `width_bits / 8`
/// bytes. Fails with `Range` if the value exceeds the width's capacity.
pub fn encode_uint(value: u128, width_bits: u16) -> Result<Vec<u8>, AbiError> {
    check_uint_width(width_bits)?;
    let nbytes = usize::from(width_bits) / 8;
    if width_bits < 128 && value >> width_bits != 0 {
        return Err(AbiError::Range(format!(
            "{value} does not fit uint{width_bits}"
        )));
    }
    let be = value.to_be_bytes();
    if nbytes <= be.len() {
        Ok(be[be.len() - nbytes..].to_vec())
    } else {
        let mut out = vec![0u8; nbytes - be.len()];
        out.extend_from_slice(&be);
        Ok(out)
    }
}

/// Decodes a big-endian unsigned integer of `width_bits` from the front of
/// `bytes`. Fails with `Length` if the buffer is shorter than required,
/// and with `Range` if a wider-than-128-bit encoding holds a value that
/// does not fit the runtime representation.
pub fn decode_uint(bytes: &[u8], width_bits: u16) -> Result<u128, AbiError> {
    check_uint_width(width_bits)?;
    let nbytes = usize::from(width_bits) / 8;
    if bytes.len() < nbytes {
        return Err(AbiError::Length {
            needed: nbytes,
            have: bytes.len(),
        });
    }
    let (high, low) = if nbytes > 16 {
        bytes[..nbytes].split_at(nbytes - 16)
    } else {
        bytes[..nbytes].split_at(0)
    };
    if high.iter().any(|&b| b != 0) {
        return Err(AbiError::Range(format!(
            "uint{width_bits} value exceeds the supported 128-bit range"
        )));
    }
    let mut value = 0u128;
    for &b in low {
        value = value << 8 | u128::from(b);
    }
    Ok(value)
}

fn encode_len_prefixed(data: &[u8]) -> Result<Vec<u8>, AbiError> {
    if data.len() > MAX_U16_LEN {
        return Err(AbiError::Range(format!(
            "byte string of {} bytes exceeds the 2-byte length prefix",
            data.len()
        )));
    }
    let mut out = (data.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(data);
    Ok(out)
}

/// Encodes a field sequence (tuple body or array element run) with the
/// head/tail layout. Offsets are relative to the start of the returned
/// buffer.
fn encode_sequence(types: &[&AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    enum Head {
        Inline(Vec<u8>),
        // Index into `tails`; occupies two offset bytes in the head.
        Dynamic(usize),
    }

    let mut heads = Vec::new();
    let mut tails: Vec<Vec<u8>> = Vec::new();
    let mut i = 0;
    while i < types.len() {
        if *types[i] == AbiType::Bool {
            let run_start = i;
            while i < types.len() && *types[i] == AbiType::Bool {
                i += 1;
            }
            let mut packed = vec![0u8; (i - run_start).div_ceil(8)];
            for (bit, value) in values[run_start..i].iter().enumerate() {
                let b = value
                    .as_bool()
                    .ok_or_else(|| AbiError::Encoding("expected a bool value".into()))?;
                if b {
                    packed[bit / 8] |= 1 << (7 - bit % 8);
                }
            }
            heads.push(Head::Inline(packed));
        } else if types[i].is_dynamic() {
            tails.push(encode(types[i], &values[i])?);
            heads.push(Head::Dynamic(tails.len() - 1));
            i += 1;
        } else {
            heads.push(Head::Inline(encode(types[i], &values[i])?));
            i += 1;
        }
    }

    let head_len: usize = heads
        .iter()
        .map(|h| match h {
            Head::Inline(bytes) => bytes.len(),
            Head::Dynamic(_) => 2,
        })
        .sum();

    let mut tail_offsets = Vec::with_capacity(tails.len());
    let mut cursor = head_len;
    for tail in &tails {
        tail_offsets.push(cursor);
        cursor += tail.len();
    }
    if cursor > MAX_U16_LEN {
        return Err(AbiError::Range(format!(
            "encoded composite of {cursor} bytes exceeds the 2-byte offset space"
        )));
    }

    let mut out = Vec::with_capacity(cursor);
    for head in heads {
        match head {
            Head::Inline(bytes) => out.extend_from_slice(&bytes),
            Head::Dynamic(k) => out.extend_from_slice(&(tail_offsets[k] as u16).to_be_bytes()),
        }
    }
    for tail in tails {
        out.extend(tail);
    }
    Ok(out)
}

/// Decodes `ty` from the front of `bytes`, returning the value and the
/// number of bytes consumed.
fn decode_prefix(ty: &AbiType, bytes: &[u8]) -> Result<(AbiValue, usize), AbiError> {
    match ty {
        AbiType::Bool => match bytes.first().copied() {
            None => Err(AbiError::Length { needed: 1, have: 0 }),
            Some(0) => Ok((AbiValue::Bool(false), 1)),
            Some(1) => Ok((AbiValue::Bool(true), 1)),
            Some(b) => Err(AbiError::Encoding(format!(
                "standalone boolean must be 0 or 1, got {b:#04x}"
            ))),
        },
        AbiType::Uint(width) => {
            let value = decode_uint(bytes, *width)?;
            Ok((AbiValue::Uint(value), usize::from(*width) / 8))
        }
        AbiType::Byte => match bytes.first().copied() {
            Some(b) => Ok((AbiValue::Uint(u128::from(b)), 1)),
            None => Err(AbiError::Length { needed: 1, have: 0 }),
        },
        AbiType::Bytes => {
            let (data, used) = decode_len_prefixed(bytes)?;
            Ok((AbiValue::Bytes(data.to_vec()), used))
        }
        AbiType::String => {
            let (data, used) = decode_len_prefixed(bytes)?;
            let s = std::str::from_utf8(data)
                .map_err(|e| AbiError::Encoding(format!("invalid UTF-8 in string: {e}")))?;
            Ok((AbiValue::String(s.to_string()), used))
        }
        AbiType::StaticArray(elem, len) => {
            let types = vec![elem.as_ref(); usize::from(*len)];
            let (items, used) = decode_sequence(&types, bytes)?;
            Ok((AbiValue::Array(items), used))
        }
        AbiType::DynamicArray(elem) => {
            if bytes.len() < 2 {
                return Err(AbiError::Length {
                    needed: 2,
                    have: bytes.len(),
                });
            }
            let count = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
            let types = vec![elem.as_ref(); count];
            let (items, used) = decode_sequence(&types, &bytes[2..])?;
            Ok((AbiValue::Array(items), used + 2))
        }
        AbiType::Tuple(fields) => {
            let types: Vec<&AbiType> = fields.iter().collect();
            let (items, used) = decode_sequence(&types, bytes)?;
            Ok((AbiValue::Tuple(items), used))
        }
    }
}

fn decode_len_prefixed(bytes: &[u8]) -> Result<(&[u8], usize), AbiError> {
    if bytes.len() < 2 {
        return Err(AbiError::Length {
            needed: 2,
            have: bytes.len(),
        });
    }
    let len = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
    if bytes.len() < 2 + len {
        return Err(AbiError::Length {
            needed: 2 + len,
            have: bytes.len(),
        });
    }
    Ok((&bytes[2..2 + len], 2 + len))
}

/// Decodes a field sequence with the head/tail layout, returning the
/// values and the total bytes consumed (head plus tails).
fn decode_sequence(types: &[&AbiType], bytes: &[u8]) -> Result<(Vec<AbiValue>, usize), AbiError> {
    let mut values: Vec<Option<AbiValue>> = Vec::with_capacity(types.len());
    values.resize_with(types.len(), || None);
    // (field index, tail offset) in declaration order.
    let mut dynamic: Vec<(usize, usize)> = Vec::new();
    let mut cursor = 0usize;

    let mut i = 0;
    while i < types.len() {
        if *types[i] == AbiType::Bool {
            let run_start = i;
            while i < types.len() && *types[i] == AbiType::Bool {
                i += 1;
            }
            let nbytes = (i - run_start).div_ceil(8);
            if bytes.len() < cursor + nbytes {
                return Err(AbiError::Length {
                    needed: cursor + nbytes,
                    have: bytes.len(),
                });
            }
            for j in run_start..i {
                let bit = j - run_start;
                let set = bytes[cursor + bit / 8] >> (7 - bit % 8) & 1 == 1;
                values[j] = Some(AbiValue::Bool(set));
            }
            cursor += nbytes;
        } else if types[i].is_dynamic() {
            if bytes.len() < cursor + 2 {
                return Err(AbiError::Length {
                    needed: cursor + 2,
                    have: bytes.len(),
                });
            }
            let offset = usize::from(u16::from_be_bytes([bytes[cursor], bytes[cursor + 1]]));
            dynamic.push((i, offset));
            cursor += 2;
            i += 1;
        } else {
            // Static non-bool types always report a size.
            let size = types[i].static_size().ok_or_else(|| {
                AbiError::Encoding(format!("type {} has no static size", types[i]))
            })?;
            if bytes.len() < cursor + size {
                return Err(AbiError::Length {
                    needed: cursor + size,
                    have: bytes.len(),
                });
            }
            let (value, _) = decode_prefix(types[i], &bytes[cursor..cursor + size])?;
            values[i] = Some(value);
            cursor += size;
            i += 1;
        }
    }

    let head_len = cursor;
    let mut consumed = head_len;
    for (k, &(field, offset)) in dynamic.iter().enumerate() {
        if offset < head_len || offset > bytes.len() {
            return Err(AbiError::Encoding(format!(
                "tail offset {offset} out of bounds (head {head_len}, buffer {})",
                bytes.len()
            )));
        }
        let end = match dynamic.get(k + 1) {
            Some(&(_, next)) => next,
            None => bytes.len(),
        };
        if end < offset || end > bytes.len() {
            return Err(AbiError::Encoding(format!(
                "tail offsets not monotonically increasing at field {field}"
            )));
        }
        values[field] = Some(decode(types[field], &bytes[offset..end])?);
        consumed = end;
    }

    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Some(v) => out.push(v),
            None => return Err(AbiError::Encoding("field left undecoded".into())),
        }
    }
    Ok((out, consumed))
}
