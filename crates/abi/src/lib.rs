//! Encoding and decoding of ARC4-style ABI values, and the method
//! descriptors built on top of them.
//!
//! The codec implements the head/tail composite layout: static types are
//! encoded inline (with consecutive booleans bit-packed), dynamic types
//! leave a 2-byte big-endian offset in the head and place their content in
//! the tail region, in declaration order. Method descriptors pair a
//! signature-derived 4-byte selector with typed parameter and return
//! kinds, including transaction-reference parameters that are bound from
//! the surrounding group rather than decoded from argument bytes.

pub mod abi_type;
pub mod abi_value;
pub mod codec;
pub mod method;

pub use abi_type::AbiType;
pub use abi_value::AbiValue;
pub use method::{MethodDescriptor, ParamKind, ReferenceKind, ReturnKind, RETURN_PREFIX};
