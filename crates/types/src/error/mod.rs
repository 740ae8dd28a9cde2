//! Error taxonomy for the AVM kernel.
//!
//! Every failure in the kernel is fatal to the invocation that raised it:
//! the dispatcher discards all buffered state writes and reports the error
//! kind to the caller. Nothing here is retryable in place.

use crate::group::{OnCompletion, TransactionKind};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the ABI codec while encoding or decoding values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// The encoded buffer is shorter than the type requires.
    #[error("Encoded buffer too short: need {needed} bytes, have {have}")]
    Length { needed: usize, have: usize },
    /// A value does not fit the declared type (oversized integer, wrong
    /// static array length, byte string longer than 65535).
    #[error("Value out of range for declared type: {0}")]
    Range(String),
    /// The buffer is structurally malformed: a bad tail offset, invalid
    /// UTF-8 in a string, trailing bytes, or an unparsable type signature.
    #[error("Malformed encoding: {0}")]
    Encoding(String),
}

impl ErrorCode for AbiError {
    fn code(&self) -> &'static str {
        match self {
            Self::Length { .. } => "ABI_LENGTH",
            Self::Range(_) => "ABI_RANGE",
            Self::Encoding(_) => "ABI_ENCODING",
        }
    }
}

/// Errors raised by the typed state accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A local state cell was read or written for an account that has not
    /// opted in to the application.
    #[error("Account {0} has not opted in")]
    NotOptedIn(String),
    /// A wide-integer cell operation exceeded the 512-bit width and the
    /// configured overflow policy is `Fail`.
    #[error("Wide integer overflow in cell '{0}'")]
    Overflow(String),
    /// A stored value could not be decoded as the cell's declared type.
    #[error("State decode error for cell '{cell}': {reason}")]
    Decode { cell: String, reason: String },
    /// The underlying key-value backend reported a failure.
    #[error("State backend error: {0}")]
    Backend(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotOptedIn(_) => "STATE_NOT_OPTED_IN",
            Self::Overflow(_) => "STATE_OVERFLOW",
            Self::Decode { .. } => "STATE_DECODE",
            Self::Backend(_) => "STATE_BACKEND",
        }
    }
}

/// Errors raised while resolving and executing a method call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No registered method matches the incoming selector.
    #[error("Unknown method selector 0x{}", hex::encode(.0))]
    UnknownMethod([u8; 4]),
    /// A method registration collides with an already-registered selector.
    #[error("Duplicate selector 0x{} for signature '{signature}'", hex::encode(.selector))]
    DuplicateSelector { selector: [u8; 4], signature: String },
    /// The application id is not present in the ledger.
    #[error("Application {0} is not present in the ledger")]
    UnknownApplication(u64),
    /// A reference parameter could not be bound from the transaction group.
    #[error("Reference argument {position} expects {expected}, group slot holds {found:?}")]
    ReferenceMismatch {
        position: usize,
        expected: &'static str,
        found: Option<TransactionKind>,
    },
    /// The invocation's on-completion action is not permitted by the method.
    #[error("Action {actual:?} not allowed; method permits {allowed:?}")]
    ActionNotAllowed {
        actual: OnCompletion,
        allowed: Vec<OnCompletion>,
    },
    /// Nested inner calls exceeded the configured depth limit.
    #[error("Inner call depth exceeded: limit {0}")]
    DepthExceeded(u8),
    /// A codec failure while decoding arguments or encoding the return.
    #[error(transparent)]
    Abi(#[from] AbiError),
    /// A state accessor failure surfaced during execution.
    #[error(transparent)]
    State(#[from] StateError),
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "DISPATCH_UNKNOWN_METHOD",
            Self::DuplicateSelector { .. } => "DISPATCH_DUPLICATE_SELECTOR",
            Self::UnknownApplication(_) => "DISPATCH_UNKNOWN_APP",
            Self::ReferenceMismatch { .. } => "DISPATCH_REFERENCE_MISMATCH",
            Self::ActionNotAllowed { .. } => "DISPATCH_ACTION_NOT_ALLOWED",
            Self::DepthExceeded(_) => "DISPATCH_DEPTH_EXCEEDED",
            Self::Abi(e) => e.code(),
            Self::State(e) => e.code(),
        }
    }
}
