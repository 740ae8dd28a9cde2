//! Runtime configuration knobs.
//!
//! Policies left to deployment choice live here so that every call site
//! resolves them the same way. The defaults are the documented behavior
//! of the kernel; see `RuntimeConfig::default`.

use serde::{Deserialize, Serialize};

/// Behavior when a wide-integer state cell exceeds its 512-bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Abort the invocation with `StateError::Overflow`.
    Fail,
    /// Wrap modulo 2^512.
    Wrap,
}

/// Behavior when reading a local state cell that an opted-in account has
/// never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalReadPolicy {
    /// Yield the cell type's zero value.
    ZeroValue,
    /// Abort the invocation with `StateError::Decode`.
    Fail,
}

/// Deployment-level configuration for the dispatcher and state accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Wide-integer overflow policy. Default: `Fail` — the primitive codec
    /// already rejects out-of-range values instead of truncating, and the
    /// wide type extends that rule.
    pub overflow_policy: OverflowPolicy,
    /// Unset local-cell read policy. Default: `ZeroValue`, matching the
    /// zero-initialised local state the execution environment exposes.
    pub local_read_policy: LocalReadPolicy,
    /// Maximum nesting depth for inner calls. Exceeding it is fatal and
    /// non-retryable.
    pub max_inner_call_depth: u8,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            overflow_policy: OverflowPolicy::Fail,
            local_read_policy: LocalReadPolicy::ZeroValue,
            max_inner_call_depth: 8,
        }
    }
}
