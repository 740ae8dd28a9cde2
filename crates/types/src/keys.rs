//! Defines constants and helpers for well-known state keys.
//!
//! These provide a single source of truth for the keys under which the
//! state accessor stores cell values, preventing typos and ensuring every
//! module addresses the same entries.

use crate::group::Address;

/// The state key prefix for global state cells, keyed by application.
pub const GLOBAL_STATE_PREFIX: &[u8] = b"global::";

/// The state key prefix for per-account local state cells.
pub const LOCAL_STATE_PREFIX: &[u8] = b"local::";

/// The state key prefix for local-state opt-in markers.
pub const LOCAL_OPTIN_PREFIX: &[u8] = b"local::optin::";

/// The state key for a global cell: `global::<app-id>::<name>`.
pub fn global_cell_key(app_id: u64, name: &str) -> Vec<u8> {
    [
        GLOBAL_STATE_PREFIX,
        app_id.to_be_bytes().as_ref(),
        b"::",
        name.as_bytes(),
    ]
    .concat()
}

/// The state key for a local cell: `local::<app-id>::<account>::<name>`.
pub fn local_cell_key(app_id: u64, account: &Address, name: &str) -> Vec<u8> {
    [
        LOCAL_STATE_PREFIX,
        app_id.to_be_bytes().as_ref(),
        b"::",
        account.as_ref(),
        b"::",
        name.as_bytes(),
    ]
    .concat()
}

/// The state key marking that an account has opted in to an application.
pub fn local_optin_key(app_id: u64, account: &Address) -> Vec<u8> {
    [
        LOCAL_OPTIN_PREFIX,
        app_id.to_be_bytes().as_ref(),
        b"::",
        account.as_ref(),
    ]
    .concat()
}
