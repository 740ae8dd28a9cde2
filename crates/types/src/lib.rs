//! Core types shared across the AVM kernel crates.
//!
//! This crate carries no runtime logic of its own: it defines the error
//! taxonomy, the runtime configuration, the well-known state key layout,
//! and the transaction-group model that the ABI codec and the dispatcher
//! build on.

pub mod config;
pub mod error;
pub mod group;
pub mod keys;

/// The canonical result type used across the kernel crates.
pub type Result<T, E = error::DispatchError> = std::result::Result<T, E>;
