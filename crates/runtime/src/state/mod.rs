//! Persistent-state access: the byte-oriented backend trait, the
//! copy-on-write overlay, and the typed cell layer on top.

mod access;
mod cells;
mod overlay;
mod uint512;

pub use access::StateAccess;
pub use cells::{GlobalStateCell, LocalStateCell, StateAccessor, StateValue};
pub use overlay::{StateChangeSet, StateOverlay};
pub use uint512::Uint512;
