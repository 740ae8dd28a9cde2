//! The AVM kernel runtime: method tables, the call dispatcher, typed
//! state access and inner calls.
//!
//! Execution is single-threaded and strictly run-to-completion. A
//! dispatch buffers all state writes in a copy-on-write overlay and
//! commits them only when the invocation (including any inner calls it
//! issued) succeeds; on any failure the writes are discarded wholesale.

pub mod context;
pub mod dispatch;
pub mod itxn;
pub mod ledger;
pub mod state;
pub mod table;

pub use context::{CallContext, CallEnv};
pub use dispatch::{Argument, CallRequest, InvocationOutcome};
pub use itxn::InnerCall;
pub use ledger::{app_address, InMemoryState, Ledger};
pub use table::{Contract, MethodHandler, MethodTable};
