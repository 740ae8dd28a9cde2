//! The in-memory ledger: registered contracts, the backing state store,
//! and the commit-or-discard dispatch entry point.

use std::collections::BTreeMap;

use sha2::{Digest, Sha512_256};

use avm_types::config::RuntimeConfig;
use avm_types::error::{DispatchError, StateError};
use avm_types::group::{Address, AppId};

use crate::dispatch::{run_invocation, CallRequest, InvocationOutcome};
use crate::state::{
    GlobalStateCell, LocalStateCell, StateAccess, StateAccessor, StateOverlay, StateValue,
};
use crate::table::Contract;

/// The deterministic account address of an application, derived from its
/// id. Inner transactions from a contract use this as their sender.
pub fn app_address(app_id: AppId) -> Address {
    let mut hasher = Sha512_256::new();
    hasher.update(b"appID");
    hasher.update(app_id.to_be_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Address(bytes)
}

/// A `BTreeMap`-backed state store.
#[derive(Default)]
pub struct InMemoryState {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateAccess for InMemoryState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// The top-level runtime: contracts keyed by application id over a single
/// state store.
///
/// [`dispatch`](Self::dispatch) is the only way state changes: it runs
/// the invocation against an overlay and applies the buffered writes in
/// one batch only on success. A failing invocation leaves the store
/// exactly as it was.
pub struct Ledger {
    contracts: BTreeMap<AppId, Contract>,
    config: RuntimeConfig,
    state: InMemoryState,
}

impl Ledger {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            contracts: BTreeMap::new(),
            config,
            state: InMemoryState::new(),
        }
    }

    pub fn register_contract(&mut self, app_id: AppId, contract: Contract) {
        self.contracts.insert(app_id, contract);
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Executes one call to completion. All state writes, the caller's
    /// and any inner calls' alike, commit atomically on success and are
    /// discarded on any error.
    pub fn dispatch(&mut self, request: &CallRequest) -> Result<InvocationOutcome, DispatchError> {
        let mut overlay = StateOverlay::new(&self.state);
        let outcome = run_invocation(&self.contracts, &self.config, &mut overlay, request, 0)?;
        let (inserts, deletes) = overlay.into_ordered_batch();
        self.state.batch_apply(&inserts, &deletes)?;
        Ok(outcome)
    }

    /// Opts an account in to an application directly, outside any call.
    /// Useful for test setup and administrative tooling.
    pub fn opt_in(&mut self, app_id: AppId, account: &Address) -> Result<(), StateError> {
        StateAccessor::new(&mut self.state, app_id, &self.config).opt_in(account)
    }

    /// Reads a global cell from committed state.
    pub fn read_global<T: StateValue>(
        &mut self,
        app_id: AppId,
        cell: &GlobalStateCell<T>,
    ) -> Result<T, StateError> {
        StateAccessor::new(&mut self.state, app_id, &self.config).global_get(cell)
    }

    /// Reads a local cell from committed state.
    pub fn read_local<T: StateValue>(
        &mut self,
        app_id: AppId,
        cell: &LocalStateCell<T>,
        account: &Address,
    ) -> Result<T, StateError> {
        StateAccessor::new(&mut self.state, app_id, &self.config).local_get(cell, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_addresses_are_deterministic_and_distinct() {
        assert_eq!(app_address(7), app_address(7));
        assert_ne!(app_address(7), app_address(8));
    }

    #[test]
    fn in_memory_state_round_trips() {
        let mut state = InMemoryState::new();
        assert!(state.is_empty());
        state.insert(b"k", b"v").unwrap();
        assert_eq!(state.get(b"k").unwrap(), Some(b"v".to_vec()));
        state.delete(b"k").unwrap();
        assert_eq!(state.get(b"k").unwrap(), None);
    }

    #[test]
    fn batch_apply_handles_inserts_and_deletes() {
        let mut state = InMemoryState::new();
        state.insert(b"gone", b"x").unwrap();
        state
            .batch_apply(
                &[(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())],
                &[b"gone".to_vec()],
            )
            .unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(b"gone").unwrap(), None);
        assert_eq!(state.get(b"a").unwrap(), Some(b"1".to_vec()));
    }
}
