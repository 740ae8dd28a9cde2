//! The per-invocation call context handed to method handlers.

use std::collections::BTreeMap;

use avm_types::config::RuntimeConfig;
use avm_types::error::StateError;
use avm_types::group::{Address, AppId, OnCompletion, TransactionGroup, TransactionRecord};

use crate::state::{
    GlobalStateCell, LocalStateCell, StateAccess, StateAccessor, StateValue, Uint512,
};
use crate::table::Contract;

/// The immutable facts of one invocation: who called, which application,
/// with what action, against which transaction group, at what nesting
/// depth.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub sender: Address,
    pub app_id: AppId,
    pub on_completion: OnCompletion,
    pub group: TransactionGroup,
    pub depth: u8,
}

/// The environment a method handler executes in. It exposes the call
/// context, typed state access scoped to the current application, and the
/// inner-call builder.
///
/// All state operations go through the overlay installed by the
/// dispatcher, so nothing a handler does is visible outside the
/// invocation until it commits.
pub struct CallEnv<'a> {
    pub(crate) contracts: &'a BTreeMap<AppId, Contract>,
    pub(crate) config: &'a RuntimeConfig,
    pub(crate) state: &'a mut dyn StateAccess,
    pub(crate) ctx: CallContext,
    pub(crate) inner_transactions: Vec<TransactionRecord>,
}

impl<'a> CallEnv<'a> {
    pub fn sender(&self) -> &Address {
        &self.ctx.sender
    }

    pub fn app_id(&self) -> AppId {
        self.ctx.app_id
    }

    pub fn on_completion(&self) -> OnCompletion {
        self.ctx.on_completion
    }

    pub fn group(&self) -> &TransactionGroup {
        &self.ctx.group
    }

    pub fn depth(&self) -> u8 {
        self.ctx.depth
    }

    fn accessor(&mut self) -> StateAccessor<'_> {
        StateAccessor::new(&mut *self.state, self.ctx.app_id, self.config)
    }

    pub fn global_get<T: StateValue>(
        &mut self,
        cell: &GlobalStateCell<T>,
    ) -> Result<T, StateError> {
        self.accessor().global_get(cell)
    }

    pub fn global_set<T: StateValue>(
        &mut self,
        cell: &GlobalStateCell<T>,
        value: &T,
    ) -> Result<(), StateError> {
        self.accessor().global_set(cell, value)
    }

    pub fn is_opted_in(&mut self, account: &Address) -> Result<bool, StateError> {
        self.accessor().is_opted_in(account)
    }

    pub fn opt_in(&mut self, account: &Address) -> Result<(), StateError> {
        self.accessor().opt_in(account)
    }

    pub fn local_get<T: StateValue>(
        &mut self,
        cell: &LocalStateCell<T>,
        account: &Address,
    ) -> Result<T, StateError> {
        self.accessor().local_get(cell, account)
    }

    pub fn local_set<T: StateValue>(
        &mut self,
        cell: &LocalStateCell<T>,
        account: &Address,
        value: &T,
    ) -> Result<(), StateError> {
        self.accessor().local_set(cell, account, value)
    }

    pub fn global_wide_add(
        &mut self,
        cell: &GlobalStateCell<Uint512>,
        amount: Uint512,
    ) -> Result<Uint512, StateError> {
        self.accessor().global_wide_add(cell, amount)
    }

    pub fn local_wide_add(
        &mut self,
        cell: &LocalStateCell<Uint512>,
        account: &Address,
        amount: Uint512,
    ) -> Result<Uint512, StateError> {
        self.accessor().local_wide_add(cell, account, amount)
    }
}
