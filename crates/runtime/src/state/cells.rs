//! Typed global and local state cells over the raw key-value store.

use std::marker::PhantomData;

use avm_types::config::{LocalReadPolicy, OverflowPolicy, RuntimeConfig};
use avm_types::error::StateError;
use avm_types::group::{Address, AppId};
use avm_types::keys;

use super::access::StateAccess;
use super::uint512::Uint512;

/// A value that can live in a state cell.
pub trait StateValue: Clone + Sized {
    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Option<Self>;
    /// The value an unset cell reads as under the zero-value policy.
    fn zero() -> Self;
}

impl StateValue for u64 {
    fn encode(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = bytes.try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    fn zero() -> Self {
        0
    }
}

impl StateValue for bool {
    fn encode(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0] => Some(false),
            [1] => Some(true),
            _ => None,
        }
    }

    fn zero() -> Self {
        false
    }
}

impl StateValue for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }

    fn zero() -> Self {
        Vec::new()
    }
}

impl StateValue for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn zero() -> Self {
        String::new()
    }
}

impl StateValue for Uint512 {
    fn encode(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        Uint512::try_from_be_bytes(bytes)
    }

    fn zero() -> Self {
        Uint512::ZERO
    }
}

/// A named per-application state cell, optionally carrying a default used
/// when the cell has never been written.
#[derive(Clone)]
pub struct GlobalStateCell<T: StateValue> {
    name: &'static str,
    default: Option<T>,
}

impl<T: StateValue> GlobalStateCell<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
        }
    }

    pub fn with_default(name: &'static str, default: T) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A named per-account state cell, readable only after the account has
/// opted in to the application.
#[derive(Clone)]
pub struct LocalStateCell<T: StateValue> {
    name: &'static str,
    _marker: PhantomData<T>,
}

impl<T: StateValue> LocalStateCell<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Typed access to the state cells of one application.
pub struct StateAccessor<'a> {
    state: &'a mut dyn StateAccess,
    app_id: AppId,
    config: &'a RuntimeConfig,
}

impl<'a> StateAccessor<'a> {
    pub fn new(state: &'a mut dyn StateAccess, app_id: AppId, config: &'a RuntimeConfig) -> Self {
        Self {
            state,
            app_id,
            config,
        }
    }

    pub fn global_get<T: StateValue>(&self, cell: &GlobalStateCell<T>) -> Result<T, StateError> {
        let key = keys::global_cell_key(self.app_id, cell.name);
        match self.state.get(&key)? {
            Some(bytes) => T::decode(&bytes).ok_or_else(|| StateError::Decode {
                cell: cell.name.to_string(),
                reason: format!("{} bytes", bytes.len()),
            }),
            None => Ok(cell.default.clone().unwrap_or_else(T::zero)),
        }
    }

    pub fn global_set<T: StateValue>(
        &mut self,
        cell: &GlobalStateCell<T>,
        value: &T,
    ) -> Result<(), StateError> {
        let key = keys::global_cell_key(self.app_id, cell.name);
        self.state.insert(&key, &value.encode())
    }

    pub fn is_opted_in(&self, account: &Address) -> Result<bool, StateError> {
        let key = keys::local_optin_key(self.app_id, account);
        Ok(self.state.get(&key)?.is_some())
    }

    /// Records the account as opted in. Idempotent.
    pub fn opt_in(&mut self, account: &Address) -> Result<(), StateError> {
        let key = keys::local_optin_key(self.app_id, account);
        self.state.insert(&key, &[1])
    }

    pub fn local_get<T: StateValue>(
        &self,
        cell: &LocalStateCell<T>,
        account: &Address,
    ) -> Result<T, StateError> {
        if !self.is_opted_in(account)? {
            return Err(StateError::NotOptedIn(account.to_string()));
        }
        let key = keys::local_cell_key(self.app_id, account, cell.name);
        match self.state.get(&key)? {
            Some(bytes) => T::decode(&bytes).ok_or_else(|| StateError::Decode {
                cell: cell.name.to_string(),
                reason: format!("{} bytes", bytes.len()),
            }),
            None => match self.config.local_read_policy {
                LocalReadPolicy::ZeroValue => Ok(T::zero()),
                LocalReadPolicy::Fail => Err(StateError::Decode {
                    cell: cell.name.to_string(),
                    reason: "unset".to_string(),
                }),
            },
        }
    }

    pub fn local_set<T: StateValue>(
        &mut self,
        cell: &LocalStateCell<T>,
        account: &Address,
        value: &T,
    ) -> Result<(), StateError> {
        if !self.is_opted_in(account)? {
            return Err(StateError::NotOptedIn(account.to_string()));
        }
        let key = keys::local_cell_key(self.app_id, account, cell.name);
        self.state.insert(&key, &value.encode())
    }

    /// Adds to a wide global counter, returning the new value. Overflow
    /// behavior follows the configured policy.
    pub fn global_wide_add(
        &mut self,
        cell: &GlobalStateCell<Uint512>,
        amount: Uint512,
    ) -> Result<Uint512, StateError> {
        let current = self.global_get(cell)?;
        let next = self.wide_add(cell.name, current, amount)?;
        self.global_set(cell, &next)?;
        Ok(next)
    }

    /// Adds to a wide local counter, returning the new value.
    pub fn local_wide_add(
        &mut self,
        cell: &LocalStateCell<Uint512>,
        account: &Address,
        amount: Uint512,
    ) -> Result<Uint512, StateError> {
        let current = self.local_get(cell, account)?;
        let next = self.wide_add(cell.name, current, amount)?;
        self.local_set(cell, account, &next)?;
        Ok(next)
    }

    fn wide_add(
        &self,
        cell: &'static str,
        current: Uint512,
        amount: Uint512,
    ) -> Result<Uint512, StateError> {
        match self.config.overflow_policy {
            OverflowPolicy::Fail => current
                .checked_add(amount)
                .ok_or_else(|| StateError::Overflow(cell.to_string())),
            OverflowPolicy::Wrap => Ok(current.wrapping_add(amount)),
        }
    }
}
