//! The selector-indexed method table and contract registration.

use std::collections::BTreeMap;

use avm_abi::{AbiValue, MethodDescriptor};
use avm_types::error::DispatchError;

use crate::context::CallEnv;
use crate::dispatch::Argument;

/// A registered method implementation. It receives the call environment
/// and the bound arguments in declaration order, and returns the ABI
/// return value (`None` for void methods).
pub type MethodHandler =
    Box<dyn Fn(&mut CallEnv<'_>, &[Argument]) -> Result<Option<AbiValue>, DispatchError>>;

/// The selector index of one contract: every registered descriptor, keyed
/// by its four-byte selector.
#[derive(Default)]
pub struct MethodTable {
    methods: Vec<MethodDescriptor>,
    index: BTreeMap<[u8; 4], usize>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, rejecting selector collisions.
    pub fn register(&mut self, descriptor: MethodDescriptor) -> Result<[u8; 4], DispatchError> {
        let selector = descriptor.selector();
        if self.index.contains_key(&selector) {
            return Err(DispatchError::DuplicateSelector {
                selector,
                signature: descriptor.signature(),
            });
        }
        self.index.insert(selector, self.methods.len());
        self.methods.push(descriptor);
        Ok(selector)
    }

    /// Looks up the descriptor for a selector.
    pub fn resolve(&self, selector: [u8; 4]) -> Result<&MethodDescriptor, DispatchError> {
        self.index
            .get(&selector)
            .map(|&i| &self.methods[i])
            .ok_or(DispatchError::UnknownMethod(selector))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }
}

/// A deployable contract: its method table plus the handler bound to each
/// selector.
#[derive(Default)]
pub struct Contract {
    table: MethodTable,
    handlers: BTreeMap<[u8; 4], MethodHandler>,
}

impl Contract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method with its handler. Builder-style so contracts read as
    /// one registration chain.
    pub fn method(
        mut self,
        descriptor: MethodDescriptor,
        handler: MethodHandler,
    ) -> Result<Self, DispatchError> {
        let selector = self.table.register(descriptor)?;
        self.handlers.insert(selector, handler);
        Ok(self)
    }

    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    pub(crate) fn handler(&self, selector: [u8; 4]) -> Option<&MethodHandler> {
        self.handlers.get(&selector)
    }
}
