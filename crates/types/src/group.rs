//! The transaction-group model.
//!
//! A [`TransactionGroup`] is the ordered sequence of transaction records
//! surrounding one top-level invocation. It is read-only to contract logic;
//! the dispatcher consumes its slots positionally when binding reference
//! arguments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An application id.
pub type AppId = u64;

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

/// The kind tag of a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Payment,
    AssetTransfer,
    ApplicationCall,
}

/// One transaction record in a group.
///
/// Only the fields the kernel binds or reports are modeled; validation of
/// the records themselves happens outside this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionRecord {
    Payment {
        sender: Address,
        receiver: Address,
        amount: u64,
    },
    AssetTransfer {
        sender: Address,
        receiver: Address,
        asset_id: u64,
        amount: u64,
    },
    ApplicationCall {
        sender: Address,
        app_id: AppId,
        args: Vec<Vec<u8>>,
    },
}

impl TransactionRecord {
    /// The kind tag used when matching reference parameters.
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Payment { .. } => TransactionKind::Payment,
            Self::AssetTransfer { .. } => TransactionKind::AssetTransfer,
            Self::ApplicationCall { .. } => TransactionKind::ApplicationCall,
        }
    }

    /// The sender of the transaction, whatever its kind.
    pub fn sender(&self) -> &Address {
        match self {
            Self::Payment { sender, .. }
            | Self::AssetTransfer { sender, .. }
            | Self::ApplicationCall { sender, .. } => sender,
        }
    }
}

/// The ordered, read-only sequence of transaction records for one
/// invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    records: Vec<TransactionRecord>,
}

impl TransactionGroup {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TransactionRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }
}

/// The on-completion action of an application call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCompletion {
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_tags() {
        let sender = Address([1u8; 32]);
        let receiver = Address([2u8; 32]);
        let pay = TransactionRecord::Payment {
            sender,
            receiver,
            amount: 100_000,
        };
        assert_eq!(pay.kind(), TransactionKind::Payment);
        assert_eq!(pay.sender(), &sender);

        let appl = TransactionRecord::ApplicationCall {
            sender,
            app_id: 7,
            args: vec![],
        };
        assert_eq!(appl.kind(), TransactionKind::ApplicationCall);
    }

    #[test]
    fn group_is_positional() {
        let sender = Address([1u8; 32]);
        let receiver = Address([2u8; 32]);
        let group = TransactionGroup::new(vec![
            TransactionRecord::Payment {
                sender,
                receiver,
                amount: 1,
            },
            TransactionRecord::AssetTransfer {
                sender,
                receiver,
                asset_id: 9,
                amount: 2,
            },
        ]);
        assert_eq!(group.len(), 2);
        assert_eq!(group.get(0).unwrap().kind(), TransactionKind::Payment);
        assert_eq!(group.get(1).unwrap().kind(), TransactionKind::AssetTransfer);
        assert!(group.get(2).is_none());
    }

    #[test]
    fn records_round_trip_through_json() {
        let record = TransactionRecord::Payment {
            sender: Address([3u8; 32]),
            receiver: Address([4u8; 32]),
            amount: 42,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: TransactionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
