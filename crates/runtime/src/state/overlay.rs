//! A copy-on-write overlay for speculative, atomic state changes.

use std::collections::BTreeMap;

use avm_types::error::StateError;

use super::access::StateAccess;

/// The buffered writes of an overlay, ordered by key: `(inserts, deletes)`.
pub type StateChangeSet = (Vec<(Vec<u8>, Vec<u8>)>, Vec<Vec<u8>>);

/// A view over a base state that buffers all writes in memory.
///
/// Reads fall through to the base for keys that have not been written.
/// Writes never touch the base; they are collected with
/// [`into_ordered_batch`](Self::into_ordered_batch) and applied in one
/// `batch_apply` after the invocation succeeds, or simply dropped if it
/// fails. `None` in the write map marks a deletion.
pub struct StateOverlay<'a> {
    base: &'a dyn StateAccess,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StateOverlay<'a> {
    pub fn new(base: &'a dyn StateAccess) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// True if no writes have been buffered.
    pub fn is_clean(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consumes the overlay, producing the buffered changes in key order.
    pub fn into_ordered_batch(self) -> StateChangeSet {
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => inserts.push((key, value)),
                None => deletes.push(key),
            }
        }
        (inserts, deletes)
    }
}

impl StateAccess for StateOverlay<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryState;

    #[test]
    fn reads_fall_through_to_base() {
        let mut base = InMemoryState::default();
        base.insert(b"k1", b"v1").unwrap();

        let overlay = StateOverlay::new(&base);
        assert_eq!(overlay.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(overlay.get(b"missing").unwrap(), None);
    }

    #[test]
    fn writes_shadow_base_without_mutating_it() {
        let mut base = InMemoryState::default();
        base.insert(b"k1", b"v1").unwrap();

        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"k1", b"v2").unwrap();
        overlay.delete(b"k1").unwrap();
        assert_eq!(overlay.get(b"k1").unwrap(), None);

        drop(overlay);
        assert_eq!(base.get(b"k1").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn batch_separates_inserts_and_deletes_in_key_order() {
        let base = InMemoryState::default();
        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"b", b"2").unwrap();
        overlay.insert(b"a", b"1").unwrap();
        overlay.delete(b"c").unwrap();

        let (inserts, deletes) = overlay.into_ordered_batch();
        assert_eq!(
            inserts,
            vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]
        );
        assert_eq!(deletes, vec![b"c".to_vec()]);
    }

    #[test]
    fn dropped_overlay_changes_nothing() {
        let mut base = InMemoryState::default();
        base.insert(b"k", b"orig").unwrap();
        {
            let mut overlay = StateOverlay::new(&base);
            overlay.insert(b"k", b"changed").unwrap();
            overlay.insert(b"new", b"value").unwrap();
        }
        assert_eq!(base.get(b"k").unwrap(), Some(b"orig".to_vec()));
        assert_eq!(base.get(b"new").unwrap(), None);
    }
}
