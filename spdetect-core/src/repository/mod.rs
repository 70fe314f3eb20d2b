//! In-memory store of the outputs found while scanning.
//!
//! [`UtxoRepository`] deduplicates on the outpoint, so replaying a block (a
//! retried or overlapping scan) never creates a second record. All methods take
//! `&self` and the store can be shared between scans behind an `Arc`.

mod structs;

use std::{
    collections::HashSet,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use bitcoin::{Amount, OutPoint};

pub use structs::{SerializableUtxo, SilentPaymentUtxo};

use crate::error::Result;

#[derive(Debug, Default)]
struct Inner {
    // insertion order
    entries: Vec<SilentPaymentUtxo>,
    outpoints: HashSet<OutPoint>,
}

impl Inner {
    fn insert(&mut self, utxo: SilentPaymentUtxo) -> bool {
        if !self.outpoints.insert(utxo.outpoint()) {
            return false;
        }
        self.entries.push(utxo);
        true
    }
}

#[derive(Debug, Default)]
pub struct UtxoRepository {
    inner: RwLock<Inner>,
}

impl UtxoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `utxo` unless its outpoint is already known.
    ///
    /// Returns whether the record was inserted.
    pub fn add(&self, utxo: SilentPaymentUtxo) -> bool {
        self.write().insert(utxo)
    }

    /// Unspent outputs, in insertion order.
    pub fn get_all(&self) -> Vec<SilentPaymentUtxo> {
        self.read()
            .entries
            .iter()
            .filter(|utxo| !utxo.is_spent)
            .cloned()
            .collect()
    }

    /// Every known output, spent ones included.
    pub fn get_all_including_spent(&self) -> Vec<SilentPaymentUtxo> {
        self.read().entries.clone()
    }

    pub fn get_balance(&self) -> Amount {
        self.read()
            .entries
            .iter()
            .filter(|utxo| !utxo.is_spent)
            .map(|utxo| utxo.value)
            .sum()
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.read().outpoints.contains(outpoint)
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_serializable(&self) -> Vec<SerializableUtxo> {
        self.read().entries.iter().map(Into::into).collect()
    }

    /// Replace the whole content of the store.
    ///
    /// Nothing is replaced if any record is malformed.
    pub fn load_from_serializable(&self, records: Vec<SerializableUtxo>) -> Result<()> {
        let mut loaded = Inner::default();
        for record in records {
            loaded.insert(record.try_into()?);
        }

        log::debug!("loaded {} silent payment outputs", loaded.entries.len());
        *self.write() = loaded;
        Ok(())
    }

    pub fn clear(&self) {
        *self.write() = Inner::default();
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
