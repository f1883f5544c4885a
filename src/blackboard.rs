//! Index and slot allocator with a shared lifecycle
//!
//! [`BlackboardIndex::init`] builds an empty index and a full free-slot
//! reservoir; [`BlackboardIndex::close`] (or dropping it) releases every
//! block. Closing and re-initialising yields a fresh, empty table.

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::index::{Cursor, Direction, Entry, HashIndex, HashValue, Probe};
use crate::slot::{SlotAllocator, SlotId};
use serde::Serialize;
use tracing::info;

/// Snapshot of index occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub blocks: usize,
    pub min_block_len: usize,
    pub max_block_len: usize,
    pub block_capacity: usize,
    pub capacity: usize,
    pub used_slots: usize,
    pub free_slots: usize,
}

/// Hash index plus slot allocator for one variable table
#[derive(Debug)]
pub struct BlackboardIndex {
    config: IndexConfig,
    index: HashIndex,
    slots: SlotAllocator,
}

impl BlackboardIndex {
    /// Create an empty index with `config.capacity` free slots
    pub fn init(config: IndexConfig) -> Result<Self> {
        let index = HashIndex::new(&config)?;
        let slots = SlotAllocator::new(config.capacity)?;

        info!(
            capacity = config.capacity,
            block_capacity = config.block_capacity,
            master_capacity = config.master_capacity,
            "Initialized blackboard index"
        );
        Ok(Self {
            config,
            index,
            slots,
        })
    }

    /// Free all blocks and the slot reservoir
    pub fn close(self) {
        info!(
            entries = self.index.len(),
            blocks = self.index.master().len(),
            "Closing blackboard index"
        );
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn index(&self) -> &HashIndex {
        &self.index
    }

    pub fn slots(&self) -> &SlotAllocator {
        &self.slots
    }

    pub fn lookup(&self, hash: HashValue) -> Probe {
        self.index.lookup(hash)
    }

    pub fn insert(&mut self, hash: HashValue, slot: SlotId, cursor: Cursor) -> Result<()> {
        self.index.insert(hash, slot, cursor)
    }

    pub fn remove(&mut self, cursor: Cursor) -> Result<Entry> {
        self.index.remove(cursor)
    }

    pub fn next_with_same_hash(
        &self,
        direction: Direction,
        hash: HashValue,
        cursor: &mut Cursor,
    ) -> Option<SlotId> {
        self.index.next_with_same_hash(direction, hash, cursor)
    }

    pub fn find_by<F>(&self, hash: HashValue, is_match: F) -> Probe
    where
        F: FnMut(SlotId) -> bool,
    {
        self.index.find_by(hash, is_match)
    }

    /// Take a free slot, `None` when the table is full
    pub fn acquire_slot(&mut self) -> Option<SlotId> {
        self.slots.acquire()
    }

    pub fn release_slot(&mut self, slot: SlotId) -> Result<()> {
        self.slots.release(slot)
    }

    pub fn stats(&self) -> IndexStats {
        let lens = self.index.master().blocks().map(|block| block.len());
        let (min_block_len, max_block_len) = lens.fold(None, |acc, len| match acc {
            None => Some((len, len)),
            Some((lo, hi)) => Some((usize::min(lo, len), usize::max(hi, len))),
        })
        .unwrap_or((0, 0));

        IndexStats {
            entries: self.index.len(),
            blocks: self.index.master().len(),
            min_block_len,
            max_block_len,
            block_capacity: self.config.block_capacity,
            capacity: self.slots.capacity(),
            used_slots: self.slots.used_count(),
            free_slots: self.slots.free_count(),
        }
    }

    /// Structural checks of the index plus slot accounting
    ///
    /// Every indexed slot must be acquired and indexed only once.
    pub fn check_invariants(&self) -> Result<()> {
        self.index.check_invariants()?;

        let mut seen = vec![false; self.slots.capacity()];
        for entry in self.index.iter() {
            if !self.slots.is_acquired(entry.slot) {
                return Err(Error::Internal(format!(
                    "{} is indexed under hash {} but not acquired",
                    entry.slot, entry.hash
                )));
            }
            let flag = &mut seen[entry.slot.index()];
            if *flag {
                return Err(Error::Internal(format!("{} is indexed twice", entry.slot)));
            }
            *flag = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hash_name;

    #[test]
    fn test_init_is_empty() -> Result<()> {
        let bb = BlackboardIndex::init(IndexConfig::with_capacity(16))?;
        let stats = bb.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.blocks, 0);
        assert_eq!(stats.free_slots, 16);
        assert_eq!(stats.min_block_len, 0);
        bb.check_invariants()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IndexConfig {
            block_capacity: 0,
            ..IndexConfig::default()
        };
        assert!(matches!(
            BlackboardIndex::init(config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_close_and_reinit() -> Result<()> {
        let config = IndexConfig::with_capacity(8);
        let mut bb = BlackboardIndex::init(config.clone())?;
        for name in ["a", "b", "c"] {
            let hash = hash_name(name);
            let slot = bb.acquire_slot().unwrap();
            let probe = bb.lookup(hash);
            bb.insert(hash, slot, probe.cursor)?;
        }
        assert_eq!(bb.stats().entries, 3);
        bb.close();

        let mut bb = BlackboardIndex::init(config)?;
        assert_eq!(bb.stats().entries, 0);
        assert_eq!(bb.stats().free_slots, 8);
        assert_eq!(bb.acquire_slot(), Some(SlotId::new(0)));
        Ok(())
    }

    #[test]
    fn test_invariants_catch_unacquired_slot() -> Result<()> {
        let mut bb = BlackboardIndex::init(IndexConfig::with_capacity(4))?;
        let probe = bb.lookup(5);
        bb.insert(5, SlotId::new(3), probe.cursor)?;
        assert!(matches!(bb.check_invariants(), Err(Error::Internal(_))));
        Ok(())
    }
}
