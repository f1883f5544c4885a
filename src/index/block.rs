//! Leaf level of the hash index

use super::hash::HashValue;
use crate::error::{Error, Result};
use crate::slot::SlotId;

/// Default number of entries a block holds before it is split
pub const BLOCK_CAPACITY: usize = 512;

/// One `(hash, slot)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub hash: HashValue,
    pub slot: SlotId,
}

impl Entry {
    pub fn new(hash: HashValue, slot: SlotId) -> Self {
        Self { hash, slot }
    }
}

/// Rightmost position whose key is `<= target`, `None` if every key is greater
///
/// `items` must be sorted ascending by `key`. Shared by the block and the
/// master directory.
pub(crate) fn search_rightmost<T, F>(items: &[T], target: HashValue, key: F) -> Option<usize>
where
    F: Fn(&T) -> HashValue,
{
    items.partition_point(|item| key(item) <= target).checked_sub(1)
}

/// Bounded run of entries sorted ascending by hash
///
/// The entry buffer is reserved once at creation and never grows past
/// `capacity`; the owner splits a full block before inserting into it.
#[derive(Debug)]
pub struct Block {
    entries: Vec<Entry>,
    capacity: usize,
}

impl Block {
    /// Allocate an empty block
    ///
    /// Fails with [`Error::OutOfMemory`] if the entry buffer cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity).map_err(|e| {
            Error::OutOfMemory(format!(
                "Failed to allocate block of {} entries: {}",
                capacity, e
            ))
        })?;
        Ok(Self { entries, capacity })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, pos: usize) -> Option<&Entry> {
        self.entries.get(pos)
    }

    /// Smallest hash in the block
    pub fn first_hash(&self) -> Option<HashValue> {
        self.entries.first().map(|e| e.hash)
    }

    /// Rightmost entry whose hash is `<= hash`
    pub fn search(&self, hash: HashValue) -> Option<usize> {
        search_rightmost(&self.entries, hash, |e| e.hash)
    }

    /// Insert `entry` relative to a search position and return where it landed
    ///
    /// Goes to index 0 when `pos` is 0 and the new hash sorts before the
    /// first entry, otherwise right behind `pos`. Equal hashes therefore
    /// end up after the existing ones.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is past the last entry of a non-empty block.
    pub fn insert_at(&mut self, entry: Entry, pos: usize) -> usize {
        debug_assert!(!self.is_full(), "insert into full block");
        let at = match self.entries.first() {
            None => 0,
            Some(first) if pos == 0 && entry.hash < first.hash => 0,
            Some(_) => pos + 1,
        };
        self.entries.insert(at, entry);
        at
    }

    /// Remove the entry at `pos`, shifting the tail left
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of range.
    pub fn remove_at(&mut self, pos: usize) -> Entry {
        self.entries.remove(pos)
    }

    /// Move the upper half (`len / 2 ..`) into a new block of the same capacity
    pub(crate) fn split_upper_half(&mut self) -> Result<Block> {
        let mut upper = Block::new(self.capacity)?;
        let half = self.entries.len() / 2;
        upper.entries.extend(self.entries.drain(half..));
        Ok(upper)
    }

    /// Append all entries of `other`, which must sort after ours
    pub(crate) fn absorb(&mut self, mut other: Block) {
        debug_assert!(self.len() + other.len() <= self.capacity);
        self.entries.append(&mut other.entries);
    }
}
