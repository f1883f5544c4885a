//! Two-level hash index: lookup, insert, remove and duplicate traversal

use super::block::Entry;
use super::hash::HashValue;
use super::master::MasterIndex;
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::slot::SlotId;

/// Position of an entry: block in the directory, entry in the block
///
/// Only valid until the next insert or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Cursor {
    pub block: usize,
    pub entry: usize,
}

impl Cursor {
    pub fn new(block: usize, entry: usize) -> Self {
        Self { block, entry }
    }
}

/// Result of a lookup
///
/// The cursor is filled in on a miss as well: it is the insertion point
/// for [`HashIndex::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub slot: Option<SlotId>,
    pub cursor: Cursor,
}

impl Probe {
    pub fn is_found(&self) -> bool {
        self.slot.is_some()
    }
}

/// Step direction for [`HashIndex::next_with_same_hash`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Hash → slot index over a directory of sorted blocks
///
/// Equal hashes are allowed and sit next to each other, possibly across a
/// block boundary. The index never looks at names.
#[derive(Debug)]
pub struct HashIndex {
    master: MasterIndex,
    entries: usize,
}

impl HashIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            master: MasterIndex::new(config)?,
            entries: 0,
        })
    }

    /// Number of `(hash, slot)` entries
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn master(&self) -> &MasterIndex {
        &self.master
    }

    /// All entries in hash order
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.master.blocks().flat_map(|block| block.entries().iter())
    }

    /// Find the last entry with `hash`
    ///
    /// On a miss the returned cursor points at the rightmost entry with a
    /// smaller hash (or `(0, 0)`), which is where `insert` expects it.
    pub fn lookup(&self, hash: HashValue) -> Probe {
        let block_pos = self.master.search(hash).unwrap_or(0);
        let Some(block) = self.master.block(block_pos) else {
            return Probe {
                slot: None,
                cursor: Cursor::default(),
            };
        };

        let entry_pos = block.search(hash).unwrap_or(0);
        let slot = block
            .get(entry_pos)
            .filter(|entry| entry.hash == hash)
            .map(|entry| entry.slot);

        Probe {
            slot,
            cursor: Cursor::new(block_pos, entry_pos),
        }
    }

    /// Insert `(hash, slot)` at the cursor returned by the preceding [`lookup`](Self::lookup)
    ///
    /// Splits the target block first if it is full. Fails with
    /// [`Error::OutOfMemory`] or [`Error::DirectoryFull`] without changing
    /// the index.
    pub fn insert(&mut self, hash: HashValue, slot: SlotId, cursor: Cursor) -> Result<()> {
        let entry = Entry::new(hash, slot);

        if self.master.is_empty() {
            self.master.create_first(entry)?;
            self.entries += 1;
            return Ok(());
        }

        self.check_cursor(cursor)?;
        let mut cursor = cursor;
        let full = self
            .master
            .block(cursor.block)
            .map(|block| block.is_full())
            .unwrap_or(false);
        if full {
            let kept = self.master.split(cursor.block)?;
            if cursor.entry >= kept {
                cursor = Cursor::new(cursor.block + 1, cursor.entry - kept);
            }
        }

        self.master.insert_into(cursor.block, entry, cursor.entry);
        self.entries += 1;
        Ok(())
    }

    /// Remove the entry at `cursor` and rebalance its block
    pub fn remove(&mut self, cursor: Cursor) -> Result<Entry> {
        self.check_cursor(cursor)?;
        let removed = self.master.remove_from(cursor.block, cursor.entry);
        self.master.merge_if_small(cursor.block);
        self.entries -= 1;
        Ok(removed)
    }

    /// Step one entry from `cursor` and report its slot if it still carries `hash`
    ///
    /// The cursor moves even when the hash no longer matches; it stays put
    /// when there is nothing left in that direction.
    pub fn next_with_same_hash(
        &self,
        direction: Direction,
        hash: HashValue,
        cursor: &mut Cursor,
    ) -> Option<SlotId> {
        let block = self.master.block(cursor.block)?;

        let next = match direction {
            Direction::Backward if cursor.entry > 0 => {
                Cursor::new(cursor.block, cursor.entry.min(block.len()) - 1)
            }
            Direction::Backward => {
                let block_pos = cursor.block.checked_sub(1)?;
                let previous = self.master.block(block_pos)?;
                Cursor::new(block_pos, previous.len().checked_sub(1)?)
            }
            Direction::Forward if cursor.entry + 1 < block.len() => {
                Cursor::new(cursor.block, cursor.entry + 1)
            }
            Direction::Forward => {
                let block_pos = cursor.block + 1;
                self.master.block(block_pos)?;
                Cursor::new(block_pos, 0)
            }
        };

        *cursor = next;
        self.master
            .block(next.block)
            .and_then(|block| block.get(next.entry))
            .filter(|entry| entry.hash == hash)
            .map(|entry| entry.slot)
    }

    /// Find the entry with `hash` whose slot satisfies `is_match`
    ///
    /// Resolves hash collisions on the caller's side: the lookup hit is
    /// tried first, then its equal-hash neighbours backward and forward.
    /// On a miss the cursor is the one from the plain lookup.
    pub fn find_by<F>(&self, hash: HashValue, mut is_match: F) -> Probe
    where
        F: FnMut(SlotId) -> bool,
    {
        let probe = self.lookup(hash);
        let Some(slot) = probe.slot else {
            return probe;
        };
        if is_match(slot) {
            return probe;
        }

        for direction in [Direction::Backward, Direction::Forward] {
            let mut cursor = probe.cursor;
            while let Some(slot) = self.next_with_same_hash(direction, hash, &mut cursor) {
                if is_match(slot) {
                    return Probe {
                        slot: Some(slot),
                        cursor,
                    };
                }
            }
        }

        Probe {
            slot: None,
            cursor: probe.cursor,
        }
    }

    /// Drop all entries and blocks
    pub fn clear(&mut self) {
        self.master.clear();
        self.entries = 0;
    }

    /// Verify ordering, minimum hashes, block bounds and the entry count
    pub fn check_invariants(&self) -> Result<()> {
        let mut previous: Option<HashValue> = None;
        let mut counted = 0;

        for (pos, block) in self.master.blocks().enumerate() {
            if block.is_empty() {
                return Err(Error::Internal(format!("Block {} is empty", pos)));
            }
            if block.len() > block.capacity() {
                return Err(Error::Internal(format!(
                    "Block {} holds {} entries, capacity {}",
                    pos,
                    block.len(),
                    block.capacity()
                )));
            }
            if self.master.min_hash(pos) != block.first_hash() {
                return Err(Error::Internal(format!(
                    "Block {} minimum {:?} does not match first hash {:?}",
                    pos,
                    self.master.min_hash(pos),
                    block.first_hash()
                )));
            }
            for (entry_pos, entry) in block.entries().iter().enumerate() {
                if previous.is_some_and(|p| p > entry.hash) {
                    return Err(Error::Internal(format!(
                        "Hash {} at ({}, {}) is out of order",
                        entry.hash, pos, entry_pos
                    )));
                }
                previous = Some(entry.hash);
            }
            counted += block.len();
        }

        if counted != self.entries {
            return Err(Error::Internal(format!(
                "Index counts {} entries but blocks hold {}",
                self.entries, counted
            )));
        }
        Ok(())
    }

    fn check_cursor(&self, cursor: Cursor) -> Result<()> {
        let len = self.master.block(cursor.block).map(|block| block.len());
        match len {
            Some(len) if cursor.entry < len => Ok(()),
            _ => Err(Error::InvalidArgument(format!(
                "Cursor ({}, {}) is outside the index",
                cursor.block, cursor.entry
            ))),
        }
    }
}
