//! Block directory of the hash index

use super::block::{search_rightmost, Block, Entry};
use super::hash::HashValue;
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use tracing::debug;

/// Default number of blocks the directory can hold
pub const MASTER_CAPACITY: usize = 512;

/// A block with fewer entries than this tries to merge after a removal
pub const MERGE_THRESHOLD: usize = 16;

/// A block only takes part in a merge while it has fewer entries than this
pub const MERGE_PARTNER_LIMIT: usize = 256;

/// Directory entry: a block and the smallest hash stored in it
#[derive(Debug)]
struct Descriptor {
    min_hash: HashValue,
    block: Box<Block>,
}

/// Sorted directory of blocks
///
/// Descriptors are ordered by `min_hash`, and `min_hash` is always the
/// first hash of the owned block. Every block in the directory is non-empty
/// and each one is owned by exactly one descriptor.
#[derive(Debug)]
pub struct MasterIndex {
    descriptors: Vec<Descriptor>,
    master_capacity: usize,
    block_capacity: usize,
    merge_threshold: usize,
    merge_partner_limit: usize,
}

impl MasterIndex {
    /// Empty directory for `config`
    ///
    /// Fails with [`Error::Config`] for a geometry the split and merge
    /// rules cannot honour.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let mut descriptors = Vec::new();
        descriptors
            .try_reserve_exact(config.master_capacity)
            .map_err(|e| {
                Error::OutOfMemory(format!(
                    "Failed to allocate master index of {} blocks: {}",
                    config.master_capacity, e
                ))
            })?;

        Ok(Self {
            descriptors,
            master_capacity: config.master_capacity,
            block_capacity: config.block_capacity,
            merge_threshold: config.merge_threshold,
            merge_partner_limit: config.merge_partner_limit,
        })
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.descriptors.len() >= self.master_capacity
    }

    pub fn block(&self, pos: usize) -> Option<&Block> {
        self.descriptors.get(pos).map(|d| d.block.as_ref())
    }

    pub fn min_hash(&self, pos: usize) -> Option<HashValue> {
        self.descriptors.get(pos).map(|d| d.min_hash)
    }

    /// Blocks in directory order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.descriptors.iter().map(|d| d.block.as_ref())
    }

    /// Rightmost block whose minimum hash is `<= hash`
    pub fn search(&self, hash: HashValue) -> Option<usize> {
        search_rightmost(&self.descriptors, hash, |d| d.min_hash)
    }

    /// Create the first block of an empty directory holding `entry`
    pub fn create_first(&mut self, entry: Entry) -> Result<()> {
        debug_assert!(self.is_empty());
        let mut block = Box::new(Block::new(self.block_capacity)?);
        block.insert_at(entry, 0);
        self.descriptors.push(Descriptor {
            min_hash: entry.hash,
            block,
        });
        debug!(hash = entry.hash, "Created first index block");
        Ok(())
    }

    /// Insert into block `pos` relative to search position `entry_pos`
    pub fn insert_into(&mut self, pos: usize, entry: Entry, entry_pos: usize) -> usize {
        let at = self.descriptors[pos].block.insert_at(entry, entry_pos);
        if at == 0 {
            self.refresh_min(pos);
        }
        at
    }

    /// Remove entry `entry_pos` from block `pos`
    ///
    /// A block left empty keeps its descriptor until
    /// [`merge_if_small`](Self::merge_if_small) runs.
    pub fn remove_from(&mut self, pos: usize, entry_pos: usize) -> Entry {
        let removed = self.descriptors[pos].block.remove_at(entry_pos);
        if entry_pos == 0 {
            self.refresh_min(pos);
        }
        removed
    }

    /// Split the full block at `pos` in two
    ///
    /// The upper half moves to a new block inserted right behind `pos`.
    /// Returns the number of entries left in the lower block, so callers can
    /// tell which half a pending position falls into. On error nothing is
    /// changed.
    pub fn split(&mut self, pos: usize) -> Result<usize> {
        if self.is_full() {
            return Err(Error::DirectoryFull(format!(
                "Cannot split block {}: master index holds {} blocks",
                pos,
                self.descriptors.len()
            )));
        }

        let upper = Box::new(self.descriptors[pos].block.split_upper_half()?);
        let kept = self.descriptors[pos].block.len();
        let min_hash = upper
            .first_hash()
            .ok_or_else(|| Error::Internal(format!("Split of block {} produced an empty half", pos)))?;

        self.descriptors.insert(
            pos + 1,
            Descriptor {
                min_hash,
                block: upper,
            },
        );
        debug!(
            block = pos,
            kept,
            blocks = self.descriptors.len(),
            "Split index block"
        );
        Ok(kept)
    }

    /// Rebalance after a removal from block `pos`
    ///
    /// A block below the merge threshold is folded into its predecessor if
    /// that one is below the partner limit. Otherwise a block below the
    /// partner limit swallows a successor that is below the threshold.
    /// Empty blocks that cannot be merged are dropped.
    pub fn merge_if_small(&mut self, pos: usize) {
        let len = self.descriptors[pos].block.len();

        if len < self.merge_threshold {
            if pos > 0 && self.descriptors[pos - 1].block.len() < self.merge_partner_limit {
                let removed = self.descriptors.remove(pos);
                self.descriptors[pos - 1].block.absorb(*removed.block);
                debug!(block = pos, into = pos - 1, "Merged index block into predecessor");
            } else if len == 0 {
                self.descriptors.remove(pos);
                debug!(block = pos, "Dropped empty index block");
            }
        } else if len < self.merge_partner_limit
            && pos + 1 < self.descriptors.len()
            && self.descriptors[pos + 1].block.len() < self.merge_threshold
        {
            let removed = self.descriptors.remove(pos + 1);
            self.descriptors[pos].block.absorb(*removed.block);
            debug!(block = pos + 1, into = pos, "Merged successor into index block");
        }
    }

    /// Drop every block
    pub fn clear(&mut self) {
        self.descriptors.clear();
    }

    fn refresh_min(&mut self, pos: usize) {
        let descriptor = &mut self.descriptors[pos];
        if let Some(first) = descriptor.block.first_hash() {
            descriptor.min_hash = first;
        }
    }
}
