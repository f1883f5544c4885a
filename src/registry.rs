//! Variable name registry on top of the blackboard index
//!
//! Keeps the name of every registered variable next to its slot, so that
//! equal hashes of different names can be told apart. Values, types and
//! units belong to the surrounding blackboard and are not stored here.

use crate::blackboard::{BlackboardIndex, IndexStats};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::{hash_name, HashValue, Probe};
use crate::slot::SlotId;
use tracing::{debug, warn};

/// Outcome of [`VariableRegistry::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The name was already registered at this slot
    Existing(SlotId),
    /// The name got a new slot
    Created(SlotId),
    /// No free slot left
    TableFull,
}

impl Registration {
    pub fn slot(self) -> Option<SlotId> {
        match self {
            Self::Existing(slot) | Self::Created(slot) => Some(slot),
            Self::TableFull => None,
        }
    }
}

/// Name → slot table
#[derive(Debug)]
pub struct VariableRegistry {
    index: BlackboardIndex,
    names: Vec<Option<String>>,
}

impl VariableRegistry {
    pub fn new(config: IndexConfig) -> Result<Self> {
        let index = BlackboardIndex::init(config)?;
        let names = vec![None; index.slots().capacity()];
        Ok(Self { index, names })
    }

    /// Register `name`, or return the slot it already has
    pub fn add(&mut self, name: &str) -> Result<Registration> {
        let hash = hash_name(name);
        let probe = self.find(name, hash);
        if let Some(slot) = probe.slot {
            return Ok(Registration::Existing(slot));
        }

        let Some(slot) = self.index.acquire_slot() else {
            warn!(name, "Cannot register variable, blackboard is full");
            return Ok(Registration::TableFull);
        };
        if let Err(e) = self.index.insert(hash, slot, probe.cursor) {
            self.index.release_slot(slot)?;
            return Err(e);
        }

        self.names[slot.index()] = Some(name.to_owned());
        debug!(name, %slot, hash, "Registered variable");
        Ok(Registration::Created(slot))
    }

    /// Slot of `name`
    pub fn get(&self, name: &str) -> Option<SlotId> {
        self.find(name, hash_name(name)).slot
    }

    /// Unregister `name` and free its slot
    pub fn remove(&mut self, name: &str) -> Result<Option<SlotId>> {
        let probe = self.find(name, hash_name(name));
        let Some(slot) = probe.slot else {
            return Ok(None);
        };

        self.index.remove(probe.cursor)?;
        self.index.release_slot(slot)?;
        self.names[slot.index()] = None;
        debug!(name, %slot, "Removed variable");
        Ok(Some(slot))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn name_of(&self, slot: SlotId) -> Option<&str> {
        self.names.get(slot.index())?.as_deref()
    }

    /// Number of registered variables
    pub fn len(&self) -> usize {
        self.index.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered variables in slot order
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &str)> + '_ {
        self.names.iter().enumerate().filter_map(|(slot, name)| {
            name.as_deref()
                .map(|name| (SlotId::new(slot as u32), name))
        })
    }

    pub fn index(&self) -> &BlackboardIndex {
        &self.index
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.index.check_invariants()
    }

    fn find(&self, name: &str, hash: HashValue) -> Probe {
        let names = &self.names;
        self.index.find_by(hash, |slot| {
            names.get(slot.index()).and_then(|n| n.as_deref()) == Some(name)
        })
    }
}
