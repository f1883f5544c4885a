//! Lock-protected registry handle for use from several tasks

use crate::blackboard::IndexStats;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::registry::{Registration, VariableRegistry};
use crate::slot::SlotId;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a [`VariableRegistry`] behind a mutex
///
/// Each call takes the lock for the whole lookup-and-modify sequence, so
/// cursors never leak across other writers.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<VariableRegistry>>,
}

impl SharedRegistry {
    pub fn new(config: IndexConfig) -> Result<Self> {
        Ok(Self::from_registry(VariableRegistry::new(config)?))
    }

    pub fn from_registry(registry: VariableRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn add(&self, name: &str) -> Result<Registration> {
        self.inner.lock().add(name)
    }

    pub fn get(&self, name: &str) -> Option<SlotId> {
        self.inner.lock().get(name)
    }

    pub fn remove(&self, name: &str) -> Result<Option<SlotId>> {
        self.inner.lock().remove(name)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.lock().stats()
    }

    /// Run `f` with the registry locked
    pub fn with<R>(&self, f: impl FnOnce(&mut VariableRegistry) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
