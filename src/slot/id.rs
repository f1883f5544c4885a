//! Slot handles into the flat variable table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of one row in the blackboard's variable table
///
/// Valid range is `0..capacity` of the owning [`SlotAllocator`](super::SlotAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Create a slot handle
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw slot number
    pub fn get(self) -> u32 {
        self.0
    }

    /// Slot number as a table index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for SlotId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}
