//! Free-slot reservoir for the variable table

use super::id::SlotId;
use crate::error::{Error, Result};
use tracing::{debug, error};

/// Stack of free slot numbers
///
/// The last released slot is the next one handed out. A per-slot flag
/// tracks which slots are out so that double releases are caught.
#[derive(Debug)]
pub struct SlotAllocator {
    /// Free slots, top of the stack at the end
    free: Vec<SlotId>,
    /// `acquired[n]` is set while slot `n` is handed out
    acquired: Vec<bool>,
}

impl SlotAllocator {
    /// Create an allocator for `capacity` slots, all of them free
    ///
    /// The reservoir is filled so that the first acquisitions return
    /// `0, 1, 2, ...` in order.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity > i32::MAX as usize {
            return Err(Error::InvalidArgument(format!(
                "Slot capacity {} exceeds {}",
                capacity,
                i32::MAX
            )));
        }

        let mut free = Vec::new();
        free.try_reserve_exact(capacity).map_err(|e| {
            Error::OutOfMemory(format!("Failed to allocate {} free slots: {}", capacity, e))
        })?;
        let mut acquired = Vec::new();
        acquired.try_reserve_exact(capacity).map_err(|e| {
            Error::OutOfMemory(format!("Failed to allocate {} slot flags: {}", capacity, e))
        })?;

        free.extend((0..capacity as u32).rev().map(SlotId::new));
        acquired.resize(capacity, false);

        Ok(Self { free, acquired })
    }

    /// Take a free slot, `None` when the table is full
    pub fn acquire(&mut self) -> Option<SlotId> {
        match self.free.pop() {
            Some(slot) => {
                self.acquired[slot.index()] = true;
                Some(slot)
            }
            None => {
                debug!(capacity = self.capacity(), "Blackboard is full");
                None
            }
        }
    }

    /// Return a slot to the reservoir
    ///
    /// Releasing a slot that is out of range or not currently acquired is
    /// an internal consistency violation. It is logged and reported as
    /// [`Error::Internal`]; the caller should stop using the table.
    pub fn release(&mut self, slot: SlotId) -> Result<()> {
        let index = slot.index();
        if index >= self.acquired.len() {
            error!(%slot, capacity = self.capacity(), "Released slot out of range");
            return Err(Error::Internal(format!(
                "{} is outside the table capacity {}",
                slot,
                self.capacity()
            )));
        }
        if !self.acquired[index] {
            error!(%slot, "More free blackboard slots than expected");
            return Err(Error::Internal(format!(
                "{} released but not acquired",
                slot
            )));
        }

        self.acquired[index] = false;
        self.free.push(slot);
        Ok(())
    }

    /// Check whether `slot` is currently handed out
    pub fn is_acquired(&self, slot: SlotId) -> bool {
        self.acquired.get(slot.index()).copied().unwrap_or(false)
    }

    /// Number of slots the table was created with
    pub fn capacity(&self) -> usize {
        self.acquired.len()
    }

    /// Number of slots available for [`acquire`](Self::acquire)
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of slots currently handed out
    pub fn used_count(&self) -> usize {
        self.capacity() - self.free_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_order_is_ascending() -> Result<()> {
        let mut slots = SlotAllocator::new(4)?;

        assert_eq!(slots.acquire(), Some(SlotId::new(0)));
        assert_eq!(slots.acquire(), Some(SlotId::new(1)));
        assert_eq!(slots.acquire(), Some(SlotId::new(2)));
        Ok(())
    }

    #[test]
    fn test_exhaustion() -> Result<()> {
        let mut slots = SlotAllocator::new(3)?;

        for _ in 0..3 {
            assert!(slots.acquire().is_some());
        }
        assert_eq!(slots.acquire(), None);
        assert_eq!(slots.free_count(), 0);
        assert_eq!(slots.used_count(), 3);

        slots.release(SlotId::new(1))?;
        assert_eq!(slots.acquire(), Some(SlotId::new(1)));
        assert_eq!(slots.acquire(), None);
        Ok(())
    }

    #[test]
    fn test_reuse_is_lifo() -> Result<()> {
        let mut slots = SlotAllocator::new(8)?;
        let a = slots.acquire().unwrap();
        let b = slots.acquire().unwrap();

        slots.release(a)?;
        slots.release(b)?;

        assert_eq!(slots.acquire(), Some(b));
        assert_eq!(slots.acquire(), Some(a));
        Ok(())
    }

    #[test]
    fn test_double_release_is_rejected() -> Result<()> {
        let mut slots = SlotAllocator::new(2)?;
        let a = slots.acquire().unwrap();

        slots.release(a)?;
        assert!(matches!(slots.release(a), Err(Error::Internal(_))));
        // Never acquired
        assert!(matches!(
            slots.release(SlotId::new(1)),
            Err(Error::Internal(_))
        ));
        assert_eq!(slots.free_count(), 2);
        Ok(())
    }

    #[test]
    fn test_out_of_range_release() -> Result<()> {
        let mut slots = SlotAllocator::new(2)?;
        assert!(matches!(
            slots.release(SlotId::new(2)),
            Err(Error::Internal(_))
        ));
        Ok(())
    }

    #[test]
    fn test_zero_capacity() -> Result<()> {
        let mut slots = SlotAllocator::new(0)?;
        assert_eq!(slots.acquire(), None);
        Ok(())
    }
}
