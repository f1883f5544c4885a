//! Slot allocation for the blackboard variable table
//!
//! Every variable known to the blackboard lives in one row of a flat,
//! externally owned table. The allocator hands out row numbers and takes
//! them back; the hash index maps names to them.
//!
//! ```text
//! SlotAllocator (capacity 6)
//!   free:     [5, 4, 3]   ← top
//!   acquired: [x, x, x, _, _, _]
//! ```

pub mod allocator;
pub mod id;

pub use allocator::SlotAllocator;
pub use id::SlotId;
