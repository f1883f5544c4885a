//! Blackboard hash index
//!
//! Maps the hash of a variable name to the slot holding that variable.
//! Two levels, both kept sorted by hash:
//!
//! ```text
//! MasterIndex (≤ 512 descriptors, sorted by min hash)
//!   ├─→ [min=0x0012] → Block [0x0012→7, 0x0040→3, 0x0040→9, ...]   (≤ 512 entries)
//!   ├─→ [min=0x8a31] → Block [0x8a31→1, 0x9000→4, ...]
//!   └─→ [min=0xf100] → Block [0xf100→0, ...]
//! ```
//!
//! A lookup is a binary search over the descriptors followed by a binary
//! search inside one block. Full blocks are split in half on insert; small
//! blocks are merged into a neighbour on remove (below 16 entries, into a
//! neighbour below 256).
//!
//! The index is not synchronised. Callers serialise access, typically by
//! holding the blackboard lock around a `lookup` + `insert`/`remove` pair;
//! cursors are not valid across other mutations.

pub mod block;
pub mod hash;
pub mod master;
pub mod service;

pub use block::{Block, Entry, BLOCK_CAPACITY};
pub use hash::{hash_name, HashValue};
pub use master::{MasterIndex, MASTER_CAPACITY, MERGE_PARTNER_LIMIT, MERGE_THRESHOLD};
pub use service::{Cursor, Direction, HashIndex, Probe};
