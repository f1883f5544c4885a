//! Variable name hashing

/// Hashed variable name
///
/// Not unique: two names may produce the same value. The index only ever
/// compares hashes, name checks are the caller's job.
pub type HashValue = u64;

const HASH_BASE: u64 = 31;

/// Polynomial rolling hash (base 31) over the bytes of `name`
///
/// Overflow wraps. The empty name hashes to 0.
pub fn hash_name(name: &str) -> HashValue {
    name.bytes().fold(0u64, |acc, byte| {
        acc.wrapping_mul(HASH_BASE).wrapping_add(byte as u64)
    })
}
