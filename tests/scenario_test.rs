//! End-to-end behaviour of the blackboard index

use bbindex::error::Result;
use bbindex::{BlackboardIndex, Direction, IndexConfig, SlotId};

fn insert(bb: &mut BlackboardIndex, hash: u64) -> Result<SlotId> {
    let slot = bb.acquire_slot().expect("Slot table should not be full");
    let probe = bb.lookup(hash);
    bb.insert(hash, slot, probe.cursor)?;
    Ok(slot)
}

#[test]
fn test_insert_600_remove_590() -> Result<()> {
    let mut bb = BlackboardIndex::init(IndexConfig::with_capacity(1000))?;
    let mut slots = Vec::new();

    for hash in 1..=600u64 {
        slots.push(insert(&mut bb, hash)?);
        let stats = bb.stats();
        assert!(
            stats.max_block_len <= 512,
            "Block grew to {} entries",
            stats.max_block_len
        );
    }
    assert!(bb.stats().blocks >= 2, "600 entries must force a split");
    bb.check_invariants()?;

    for (hash, slot) in (1..=600u64).zip(&slots) {
        assert_eq!(bb.lookup(hash).slot, Some(*slot), "hash {}", hash);
    }

    for hash in 1..=590u64 {
        let probe = bb.lookup(hash);
        let slot = probe.slot.expect("Hash should still be present");
        bb.remove(probe.cursor)?;
        bb.release_slot(slot)?;
    }
    bb.check_invariants()?;

    for (hash, slot) in (591..=600u64).zip(&slots[590..]) {
        assert_eq!(bb.lookup(hash).slot, Some(*slot));
    }
    for hash in 1..=590u64 {
        assert!(!bb.lookup(hash).is_found(), "hash {} should be gone", hash);
    }

    let stats = bb.stats();
    assert_eq!(stats.entries, 10);
    assert_eq!(stats.used_slots, 10);
    assert_eq!(stats.free_slots, 990);
    Ok(())
}

#[test]
fn test_split_happens_on_513th_insert() -> Result<()> {
    let mut bb = BlackboardIndex::init(IndexConfig::with_capacity(1000))?;
    for hash in 0..512u64 {
        insert(&mut bb, hash * 2)?;
    }
    assert_eq!(bb.stats().blocks, 1);
    assert_eq!(bb.stats().max_block_len, 512);

    insert(&mut bb, 1)?;
    let stats = bb.stats();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.entries, 513);
    assert!(stats.max_block_len <= 257);
    bb.check_invariants()
}

#[test]
fn test_slot_exhaustion() -> Result<()> {
    let n = 5;
    let mut bb = BlackboardIndex::init(IndexConfig::with_capacity(n))?;

    let acquired: Vec<_> = (0..n).map(|_| bb.acquire_slot()).collect();
    assert!(acquired.iter().all(Option::is_some));
    assert_eq!(bb.acquire_slot(), None);

    bb.release_slot(acquired[2].unwrap())?;
    assert_eq!(bb.acquire_slot(), acquired[2]);
    assert_eq!(bb.acquire_slot(), None);
    Ok(())
}

#[test]
fn test_duplicate_hash_traversal() -> Result<()> {
    let mut bb = BlackboardIndex::init(IndexConfig::with_capacity(10))?;
    insert(&mut bb, 3)?;
    let first = insert(&mut bb, 7)?;
    let second = insert(&mut bb, 7)?;
    insert(&mut bb, 11)?;

    // From the second entry backward
    let mut cursor = bb.lookup(7).cursor;
    assert_eq!(bb.lookup(7).slot, Some(second));
    assert_eq!(
        bb.next_with_same_hash(Direction::Backward, 7, &mut cursor),
        Some(first)
    );
    assert_eq!(
        bb.next_with_same_hash(Direction::Backward, 7, &mut cursor),
        None
    );

    // From the first entry forward
    let mut cursor = bb.find_by(7, |slot| slot == first).cursor;
    assert_eq!(
        bb.next_with_same_hash(Direction::Forward, 7, &mut cursor),
        Some(second)
    );
    assert_eq!(
        bb.next_with_same_hash(Direction::Forward, 7, &mut cursor),
        None
    );
    Ok(())
}

#[test]
fn test_remove_one_of_duplicates() -> Result<()> {
    let mut bb = BlackboardIndex::init(IndexConfig::with_capacity(10))?;
    let first = insert(&mut bb, 42)?;
    let second = insert(&mut bb, 42)?;

    let probe = bb.find_by(42, |slot| slot == first);
    assert_eq!(probe.slot, Some(first));
    bb.remove(probe.cursor)?;
    bb.release_slot(first)?;

    assert!(!bb.find_by(42, |slot| slot == first).is_found());
    assert_eq!(bb.lookup(42).slot, Some(second));
    bb.check_invariants()
}

#[test]
fn test_close_then_init_is_fresh() -> Result<()> {
    let config = IndexConfig::with_capacity(100);
    let mut bb = BlackboardIndex::init(config.clone())?;
    for hash in 0..50u64 {
        insert(&mut bb, hash)?;
    }
    bb.close();

    let fresh = BlackboardIndex::init(config.clone())?;
    let reopened = BlackboardIndex::init(config)?;
    assert_eq!(fresh.stats(), reopened.stats());
    assert_eq!(reopened.stats().entries, 0);
    assert_eq!(reopened.stats().free_slots, 100);
    Ok(())
}

/// xorshift64, enough to scatter hashes in a reproducible way
struct Scatter(u64);

impl Scatter {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

#[test]
fn test_churn_keeps_invariants() -> Result<()> {
    let config = IndexConfig {
        capacity: 2000,
        block_capacity: 16,
        master_capacity: 1024,
        merge_threshold: 4,
        merge_partner_limit: 8,
    };
    let mut bb = BlackboardIndex::init(config)?;
    let mut rng = Scatter(0x9e37_79b9_7f4a_7c15);
    let mut live: Vec<(u64, SlotId)> = Vec::new();

    for round in 0..4000 {
        let grow = live.len() < 50 || (rng.next() % 100) < 55;
        if grow && live.len() < 2000 {
            // Narrow key space so duplicates are common
            let hash = rng.next() % 700;
            let slot = insert(&mut bb, hash)?;
            live.push((hash, slot));
        } else {
            let victim = (rng.next() as usize) % live.len();
            let (hash, slot) = live.swap_remove(victim);
            let probe = bb.find_by(hash, |s| s == slot);
            assert_eq!(probe.slot, Some(slot), "round {}", round);
            bb.remove(probe.cursor)?;
            bb.release_slot(slot)?;
        }

        if round % 97 == 0 {
            bb.check_invariants()?;
        }
    }

    bb.check_invariants()?;
    assert_eq!(bb.stats().entries, live.len());
    for &(hash, slot) in &live {
        assert!(bb.find_by(hash, |s| s == slot).is_found());
    }
    Ok(())
}
