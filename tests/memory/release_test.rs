/*!
 * Release and Reset Tests
 */

use pretty_assertions::assert_eq;
use resource_sim::{
    silent_observer, MemoryConfig, MemoryError, MemoryManager, PageKey, ReplacementAlgorithm,
    VirtualClock,
};
use std::sync::Arc;
use std::thread;

fn manager(frames: usize, algorithm: ReplacementAlgorithm) -> MemoryManager {
    MemoryManager::with_clock(
        MemoryConfig::new(frames, algorithm),
        Arc::new(VirtualClock::new()),
    )
    .unwrap()
    .with_observer(silent_observer())
}

#[test]
fn test_release_owner_removes_from_order() {
    let mm = manager(3, ReplacementAlgorithm::Fifo);
    mm.reference(1, 0);
    mm.reference(2, 0);
    mm.reference(1, 1);

    assert_eq!(mm.release_owner(1), Ok(2));
    assert_eq!(mm.replacement_order(), vec![PageKey::new(2, 0)]);

    // Two free frames again, so no eviction for the next two faults
    assert_eq!(mm.reference(3, 0).evicted(), None);
    assert_eq!(mm.reference(3, 1).evicted(), None);
    assert_eq!(mm.reference(3, 2).evicted(), Some(PageKey::new(2, 0)));
    mm.audit().unwrap();
}

#[test]
fn test_unknown_owner() {
    let mm = manager(2, ReplacementAlgorithm::Lru);
    assert_eq!(mm.release_owner(42), Err(MemoryError::UnknownOwner(42)));
}

#[test]
fn test_evicted_owner_becomes_unknown() {
    let mm = manager(1, ReplacementAlgorithm::Lru);
    mm.reference(1, 0);
    mm.reference(2, 0);
    assert_eq!(mm.release_owner(1), Err(MemoryError::UnknownOwner(1)));
    assert_eq!(mm.resident_pages(2), vec![0]);
}

#[test]
fn test_reset_keeps_configuration() {
    let mm = manager(2, ReplacementAlgorithm::Fifo);
    mm.set_algorithm(ReplacementAlgorithm::Lru);
    mm.reference(1, 0);
    mm.reset();

    assert_eq!(mm.algorithm(), ReplacementAlgorithm::Lru);
    assert_eq!(mm.stats().references(), 0);
    assert!(mm.reference(1, 0).is_fault());
}

#[test]
fn test_concurrent_references() {
    let mm = manager(8, ReplacementAlgorithm::Lru);
    let workers: Vec<_> = (0..4u32)
        .map(|owner| {
            let mm = mm.clone();
            thread::spawn(move || {
                for i in 0..250u32 {
                    mm.reference(owner, i % 5);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = mm.stats();
    assert_eq!(stats.references(), 1000);
    assert!(mm.is_full());
    mm.audit().unwrap();
}
