/*!
 * Page Replacement Tests
 * FIFO and LRU victim selection on known reference strings
 */

use pretty_assertions::assert_eq;
use resource_sim::monitoring::Event;
use resource_sim::{
    silent_observer, MemoryConfig, MemoryManager, PageKey, ReplacementAlgorithm, VirtualClock,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn manager(frames: usize, algorithm: ReplacementAlgorithm) -> MemoryManager {
    MemoryManager::with_clock(
        MemoryConfig::new(frames, algorithm),
        Arc::new(VirtualClock::new()),
    )
    .unwrap()
    .with_observer(silent_observer())
}

fn owner_one(pages: &[u32]) -> Vec<PageKey> {
    pages.iter().map(|&p| PageKey::new(1, p)).collect()
}

fn page_set(keys: &[PageKey]) -> BTreeSet<u32> {
    keys.iter().map(|k| k.page).collect()
}

#[test]
fn test_fifo_and_lru_on_mixed_string() {
    let refs = owner_one(&[0, 1, 2, 3, 0, 1, 4, 0, 1, 2]);

    let fifo = manager(3, ReplacementAlgorithm::Fifo).replay(refs.iter().copied());
    let lru = manager(3, ReplacementAlgorithm::Lru).replay(refs.iter().copied());

    // Same counts, different final victim
    for report in [&fifo, &lru] {
        assert_eq!(report.faults, 8);
        assert_eq!(report.hits, 2);
        assert_eq!(report.replacements, 5);
    }

    assert_eq!(fifo.steps[9].evicted, Some(PageKey::new(1, 0)));
    assert_eq!(lru.steps[9].evicted, Some(PageKey::new(1, 4)));
    assert_eq!(page_set(&fifo.final_resident()), BTreeSet::from([1, 2, 4]));
    assert_eq!(page_set(&lru.final_resident()), BTreeSet::from([0, 1, 2]));
}

#[test]
fn test_beladys_anomaly() {
    let refs = owner_one(&[1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5]);

    let three = MemoryManager::compare_algorithms(3, &refs).unwrap();
    let four = MemoryManager::compare_algorithms(4, &refs).unwrap();

    // FIFO gets worse with more frames; LRU never does
    assert_eq!(three.fifo.faults, 9);
    assert_eq!(four.fifo.faults, 10);
    assert_eq!(three.lru.faults, 10);
    assert_eq!(four.lru.faults, 8);
    assert_eq!(four.fewer_faults(), Some(ReplacementAlgorithm::Lru));
}

#[test]
fn test_hit_does_not_consume_frame() {
    let mm = manager(2, ReplacementAlgorithm::Lru);
    for _ in 0..5 {
        mm.reference(7, 1);
    }
    assert_eq!(mm.usage().used, 1);
    assert_eq!(mm.stats().page_hits, 4);
    assert!(!mm.is_full());
}

#[test]
fn test_fault_events() {
    let mm = manager(1, ReplacementAlgorithm::Fifo);
    mm.reference(1, 0);
    mm.reference(1, 0);
    mm.reference(2, 5);

    let lines: Vec<String> = mm.events().iter().map(|r| r.event.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "Page Fault: Page 0 of Process 1 not in memory",
            "Allocated: Page 0 of Process 1 to Frame 0",
            "Page Hit: Page 0 of Process 1 in Frame 0",
            "Page Fault: Page 5 of Process 2 not in memory",
            "Memory Full: Replacing Page 0 of Process 1 in Frame 0",
            "Allocated: Page 5 of Process 2 to Frame 0",
        ]
    );
    assert!(mm
        .events()
        .iter()
        .all(|r| r.event.category() == resource_sim::monitoring::Category::Memory));
}

#[test]
fn test_owner_fault_accounting() {
    let mm = manager(2, ReplacementAlgorithm::Lru);
    mm.reference(1, 0);
    mm.reference(2, 0);
    mm.reference(1, 1);
    mm.reference(2, 0);

    let stats = mm.stats();
    assert_eq!(stats.owner_faults.get(&1), Some(&2));
    assert_eq!(stats.owner_faults.get(&2), Some(&1));
    assert_eq!(stats.replacements, 1);
    assert_eq!(stats.owner_pages.get(&1), Some(&1));
    assert!(matches!(
        mm.events().last().map(|r| r.event.clone()),
        Some(Event::PageHit { .. })
    ));
}

#[test]
fn test_memory_map_display() {
    let mm = manager(3, ReplacementAlgorithm::Lru);
    mm.reference(1, 0);
    mm.reference(2, 3);

    let text = mm.frames().to_string();
    assert!(text.contains("Frame 0: [P1:Pg0]"));
    assert!(text.contains("Frame 1: [P2:Pg3]"));
    assert!(text.contains("Frame 2: [ Empty ]"));
    assert!(text.contains("Algorithm: LRU"));
}
