/*!
 * Page References
 * Hit/fault handling, victim selection and payload access
 */

use super::MemoryManager;
use crate::core::types::{OwnerId, PageKey, PageNumber};
use crate::memory::types::{AccessOutcome, MemoryError, MemoryResult, Page, PageAccess, ReplacementAlgorithm};
use crate::monitoring::Event;
use bytes::Bytes;
use tracing::{debug, info};

impl MemoryManager {
    /// Reference a page, loading it on a fault
    pub fn reference(&self, owner: OwnerId, page: PageNumber) -> PageAccess {
        self.access(PageKey::new(owner, page), None)
    }

    /// Reference a page and store `payload` in it (on fault or hit)
    pub fn reference_with(
        &self,
        owner: OwnerId,
        page: PageNumber,
        payload: impl Into<Bytes>,
    ) -> PageAccess {
        self.access(PageKey::new(owner, page), Some(payload.into()))
    }

    fn access(&self, key: PageKey, payload: Option<Bytes>) -> PageAccess {
        let mut events = Vec::with_capacity(3);

        let access = {
            let mut state = self.shared.state.lock();
            let seq = state.next_seq();
            let now = self.shared.clock.now();

            if let Some(&frame) = state.page_table.get(&key) {
                let page = state.resident_mut(frame);
                page.touch(now, seq);
                if payload.is_some() {
                    page.payload = payload;
                }
                if state.config.algorithm == ReplacementAlgorithm::Lru {
                    state.order.move_to_back(frame);
                }
                state.stats.record_hit();
                events.push(Event::PageHit { key, frame });

                PageAccess {
                    key,
                    frame,
                    outcome: AccessOutcome::Hit,
                }
            } else {
                state.stats.record_fault(key.owner);
                events.push(Event::PageFault { key });

                let (frame, evicted) = match state.free.pop_first() {
                    Some(frame) => (frame, None),
                    None => {
                        let frame = state
                            .order
                            .front()
                            .unwrap_or_else(|| panic!("no free frame and no victim"));
                        let victim = state.unload(frame).key;
                        state.stats.replacements += 1;
                        events.push(Event::PageReplaced { victim, frame });
                        (frame, Some(victim))
                    }
                };

                state.install(frame, Page::load(key, now, seq, payload));
                events.push(Event::PageLoaded { key, frame });

                PageAccess {
                    key,
                    frame,
                    outcome: AccessOutcome::Fault { evicted },
                }
            }
        };

        #[cfg(debug_assertions)]
        self.assert_consistent();

        debug!(page = %key, frame = access.frame, hit = access.is_hit(), "Page referenced");
        self.shared.events.emit_all(events);
        access
    }

    /// Payload of a resident page (not counted as a reference)
    pub fn read_page(&self, owner: OwnerId, page: PageNumber) -> MemoryResult<Option<Bytes>> {
        let key = PageKey::new(owner, page);
        let state = self.shared.state.lock();
        let frame = state
            .page_table
            .get(&key)
            .copied()
            .ok_or_else(|| MemoryError::not_resident(key))?;
        Ok(state.resident(frame).payload.clone())
    }

    /// Replace the payload of a resident page (not counted as a reference)
    pub fn write_page(
        &self,
        owner: OwnerId,
        page: PageNumber,
        payload: impl Into<Bytes>,
    ) -> MemoryResult<()> {
        let key = PageKey::new(owner, page);
        let mut state = self.shared.state.lock();
        let frame = state
            .page_table
            .get(&key)
            .copied()
            .ok_or_else(|| MemoryError::not_resident(key))?;
        state.resident_mut(frame).payload = Some(payload.into());
        Ok(())
    }

    /// Switch replacement algorithm on a live engine
    ///
    /// The replacement order is rebuilt from page metadata, so the next victim
    /// is correct for the new algorithm immediately.
    pub fn set_algorithm(&self, algorithm: ReplacementAlgorithm) {
        {
            let mut state = self.shared.state.lock();
            state.config.algorithm = algorithm;
            state.rebuild_order();
        }

        #[cfg(debug_assertions)]
        self.assert_consistent();

        info!("Page replacement algorithm changed to {}", algorithm);
        self.shared.events.emit(Event::AlgorithmChanged {
            algorithm: algorithm.to_string(),
        });
    }
}
