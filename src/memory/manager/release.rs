/*!
 * Page Release
 * Explicit single-page and per-owner release, and full reset
 */

use super::{MemoryManager, State};
use crate::core::types::{FrameId, OwnerId, PageKey, PageNumber};
use crate::memory::types::{MemoryError, MemoryResult};
use crate::monitoring::Event;
use tracing::info;

impl MemoryManager {
    /// Free every frame held by `owner`; returns the number freed
    pub fn release_owner(&self, owner: OwnerId) -> MemoryResult<usize> {
        let mut events = Vec::new();

        let freed = {
            let mut state = self.shared.state.lock();
            let pages: Vec<PageNumber> = state
                .owners
                .get(&owner)
                .ok_or(MemoryError::UnknownOwner(owner))?
                .iter()
                .copied()
                .collect();

            for page in &pages {
                let key = PageKey::new(owner, *page);
                let frame = release_locked(&mut state, key)?;
                events.push(Event::PageReleased { key, frame });
            }
            pages.len()
        };

        #[cfg(debug_assertions)]
        self.assert_consistent();

        info!("Deallocated all pages for Process {} ({} frames)", owner, freed);
        events.push(Event::OwnerReleased {
            owner,
            frames: freed,
        });
        self.shared.events.emit_all(events);
        Ok(freed)
    }

    /// Free one resident page; returns the frame it occupied
    pub fn release_page(&self, owner: OwnerId, page: PageNumber) -> MemoryResult<FrameId> {
        let key = PageKey::new(owner, page);
        let frame = {
            let mut state = self.shared.state.lock();
            release_locked(&mut state, key)?
        };

        #[cfg(debug_assertions)]
        self.assert_consistent();

        self.shared.events.emit(Event::PageReleased { key, frame });
        Ok(frame)
    }

    /// Free every frame and zero the statistics
    pub fn reset(&self) {
        {
            let mut state = self.shared.state.lock();
            let config = state.config;
            *state = State::new(config);
        }
        info!("Memory manager reset");
        self.shared.events.emit(Event::MemoryReset);
    }
}

fn release_locked(state: &mut State, key: PageKey) -> MemoryResult<FrameId> {
    let frame = state
        .page_table
        .get(&key)
        .copied()
        .ok_or_else(|| MemoryError::not_resident(key))?;
    state.unload(frame);
    state.stats.deallocations += 1;
    Ok(frame)
}
