/*!
 * Paging Engine
 *
 * Fixed frame pool with FIFO or LRU page replacement.
 *
 * ## Structure
 *
 * - **Frames**: flat vector of slots, each empty or holding one page
 * - **Page table**: `(owner, page) → frame`, `ahash` keyed
 * - **Owner index**: owner → resident page numbers, for bulk release
 * - **Replacement order**: intrusive list over frame indices; the head is the
 *   next victim for either algorithm
 *
 * Every mutation happens under one lock acquisition and leaves all four
 * structures in agreement (checked by `audit`, asserted in debug builds).
 */

mod audit;
mod frame_list;
mod reference;
mod release;
mod replay;

pub use replay::{AlgorithmComparison, ReplayReport, ReplayStep};

use super::metrics::MemoryStats;
use super::types::{
    FrameSnapshot, MemoryConfig, MemoryMap, MemoryResult, MemoryUsage, Page, ReplacementAlgorithm,
};
use crate::core::clock::{Clock, WallClock};
use crate::core::types::{EngineId, FrameId, OwnerId, PageKey, PageNumber};
use crate::monitoring::{tracing_observer, EventRecord, EventSink, Observer};
use ahash::RandomState;
use frame_list::FrameList;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;

/// Mutable paging state, guarded by the engine lock
#[derive(Debug)]
pub(crate) struct State {
    config: MemoryConfig,
    frames: Vec<Option<Page>>,
    /// Empty frames; the lowest index is filled first
    free: BTreeSet<FrameId>,
    page_table: HashMap<PageKey, FrameId, RandomState>,
    owners: BTreeMap<OwnerId, BTreeSet<PageNumber>>,
    order: FrameList,
    /// Reference counter; orders loads and accesses without relying on the clock
    seq: u64,
    stats: MemoryStats,
}

impl State {
    fn new(config: MemoryConfig) -> Self {
        let frame_count = config.frame_count;
        Self {
            config,
            frames: vec![None; frame_count],
            free: (0..frame_count).collect(),
            page_table: HashMap::with_capacity_and_hasher(frame_count, RandomState::new()),
            owners: BTreeMap::new(),
            order: FrameList::new(frame_count),
            seq: 0,
            stats: MemoryStats::default(),
        }
    }

    /// Page in an occupied frame; an empty frame here is a broken invariant
    fn resident(&self, frame: FrameId) -> &Page {
        self.frames[frame]
            .as_ref()
            .unwrap_or_else(|| panic!("page table points at empty frame {}", frame))
    }

    fn resident_mut(&mut self, frame: FrameId) -> &mut Page {
        self.frames[frame]
            .as_mut()
            .unwrap_or_else(|| panic!("page table points at empty frame {}", frame))
    }

    /// Remove the page in `frame` from every structure and free the frame
    fn unload(&mut self, frame: FrameId) -> Page {
        let page = self.frames[frame]
            .take()
            .unwrap_or_else(|| panic!("unloading empty frame {}", frame));
        let key = page.key;

        self.page_table.remove(&key);
        self.order.remove(frame);
        self.free.insert(frame);

        let remaining = match self.owners.get_mut(&key.owner) {
            Some(pages) => {
                pages.remove(&key.page);
                pages.len()
            }
            None => 0,
        };
        if remaining == 0 {
            self.owners.remove(&key.owner);
        }
        self.stats.set_owner_pages(key.owner, remaining);
        page
    }

    /// Place a new page into an empty frame and link it as most recent
    fn install(&mut self, frame: FrameId, page: Page) {
        let key = page.key;
        debug_assert!(self.frames[frame].is_none());

        self.free.remove(&frame);
        self.frames[frame] = Some(page);
        self.page_table.insert(key, frame);
        self.order.push_back(frame);

        let pages = self.owners.entry(key.owner).or_default();
        pages.insert(key.page);
        let count = pages.len();
        self.stats.set_owner_pages(key.owner, count);
        self.stats.allocations += 1;
    }

    /// Relink the replacement order from page metadata
    fn rebuild_order(&mut self) {
        let algorithm = self.config.algorithm;
        let mut resident: Vec<(u64, FrameId)> = self
            .frames
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref().map(|page| match algorithm {
                    ReplacementAlgorithm::Fifo => (page.load_seq, id),
                    ReplacementAlgorithm::Lru => (page.access_seq, id),
                })
            })
            .collect();
        resident.sort_unstable();

        self.order.clear();
        for (_, frame) in resident {
            self.order.push_back(frame);
        }
    }

    fn map(&self) -> MemoryMap {
        MemoryMap {
            algorithm: self.config.algorithm,
            frames: self
                .frames
                .iter()
                .enumerate()
                .map(|(id, slot)| FrameSnapshot {
                    id,
                    page: slot.as_ref().map(|p| p.key),
                })
                .collect(),
        }
    }

    #[inline]
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

pub(crate) struct Shared {
    engine_id: EngineId,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
    events: EventSink,
}

/// Paging engine
///
/// Cloning yields another handle to the same frame pool.
pub struct MemoryManager {
    shared: Arc<Shared>,
}

impl MemoryManager {
    /// Create an engine on the wall clock with the tracing observer
    pub fn new(config: MemoryConfig) -> MemoryResult<Self> {
        Self::with_clock(config, Arc::new(WallClock::new()))
    }

    pub fn with_clock(config: MemoryConfig, clock: Arc<dyn Clock>) -> MemoryResult<Self> {
        config.validate()?;

        let engine_id = EngineId::generate();
        info!(
            engine = %engine_id,
            "Memory manager initialized: {} frames x {} bytes, {} replacement",
            config.frame_count,
            config.page_size,
            config.algorithm
        );

        Ok(Self {
            shared: Arc::new(Shared {
                engine_id,
                events: EventSink::new(Arc::clone(&clock), tracing_observer()),
                clock,
                state: Mutex::new(State::new(config)),
            }),
        })
    }

    /// Replace the observer (builder form)
    #[must_use]
    pub fn with_observer(self, observer: Observer) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer(&self, observer: Observer) {
        self.shared.events.set_observer(observer);
    }

    pub fn engine_id(&self) -> EngineId {
        self.shared.engine_id
    }

    pub fn config(&self) -> MemoryConfig {
        self.shared.state.lock().config
    }

    pub fn algorithm(&self) -> ReplacementAlgorithm {
        self.shared.state.lock().config.algorithm
    }

    /// Frame-by-frame snapshot; `Display` renders the memory map
    pub fn frames(&self) -> MemoryMap {
        self.shared.state.lock().map()
    }

    pub fn usage(&self) -> MemoryUsage {
        let state = self.shared.state.lock();
        MemoryUsage {
            used: state.page_table.len(),
            total: state.frames.len(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.shared.state.lock().free.is_empty()
    }

    pub fn stats(&self) -> MemoryStats {
        self.shared.state.lock().stats.clone()
    }

    /// Whether a page is resident (does not count as a reference)
    pub fn contains(&self, key: impl Into<PageKey>) -> bool {
        self.shared.state.lock().page_table.contains_key(&key.into())
    }

    /// Frame holding a page, if resident (does not count as a reference)
    pub fn frame_of(&self, key: impl Into<PageKey>) -> Option<FrameId> {
        self.shared.state.lock().page_table.get(&key.into()).copied()
    }

    /// Resident page numbers of one owner, ascending
    pub fn resident_pages(&self, owner: OwnerId) -> Vec<PageNumber> {
        self.shared
            .state
            .lock()
            .owners
            .get(&owner)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Resident pages from next victim to most recently used/loaded
    pub fn replacement_order(&self) -> Vec<PageKey> {
        let state = self.shared.state.lock();
        state
            .order
            .iter()
            .map(|frame| state.resident(frame).key)
            .collect()
    }

    /// Recent events, oldest first
    pub fn events(&self) -> Vec<EventRecord> {
        self.shared.events.history()
    }
}

impl Clone for MemoryManager {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("engine", &self.shared.engine_id)
            .field("state", &*self.shared.state.lock())
            .finish()
    }
}
