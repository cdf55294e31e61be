/*!
 * Consistency Audit
 * Cross-checks page table, frames, owner index and replacement order
 */

use super::{MemoryManager, State};
use crate::memory::types::{MemoryError, MemoryResult, ReplacementAlgorithm};
use std::collections::BTreeSet;

impl MemoryManager {
    /// Verify that every structure agrees with every other
    pub fn audit(&self) -> MemoryResult<()> {
        self.shared.state.lock().check()
    }

    #[cfg(debug_assertions)]
    pub(super) fn assert_consistent(&self) {
        if let Err(e) = self.audit() {
            panic!("{}", e);
        }
    }
}

fn broken(msg: String) -> MemoryResult<()> {
    Err(MemoryError::Inconsistent(msg))
}

impl State {
    pub(super) fn check(&self) -> MemoryResult<()> {
        let occupied = self.frames.iter().filter(|f| f.is_some()).count();

        if occupied + self.free.len() != self.frames.len() {
            return broken(format!(
                "{} occupied + {} free != {} frames",
                occupied,
                self.free.len(),
                self.frames.len()
            ));
        }
        if self.page_table.len() != occupied || self.order.len() != occupied {
            return broken(format!(
                "page table has {} entries, order has {}, {} frames occupied",
                self.page_table.len(),
                self.order.len(),
                occupied
            ));
        }

        for (key, &frame) in &self.page_table {
            match self.frames.get(frame).and_then(Option::as_ref) {
                Some(page) if page.key == *key => {}
                Some(page) => {
                    return broken(format!("{} maps to frame {} holding {}", key, frame, page.key))
                }
                None => return broken(format!("{} maps to empty frame {}", key, frame)),
            }
            if self.free.contains(&frame) {
                return broken(format!("frame {} is both free and mapped", frame));
            }
            if !self.order.contains(frame) {
                return broken(format!("frame {} missing from replacement order", frame));
            }
            let indexed = self
                .owners
                .get(&key.owner)
                .map_or(false, |pages| pages.contains(&key.page));
            if !indexed {
                return broken(format!("{} missing from owner index", key));
            }
        }

        let indexed: usize = self.owners.values().map(BTreeSet::len).sum();
        if indexed != self.page_table.len() || self.owners.values().any(BTreeSet::is_empty) {
            return broken(format!(
                "owner index holds {} pages, page table {}",
                indexed,
                self.page_table.len()
            ));
        }

        // The list must be ordered by the active algorithm's sequence
        let mut last = 0;
        let mut walked = 0;
        for frame in self.order.iter() {
            let Some(page) = self.frames[frame].as_ref() else {
                return broken(format!("replacement order links empty frame {}", frame));
            };
            let seq = match self.config.algorithm {
                ReplacementAlgorithm::Fifo => page.load_seq,
                ReplacementAlgorithm::Lru => page.access_seq,
            };
            if seq <= last && walked > 0 {
                return broken(format!(
                    "{} order out of sequence at frame {}",
                    self.config.algorithm, frame
                ));
            }
            last = seq;
            walked += 1;
        }
        if walked != self.order.len() {
            return broken(format!(
                "replacement order walks {} of {} frames",
                walked,
                self.order.len()
            ));
        }

        Ok(())
    }
}
