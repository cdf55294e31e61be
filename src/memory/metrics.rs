/*!
 * Memory Metrics
 * Fault/hit accounting, updated under the engine lock
 */

use crate::core::types::OwnerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Paging statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub page_faults: u64,
    pub page_hits: u64,
    /// Faults that had to evict a resident page
    pub replacements: u64,
    /// Pages loaded into a frame
    pub allocations: u64,
    /// Pages freed by explicit release
    pub deallocations: u64,
    pub owner_faults: BTreeMap<OwnerId, u64>,
    /// Resident page count per owner
    pub owner_pages: BTreeMap<OwnerId, usize>,
}

impl MemoryStats {
    /// Fraction of references that hit, in `[0, 1]`
    pub fn hit_ratio(&self) -> f64 {
        let total = self.page_faults + self.page_hits;
        if total == 0 {
            return 0.0;
        }
        self.page_hits as f64 / total as f64
    }

    #[inline]
    pub fn references(&self) -> u64 {
        self.page_faults + self.page_hits
    }

    #[inline]
    pub(crate) fn record_hit(&mut self) {
        self.page_hits += 1;
    }

    #[inline]
    pub(crate) fn record_fault(&mut self, owner: OwnerId) {
        self.page_faults += 1;
        *self.owner_faults.entry(owner).or_insert(0) += 1;
    }

    pub(crate) fn set_owner_pages(&mut self, owner: OwnerId, pages: usize) {
        if pages == 0 {
            self.owner_pages.remove(&owner);
        } else {
            self.owner_pages.insert(owner, pages);
        }
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(55);
        let thin = "-".repeat(55);

        writeln!(f, "{}", rule)?;
        writeln!(f, "Memory Management Metrics Summary")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Page Faults:    {}", self.page_faults)?;
        writeln!(f, "Total Page Hits:      {}", self.page_hits)?;
        writeln!(f, "Page Hit Ratio:       {:.2}%", self.hit_ratio() * 100.0)?;
        writeln!(f, "Page Replacements:    {}", self.replacements)?;
        writeln!(f, "Total Allocations:    {}", self.allocations)?;
        writeln!(f, "Total Deallocations:  {}", self.deallocations)?;
        writeln!(f, "{}", thin)?;
        writeln!(f, "Per-Process Page Faults:")?;
        for (owner, faults) in &self.owner_faults {
            writeln!(f, "  Process {}: {} faults", owner, faults)?;
        }
        writeln!(f, "{}", thin)?;
        writeln!(f, "Per-Process Memory Usage (pages):")?;
        for (owner, pages) in &self.owner_pages {
            writeln!(f, "  Process {}: {} pages", owner, pages)?;
        }
        write!(f, "{}", rule)
    }
}
