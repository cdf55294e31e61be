/*!
 * Reference String Replay
 * Run a reference string and report per-step outcomes, or compare FIFO and
 * LRU side by side on fresh engines
 */

use super::MemoryManager;
use crate::core::clock::VirtualClock;
use crate::core::types::{FrameId, PageKey};
use crate::memory::types::{MemoryConfig, MemoryResult, ReplacementAlgorithm};
use crate::monitoring::silent_observer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One reference of a replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    pub key: PageKey,
    pub hit: bool,
    pub frame: FrameId,
    pub evicted: Option<PageKey>,
    /// Frame contents after the reference
    pub resident: Vec<Option<PageKey>>,
}

/// Outcome of a replayed reference string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub algorithm: ReplacementAlgorithm,
    pub frame_count: usize,
    pub faults: u64,
    pub hits: u64,
    pub replacements: u64,
    pub steps: Vec<ReplayStep>,
}

impl ReplayReport {
    /// Resident pages after the last step, in frame order
    pub fn final_resident(&self) -> Vec<PageKey> {
        self.steps
            .last()
            .map(|s| s.resident.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} with {} frames: {} faults, {} hits, {} replacements",
            self.algorithm, self.frame_count, self.faults, self.hits, self.replacements
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            let frames: Vec<String> = step
                .resident
                .iter()
                .map(|slot| slot.map_or_else(|| "-".to_string(), |k| k.to_string()))
                .collect();
            write!(
                f,
                "{:>3}. {:<10} {:<5} [{}]",
                i + 1,
                step.key.to_string(),
                if step.hit { "hit" } else { "FAULT" },
                frames.join(" ")
            )?;
            if let Some(victim) = step.evicted {
                write!(f, " evicted {}", victim)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// FIFO and LRU on the same reference string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmComparison {
    pub fifo: ReplayReport,
    pub lru: ReplayReport,
}

impl AlgorithmComparison {
    /// The algorithm with strictly fewer faults, if either
    pub fn fewer_faults(&self) -> Option<ReplacementAlgorithm> {
        match self.fifo.faults.cmp(&self.lru.faults) {
            std::cmp::Ordering::Less => Some(ReplacementAlgorithm::Fifo),
            std::cmp::Ordering::Greater => Some(ReplacementAlgorithm::Lru),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for AlgorithmComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10}{:>8}{:>8}{:>10}", "Algorithm", "Faults", "Hits", "Hit %")?;
        for report in [&self.fifo, &self.lru] {
            let total = report.faults + report.hits;
            let ratio = if total == 0 {
                0.0
            } else {
                report.hits as f64 / total as f64 * 100.0
            };
            writeln!(
                f,
                "{:<10}{:>8}{:>8}{:>9.1}%",
                report.algorithm.as_str(),
                report.faults,
                report.hits,
                ratio
            )?;
        }
        Ok(())
    }
}

impl MemoryManager {
    /// Reference every page in order on this engine
    ///
    /// Counts in the report cover the replay only; the engine's own stats
    /// accumulate as usual.
    pub fn replay<I, K>(&self, refs: I) -> ReplayReport
    where
        I: IntoIterator<Item = K>,
        K: Into<PageKey>,
    {
        let config = self.config();
        let mut report = ReplayReport {
            algorithm: config.algorithm,
            frame_count: config.frame_count,
            faults: 0,
            hits: 0,
            replacements: 0,
            steps: Vec::new(),
        };

        for key in refs {
            let key = key.into();
            let access = self.reference(key.owner, key.page);
            if access.is_hit() {
                report.hits += 1;
            } else {
                report.faults += 1;
            }
            if access.evicted().is_some() {
                report.replacements += 1;
            }
            report.steps.push(ReplayStep {
                key,
                hit: access.is_hit(),
                frame: access.frame,
                evicted: access.evicted(),
                resident: self.frames().frames.iter().map(|f| f.page).collect(),
            });
        }
        report
    }

    /// Replay the same string under FIFO and LRU on fresh, silent engines
    pub fn compare_algorithms(frame_count: usize, refs: &[PageKey]) -> MemoryResult<AlgorithmComparison> {
        let run = |algorithm| -> MemoryResult<ReplayReport> {
            let engine = MemoryManager::with_clock(
                MemoryConfig::new(frame_count, algorithm),
                Arc::new(VirtualClock::new()),
            )?
            .with_observer(silent_observer());
            Ok(engine.replay(refs.iter().copied()))
        };

        Ok(AlgorithmComparison {
            fifo: run(ReplacementAlgorithm::Fifo)?,
            lru: run(ReplacementAlgorithm::Lru)?,
        })
    }
}
