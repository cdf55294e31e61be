/*!
 * Memory Types
 * Configuration, errors and snapshots for the paging engine
 */

use crate::core::limits::{DEFAULT_FRAME_COUNT, DEFAULT_PAGE_SIZE};
use crate::core::types::{FrameId, OwnerId, PageKey, PageNumber};
use bytes::Bytes;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MemoryError {
    #[error("Invalid memory configuration: {0}")]
    #[diagnostic(
        code(memory::invalid_config),
        help("Frame count and page size must be greater than zero.")
    )]
    InvalidConfig(String),

    #[error("Process {0} has no resident pages")]
    #[diagnostic(
        code(memory::unknown_owner),
        help("The owner may never have referenced a page, or was already released.")
    )]
    UnknownOwner(OwnerId),

    #[error("Page {page} of process {owner} is not resident")]
    #[diagnostic(
        code(memory::page_not_resident),
        help("Reference the page first; it may have been evicted.")
    )]
    PageNotResident { owner: OwnerId, page: PageNumber },

    #[error("Memory state inconsistent: {0}")]
    #[diagnostic(
        code(memory::inconsistent),
        help("Page table, frames and replacement order disagree. This is a bug.")
    )]
    Inconsistent(String),
}

impl MemoryError {
    pub(crate) fn not_resident(key: PageKey) -> Self {
        Self::PageNotResident {
            owner: key.owner,
            page: key.page,
        }
    }
}

/// Page replacement algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementAlgorithm {
    /// Evict the page loaded longest ago
    Fifo,
    /// Evict the page referenced longest ago
    Lru,
}

impl ReplacementAlgorithm {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Lru => "LRU",
        }
    }
}

impl fmt::Display for ReplacementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacementAlgorithm {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            _ => Err(MemoryError::InvalidConfig(format!(
                "invalid algorithm '{}'. Valid: fifo, lru",
                s
            ))),
        }
    }
}

/// Paging engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub frame_count: usize,
    pub algorithm: ReplacementAlgorithm,
    /// Nominal page size; only reported, payloads are not size-checked
    pub page_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            algorithm: ReplacementAlgorithm::Fifo,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl MemoryConfig {
    pub fn new(frame_count: usize, algorithm: ReplacementAlgorithm) -> Self {
        Self {
            frame_count,
            algorithm,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> MemoryResult<()> {
        if self.frame_count == 0 {
            return Err(MemoryError::InvalidConfig(
                "frame count must be greater than zero".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(MemoryError::InvalidConfig(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A resident page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub key: PageKey,
    pub load_time: Duration,
    pub last_access: Duration,
    /// Engine reference counter value when loaded
    pub load_seq: u64,
    /// Engine reference counter value at the latest reference
    pub access_seq: u64,
    pub payload: Option<Bytes>,
}

impl Page {
    pub(crate) fn load(key: PageKey, now: Duration, seq: u64, payload: Option<Bytes>) -> Self {
        Self {
            key,
            load_time: now,
            last_access: now,
            load_seq: seq,
            access_seq: seq,
            payload,
        }
    }

    #[inline]
    pub(crate) fn touch(&mut self, now: Duration, seq: u64) {
        self.last_access = now;
        self.access_seq = seq;
    }
}

/// What a reference found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Hit,
    /// Loaded into a free frame (`evicted: None`) or over a victim
    Fault { evicted: Option<PageKey> },
}

/// Result of one reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAccess {
    pub key: PageKey,
    pub frame: FrameId,
    pub outcome: AccessOutcome,
}

impl PageAccess {
    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self.outcome, AccessOutcome::Hit)
    }

    #[inline]
    pub fn is_fault(&self) -> bool {
        !self.is_hit()
    }

    /// The page this reference evicted, if any
    #[inline]
    pub fn evicted(&self) -> Option<PageKey> {
        match self.outcome {
            AccessOutcome::Fault { evicted } => evicted,
            AccessOutcome::Hit => None,
        }
    }
}

/// Frame occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub id: FrameId,
    pub page: Option<PageKey>,
}

impl fmt::Display for FrameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(key) => write!(f, "Frame {}: [{}]", self.id, key),
            None => write!(f, "Frame {}: [ Empty ]", self.id),
        }
    }
}

/// Frames in use out of the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used: usize,
    pub total: usize,
}

impl MemoryUsage {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }
}

/// Snapshot of every frame, renderable as a memory map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    pub algorithm: ReplacementAlgorithm,
    pub frames: Vec<FrameSnapshot>,
}

impl MemoryMap {
    pub fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            used: self.frames.iter().filter(|f| f.page.is_some()).count(),
            total: self.frames.len(),
        }
    }

    /// Resident pages in frame order
    pub fn resident(&self) -> Vec<PageKey> {
        self.frames.iter().filter_map(|f| f.page).collect()
    }
}

impl fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "─".repeat(40);
        let usage = self.usage();

        writeln!(f, "┌{}┐", rule)?;
        writeln!(f, "│{:^40}│", "Physical Memory")?;
        writeln!(f, "├{}┤", rule)?;
        let line = format!(
            " Used: {}/{} frames ({:.1}%)",
            usage.used,
            usage.total,
            usage.percentage()
        );
        writeln!(f, "│{:<40}│", line)?;
        writeln!(f, "│{:<40}│", format!(" Algorithm: {}", self.algorithm))?;
        writeln!(f, "├{}┤", rule)?;
        for frame in &self.frames {
            writeln!(f, "│{:<40}│", format!(" {}", frame))?;
        }
        write!(f, "└{}┘", rule)
    }
}
