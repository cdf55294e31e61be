/*!
 * Core Types
 * Common types used across both engines
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Schedulable unit ID (monotonic per engine)
pub type UnitId = u32;

/// Priority level (0 is the most urgent; lower numbers run first)
pub type Priority = u8;

/// Owner of a set of memory pages (usually a unit id)
pub type OwnerId = u32;

/// Page number within an owner's address space
pub type PageNumber = u32;

/// Physical frame slot index
pub type FrameId = usize;

/// Identity of an engine instance
///
/// Units remember the engine that created them so a unit cannot be admitted
/// into a second engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineId(pub Uuid);

impl EngineId {
    #[inline]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell engines apart in logs
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..8])
    }
}

/// Identity of a resident page: (owner, page number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey {
    pub owner: OwnerId,
    pub page: PageNumber,
}

impl PageKey {
    #[inline]
    #[must_use]
    pub const fn new(owner: OwnerId, page: PageNumber) -> Self {
        Self { owner, page }
    }
}

impl From<(OwnerId, PageNumber)> for PageKey {
    fn from((owner, page): (OwnerId, PageNumber)) -> Self {
        Self::new(owner, page)
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}:Pg{}", self.owner, self.page)
    }
}
