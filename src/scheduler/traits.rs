/*!
 * Scheduler Traits
 * The ready-structure contract shared by both scheduling policies
 */

use super::entry::Entry;
use crate::core::types::UnitId;
use std::fmt;

/// Policy-specific ready structure
///
/// The run loop is policy independent: it only admits entries, pops the next
/// one and asks whether a waiting entry outranks the running one.
pub trait ReadyQueue: Send + fmt::Debug {
    /// Insert an admitted or returning unit
    fn push(&mut self, entry: Entry);

    /// Remove the entry the policy would run next
    fn pop(&mut self) -> Option<Entry>;

    /// Entry the policy would run next
    fn peek(&self) -> Option<&Entry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids in the order the policy would select them
    fn ids(&self) -> Vec<UnitId>;

    /// Whether `waiting` should displace `running` under this policy
    fn outranks(&self, waiting: &Entry, running: &Entry) -> bool;
}
