/*!
 * Frame Order List
 *
 * Intrusive doubly-linked list over frame indices. Holds the replacement
 * order: load order under FIFO, recency order under LRU. The head is always
 * the next victim.
 *
 * ## Performance
 * - `push_back`, `remove`, `move_to_back`, `front`: O(1)
 * - Links live in flat vectors sized to the frame count; no allocation after
 *   construction
 */

use crate::core::types::FrameId;

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<FrameId>,
    next: Option<FrameId>,
    linked: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct FrameList {
    links: Vec<Link>,
    head: Option<FrameId>,
    tail: Option<FrameId>,
    len: usize,
}

impl FrameList {
    pub fn new(capacity: usize) -> Self {
        Self {
            links: vec![Link::default(); capacity],
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Next victim
    #[inline]
    pub fn front(&self) -> Option<FrameId> {
        self.head
    }

    #[inline]
    pub fn contains(&self, frame: FrameId) -> bool {
        self.links.get(frame).map_or(false, |l| l.linked)
    }

    /// Append as most recent
    pub fn push_back(&mut self, frame: FrameId) {
        assert!(!self.links[frame].linked, "frame {} linked twice", frame);

        self.links[frame] = Link {
            prev: self.tail,
            next: None,
            linked: true,
        };
        match self.tail {
            Some(tail) => self.links[tail].next = Some(frame),
            None => self.head = Some(frame),
        }
        self.tail = Some(frame);
        self.len += 1;
    }

    /// Unlink; returns false if the frame was not linked
    pub fn remove(&mut self, frame: FrameId) -> bool {
        if !self.contains(frame) {
            return false;
        }

        let Link { prev, next, .. } = self.links[frame];
        match prev {
            Some(p) => self.links[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n].prev = prev,
            None => self.tail = prev,
        }
        self.links[frame] = Link::default();
        self.len -= 1;
        true
    }

    /// Hot path - LRU hit
    #[inline]
    pub fn move_to_back(&mut self, frame: FrameId) {
        if self.tail == Some(frame) {
            return;
        }
        if self.remove(frame) {
            self.push_back(frame);
        }
    }

    pub fn clear(&mut self) {
        self.links.iter_mut().for_each(|l| *l = Link::default());
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Frames from next victim to most recent
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }
}

pub(crate) struct Iter<'a> {
    list: &'a FrameList,
    cursor: Option<FrameId>,
    /// Bounds the walk if links were ever corrupted into a cycle
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = FrameId;

    fn next(&mut self) -> Option<FrameId> {
        if self.remaining == 0 {
            return None;
        }
        let frame = self.cursor?;
        self.cursor = self.list.links[frame].next;
        self.remaining -= 1;
        Some(frame)
    }
}
