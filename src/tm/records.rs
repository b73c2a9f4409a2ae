//! Record chains (spec.md §3, "Records"): a right-record (resp.
//! left-record) is a step at which the head strictly exceeds (resp. is
//! strictly below) all previous head positions. Per-state chains are
//! maintained as singly-linked lists in insertion order.
//!
//! Ported from `BouncerDecider.h`'s `Record`/`LatestLeftRecord`/
//! `LatestRightRecord` arrays, re-expressed as an arena + index (Design
//! Notes) instead of raw `Record*` chain pointers: nodes live in one
//! contiguous `Vec`, and `prev` is an index into that same `Vec` rather than
//! a pointer, so the whole structure is `Copy`-free but allocation-free
//! after construction.

pub const NO_RECORD: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
pub struct Record {
    pub step: u32,
    pub head: i32,
    pub state: u8,
    /// Index of the previous record with the same state, or `NO_RECORD`.
    pub prev: u32,
}

/// One direction's (left or right) record chain across all states, for one
/// machine run. Call [`RecordChain::clear`] between machines to reuse the
/// arena without freeing it (spec.md §5: "cleared, not freed, between
/// machines").
#[derive(Debug, Clone)]
pub struct RecordChain {
    arena: Vec<Record>,
    latest: Vec<u32>,
    capacity: usize,
}

impl RecordChain {
    pub fn new(max_states: usize, capacity: usize) -> Self {
        Self {
            arena: Vec::with_capacity(capacity),
            latest: vec![NO_RECORD; max_states + 1],
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.latest.iter_mut().for_each(|x| *x = NO_RECORD);
    }

    pub fn is_full(&self) -> bool {
        self.arena.len() >= self.capacity
    }

    pub fn latest_for_state(&self, state: u8) -> Option<u32> {
        let idx = self.latest[state as usize];
        if idx == NO_RECORD {
            None
        } else {
            Some(idx)
        }
    }

    /// Appends a new record for `state`, chaining it to the previous record
    /// for the same state. Returns the new record's index. Caller must check
    /// [`RecordChain::is_full`] first.
    pub fn push(&mut self, step: u32, head: i32, state: u8) -> u32 {
        let prev = self.latest[state as usize];
        let idx = self.arena.len() as u32;
        self.arena.push(Record {
            step,
            head,
            state,
            prev,
        });
        self.latest[state as usize] = idx;
        idx
    }

    pub fn get(&self, idx: u32) -> Record {
        self.arena[idx as usize]
    }

    /// Walks the chain for `state` from most to least recent.
    pub fn chain(&self, state: u8) -> ChainIter<'_> {
        ChainIter {
            chain: self,
            next: self.latest[state as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

pub struct ChainIter<'a> {
    chain: &'a RecordChain,
    next: u32,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.next == NO_RECORD {
            return None;
        }
        let rec = self.chain.get(self.next);
        self.next = rec.prev;
        Some(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_walks_most_recent_first() {
        let mut rc = RecordChain::new(5, 100);
        rc.push(1, 3, 2);
        rc.push(5, 7, 2);
        rc.push(9, 11, 2);
        let steps: Vec<u32> = rc.chain(2).map(|r| r.step).collect();
        assert_eq!(steps, vec![9, 5, 1]);
    }

    #[test]
    fn separate_states_have_separate_chains() {
        let mut rc = RecordChain::new(5, 100);
        rc.push(1, 3, 1);
        rc.push(2, 4, 2);
        assert_eq!(rc.chain(1).count(), 1);
        assert_eq!(rc.chain(2).count(), 1);
    }

    #[test]
    fn clear_resets_without_deallocating() {
        let mut rc = RecordChain::new(5, 100);
        rc.push(1, 3, 1);
        let cap_before = rc.arena.capacity();
        rc.clear();
        assert!(rc.is_empty());
        assert_eq!(rc.arena.capacity(), cap_before);
    }
}
