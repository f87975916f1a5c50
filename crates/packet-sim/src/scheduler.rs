//! Deterministic event queue.
//!
//! A `BinaryHeap` with reversed ordering acts as a min-heap keyed by
//! `(time, sequence)`. Sequence numbers are strictly increasing, so events
//! scheduled for the same instant fire in insertion order and two runs that
//! schedule the same events always dispatch them identically.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::time::SimTime;

struct Entry<T> {
    at: SimTime,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the earliest (time, seq) is the heap maximum.
        (other.at, other.seq).cmp(&(self.at, self.seq))
    }
}

pub struct Scheduler<T> {
    queue: BinaryHeap<Entry<T>>,
    next_seq: u64,
    now: SimTime,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
            now: SimTime::ZERO,
        }
    }

    /// Current simulated time: the timestamp of the last popped event.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `payload` at `at`. Times in the past are moved up to `now`.
    pub fn schedule(&mut self, at: SimTime, payload: T) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry { at, seq, payload });
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|e| e.at)
    }

    /// Pop the next event if it is due at or before `limit`.
    pub fn pop_until(&mut self, limit: SimTime) -> Option<(SimTime, T)> {
        if self.peek_time()? > limit {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = entry.at;
        Some((entry.at, entry.payload))
    }

    /// Move the clock forward without dispatching anything.
    pub fn advance_clock(&mut self, to: SimTime) {
        self.now = self.now.max(to);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
