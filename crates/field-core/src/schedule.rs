//! Deferred work keyed by the frame clock.
//!
//! Propagation delays are not timers: each delayed spawn is pushed into a
//! min-heap ordered by due time and drained at the start of every frame.
//! Equal due times drain in insertion order, so a run is fully reproducible
//! from its seed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Entry<T> {
    due: f32,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // reversed so BinaryHeap pops the earliest due time first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct DeferredQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
    closed: bool,
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
            closed: false,
        }
    }

    /// Queue `payload` to fire once the clock reaches `due`. Ignored after
    /// [`close`](Self::close).
    pub fn schedule(&mut self, due: f32, payload: T) {
        if self.closed {
            return;
        }
        let due = if due.is_finite() { due } else { 0.0 };
        self.heap.push(Entry {
            due,
            seq: self.seq,
            payload,
        });
        self.seq += 1;
    }

    /// Pop every entry due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: f32, mut fire: impl FnMut(T)) -> usize {
        if self.closed {
            return 0;
        }
        let mut fired = 0;
        while self.heap.peek().is_some_and(|e| e.due <= now) {
            if let Some(entry) = self.heap.pop() {
                fire(entry.payload);
                fired += 1;
            }
        }
        fired
    }

    /// Drop everything pending and refuse further work.
    pub fn close(&mut self) {
        self.closed = true;
        self.heap.clear();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn next_due(&self) -> Option<f32> {
        self.heap.peek().map(|e| e.due)
    }
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
