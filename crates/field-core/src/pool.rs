//! Fixed-capacity ring pool for short-lived entities (pulses, flashes).
//!
//! Slots are handed out round-robin. When every slot is busy the oldest one
//! is overwritten: under extreme load a few pulses vanish early, which is an
//! acceptable visual glitch and keeps memory bounded.

pub trait Poolable: Default {
    fn is_active(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct RingPool<T: Poolable> {
    slots: Vec<T>,
    cursor: usize,
    overwritten: u64,
}

impl<T: Poolable> RingPool<T> {
    /// Panics if `capacity` is zero; pool sizes are compile-time constants.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "pool capacity must be non-zero");
        Self {
            slots: (0..capacity).map(|_| T::default()).collect(),
            cursor: 0,
            overwritten: 0,
        }
    }

    /// Claim the next slot in ring order and return it for initialisation.
    pub fn acquire(&mut self) -> &mut T {
        let idx = self.cursor % self.slots.len();
        self.cursor = self.cursor.wrapping_add(1);
        if self.slots[idx].is_active() {
            self.overwritten += 1;
            log::trace!("pool full, recycling live slot {idx}");
        }
        &mut self.slots[idx]
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// How many live slots have been recycled since construction.
    #[inline]
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    /// Index of the slot the next `acquire` will return.
    #[inline]
    pub fn next_slot(&self) -> usize {
        self.cursor % self.slots.len()
    }

    #[inline]
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    #[inline]
    pub fn slots_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }

    pub fn clear(&mut self) {
        for s in &mut self.slots {
            *s = T::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Slot {
        active: bool,
        tag: u32,
    }

    impl Poolable for Slot {
        fn is_active(&self) -> bool {
            self.active
        }
    }

    #[test]
    fn wraps_and_counts_overwrites() {
        let mut pool = RingPool::<Slot>::new(3);
        for tag in 0..4 {
            let s = pool.acquire();
            s.active = true;
            s.tag = tag;
        }
        assert_eq!(pool.active_count(), 3);
        assert_eq!(pool.overwritten(), 1);
        // slot 0 held the oldest entry and now holds the newest
        assert_eq!(pool.slots()[0].tag, 3);
    }

    #[test]
    fn reusing_dead_slots_is_not_an_overwrite() {
        let mut pool = RingPool::<Slot>::new(2);
        pool.acquire().active = false;
        pool.acquire().active = false;
        pool.acquire().active = true;
        assert_eq!(pool.overwritten(), 0);
    }
}
