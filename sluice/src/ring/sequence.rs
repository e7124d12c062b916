//! Cache-line-isolated atomic sequence counter.
//!
//! Sequence numbers drive everything in sluice: producers claim them,
//! consumers publish their progress through them, and barriers compare
//! them. Values:
//!
//! - initial: `-1` (nothing produced/consumed yet)
//! - first real sequence: `0`
//! - monotonically increasing from there
//!
//! Negative values below the initial value are reserved as out-of-band
//! signals returned from waits ([`ALERTED`], [`TIMEOUT`]). Valid
//! published sequences are always `>= 0`, so one `i64` return channel
//! carries both data and control.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::constants::PADDED_ATOMIC_SIZE;

/// Initial value of every sequence: nothing published or consumed yet.
pub const INITIAL_SEQUENCE: i64 = -1;

/// The first sequence a producer ever claims.
pub const FIRST_SEQUENCE: i64 = INITIAL_SEQUENCE + 1;

/// Wait aborted because the barrier was alerted (shutdown).
pub const ALERTED: i64 = -2;

/// Wait aborted because the deadline passed.
pub const TIMEOUT: i64 = -3;

/// Cache-line padded atomic sequence counter.
///
/// The counter occupies two full cache lines by itself, so no adjacent
/// allocation can share a line with it. False sharing between a producer
/// cursor and a consumer sequence costs an order of magnitude in
/// throughput; the padding is load-bearing, not cosmetic.
#[repr(align(128))]
pub struct Sequence {
    value: AtomicI64,
    _padding: [u8; PADDED_ATOMIC_SIZE - 8],
}

impl Sequence {
    /// Create a sequence with the given starting value.
    pub const fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
            _padding: [0u8; PADDED_ATOMIC_SIZE - 8],
        }
    }

    /// Current value, acquire ordering.
    ///
    /// Observing a value implies all writes ordered before the release
    /// store that produced it are visible to this thread.
    #[inline(always)]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Set the value, release ordering.
    ///
    /// Write slot data first, then set the sequence.
    #[inline(always)]
    pub fn set(&self, sequence: i64) {
        self.value.store(sequence, Ordering::Release);
    }

    /// Atomically add `delta` and return the post-increment value.
    #[inline(always)]
    pub fn increment_and_get(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::AcqRel) + delta
    }

    /// Compare-and-set; returns true when the swap happened.
    #[inline(always)]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(INITIAL_SEQUENCE)
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence").field("value", &self.get()).finish()
    }
}

/// Minimum of a set of sequences; `i64::MAX` when the set is empty.
///
/// Each load is an independent acquire; no snapshot semantics. Producers
/// use this over the gating set, so a stale (lower) read only makes them
/// more conservative, never less.
#[inline]
pub fn minimum_sequence(sequences: &[Arc<Sequence>]) -> i64 {
    let mut minimum = i64::MAX;
    for sequence in sequences {
        minimum = minimum.min(sequence.get());
    }
    minimum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};
    use std::thread;

    #[test]
    fn test_layout_occupies_full_cache_lines() {
        assert!(size_of::<Sequence>() >= crate::constants::CACHE_LINE_SIZE);
        assert_eq!(size_of::<Sequence>(), PADDED_ATOMIC_SIZE);
        assert_eq!(align_of::<Sequence>(), PADDED_ATOMIC_SIZE);
    }

    #[test]
    fn test_starts_at_initial_value() {
        assert_eq!(Sequence::default().get(), INITIAL_SEQUENCE);
        assert_eq!(Sequence::new(42).get(), 42);
    }

    #[test]
    fn test_set_and_get() {
        let seq = Sequence::default();
        seq.set(7);
        assert_eq!(seq.get(), 7);
    }

    #[test]
    fn test_increment_returns_post_value() {
        let seq = Sequence::default();
        assert_eq!(seq.increment_and_get(1), 0);
        assert_eq!(seq.increment_and_get(3), 3);
        assert_eq!(seq.get(), 3);
    }

    #[test]
    fn test_compare_and_set() {
        let seq = Sequence::new(5);
        assert!(seq.compare_and_set(5, 9));
        assert_eq!(seq.get(), 9);
        assert!(!seq.compare_and_set(5, 11));
        assert_eq!(seq.get(), 9);
    }

    #[test]
    fn test_minimum_of_empty_set_is_max() {
        assert_eq!(minimum_sequence(&[]), i64::MAX);
    }

    #[test]
    fn test_minimum_of_set() {
        let a = Arc::new(Sequence::new(3));
        let b = Arc::new(Sequence::new(-1));
        let c = Arc::new(Sequence::new(17));
        assert_eq!(minimum_sequence(&[a, b, c]), -1);
    }

    #[test]
    fn test_concurrent_increment_loses_nothing() {
        let seq = Arc::new(Sequence::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        seq.increment_and_get(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(seq.get(), 8000);
    }
}
