//! Producer-side slot reservation and publication.
//!
//! A claim strategy hands out contiguous sequence ranges without ever
//! letting a producer lap a gating consumer, then makes written slots
//! visible. The single-producer variant keeps its reservation counter in
//! plain cells (one claiming thread, no atomics on the hot path); the
//! multi-producer variant serializes reservations with CAS on the cursor
//! and tracks out-of-order commits in a per-slot availability array.
//!
//! Cursor semantics differ by variant and the rest of the crate leans on
//! this: single-producer, cursor = last *published* sequence;
//! multi-producer, cursor = last *reserved* sequence, with publication
//! recorded per slot.

use std::cell::Cell;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::{Result, SluiceError};
use crate::insights;
use crate::ring::sequence::{minimum_sequence, Sequence, INITIAL_SEQUENCE};

/// Claim strategy selection, chosen once at sequencer construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    /// One claiming thread, no atomics on the claim path. Undefined
    /// behavior if two threads ever claim concurrently.
    SingleProducer,
    /// Any number of claiming threads; CAS on the cursor plus per-slot
    /// availability flags.
    MultiProducer,
}

/// Reservation state for exactly one producer thread.
pub struct SingleProducerClaim {
    capacity: i64,
    /// Last claimed sequence. Plain cell: only the producer thread
    /// touches it.
    next: Cell<i64>,
    /// Cached `min(gating)`; refreshed only when the wrap point passes it.
    gate_cache: Cell<i64>,
}

// One thread claims, per the SingleProducer contract; everything else in
// here is immutable. The cells are never touched off the claiming thread.
unsafe impl Sync for SingleProducerClaim {}

impl SingleProducerClaim {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity as i64,
            next: Cell::new(INITIAL_SEQUENCE),
            gate_cache: Cell::new(INITIAL_SEQUENCE),
        }
    }

    fn increment_and_get(&self, gating: &[Arc<Sequence>], delta: i64) -> i64 {
        let next = self.next.get() + delta;
        self.next.set(next);

        let wrap_point = next - self.capacity;
        if wrap_point > self.gate_cache.get() {
            loop {
                let min_gating = minimum_sequence(gating);
                if min_gating >= wrap_point {
                    self.gate_cache.set(min_gating);
                    break;
                }
                insights::producer_blocked(wrap_point, min_gating);
                thread::yield_now();
            }
        }
        next
    }

    fn has_available_capacity(&self, gating: &[Arc<Sequence>]) -> bool {
        let wrap_point = self.next.get() + 1 - self.capacity;
        if wrap_point > self.gate_cache.get() {
            let min_gating = minimum_sequence(gating);
            self.gate_cache.set(min_gating);
            if min_gating < wrap_point {
                return false;
            }
        }
        true
    }
}

/// Shared reservation state for any number of producer threads.
pub struct MultiProducerClaim {
    capacity: i64,
    index_mask: i64,
    index_shift: u32,
    /// One flag per slot holding `sequence >> index_shift`, the lap that
    /// last wrote the slot. `-1` means never written.
    available: Box<[AtomicI64]>,
    /// Cached `min(gating)`, shared by all producers. Monotonic refresh;
    /// a stale value only costs an extra scan.
    gate_cache: Sequence,
}

impl MultiProducerClaim {
    fn new(capacity: usize) -> Self {
        let available = (0..capacity)
            .map(|_| AtomicI64::new(-1))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            capacity: capacity as i64,
            index_mask: (capacity as i64) - 1,
            index_shift: capacity.trailing_zeros(),
            available,
            gate_cache: Sequence::default(),
        }
    }

    fn increment_and_get(&self, cursor: &Sequence, gating: &[Arc<Sequence>], delta: i64) -> i64 {
        loop {
            let current = cursor.get();
            let next = current + delta;

            let wrap_point = next - self.capacity;
            if wrap_point > self.gate_cache.get() {
                let min_gating = minimum_sequence(gating);
                if min_gating < wrap_point {
                    insights::producer_blocked(wrap_point, min_gating);
                    thread::yield_now();
                    continue;
                }
                self.gate_cache.set(min_gating);
            } else if cursor.compare_and_set(current, next) {
                return next;
            }
        }
    }

    fn has_available_capacity(&self, cursor: &Sequence, gating: &[Arc<Sequence>]) -> bool {
        let wrap_point = cursor.get() + 1 - self.capacity;
        if wrap_point > self.gate_cache.get() {
            let min_gating = minimum_sequence(gating);
            self.gate_cache.set(min_gating);
            if min_gating < wrap_point {
                return false;
            }
        }
        true
    }

    #[inline(always)]
    fn flag_of(&self, sequence: i64) -> i64 {
        sequence >> self.index_shift
    }

    #[inline(always)]
    fn slot_of(&self, sequence: i64) -> usize {
        (sequence & self.index_mask) as usize
    }

    fn publish(&self, sequence: i64) {
        self.available[self.slot_of(sequence)].store(self.flag_of(sequence), Ordering::Release);
    }

    fn is_available(&self, sequence: i64) -> bool {
        self.available[self.slot_of(sequence)].load(Ordering::Acquire) == self.flag_of(sequence)
    }

    fn highest_published(&self, lower_bound: i64, upper_bound: i64) -> i64 {
        // O(distance), but the scan stops at the first gap and the
        // typical distance is 1.
        for sequence in lower_bound..=upper_bound {
            if !self.is_available(sequence) {
                return sequence - 1;
            }
        }
        upper_bound
    }
}

/// Runtime claim strategy with inline variant dispatch.
pub enum ClaimStrategy {
    Single(SingleProducerClaim),
    Multi(MultiProducerClaim),
}

impl ClaimStrategy {
    /// Build the strategy for a mode over a validated capacity.
    pub fn new(mode: ClaimMode, capacity: usize) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() || capacity > (i64::MAX as usize) {
            return Err(SluiceError::invalid_capacity(capacity));
        }
        Ok(match mode {
            ClaimMode::SingleProducer => Self::Single(SingleProducerClaim::new(capacity)),
            ClaimMode::MultiProducer => Self::Multi(MultiProducerClaim::new(capacity)),
        })
    }

    /// Which mode this strategy was built for.
    pub fn mode(&self) -> ClaimMode {
        match self {
            Self::Single(_) => ClaimMode::SingleProducer,
            Self::Multi(_) => ClaimMode::MultiProducer,
        }
    }

    /// Reserve `delta` consecutive sequences and return the last.
    ///
    /// Yields cooperatively while the reservation would lap a gating
    /// consumer. The returned range `[result - delta + 1, result]` is
    /// exclusively owned by the caller until published.
    pub fn increment_and_get(
        &self,
        cursor: &Sequence,
        gating: &[Arc<Sequence>],
        delta: i64,
    ) -> i64 {
        match self {
            Self::Single(claim) => claim.increment_and_get(gating, delta),
            Self::Multi(claim) => claim.increment_and_get(cursor, gating, delta),
        }
    }

    /// Non-blocking probe: can one more sequence be claimed right now?
    pub fn has_available_capacity(&self, cursor: &Sequence, gating: &[Arc<Sequence>]) -> bool {
        match self {
            Self::Single(claim) => claim.has_available_capacity(gating),
            Self::Multi(claim) => claim.has_available_capacity(cursor, gating),
        }
    }

    /// Mark `sequence` visible to consumers.
    pub fn publish(&self, cursor: &Sequence, sequence: i64) {
        match self {
            Self::Single(_) => cursor.set(sequence),
            Self::Multi(claim) => claim.publish(sequence),
        }
    }

    /// Mark every sequence in `[low, high]` visible to consumers.
    pub fn publish_range(&self, cursor: &Sequence, low: i64, high: i64) {
        match self {
            Self::Single(_) => cursor.set(high),
            Self::Multi(claim) => {
                for sequence in low..=high {
                    claim.publish(sequence);
                }
            }
        }
    }

    /// Consumer-side probe: has `sequence` been published?
    pub fn is_available(&self, cursor: &Sequence, sequence: i64) -> bool {
        match self {
            Self::Single(_) => sequence <= cursor.get(),
            Self::Multi(claim) => claim.is_available(sequence),
        }
    }

    /// Highest `s <= upper_bound` such that every sequence in
    /// `[lower_bound, s]` is published; `lower_bound - 1` when
    /// `lower_bound` itself is not.
    ///
    /// Single-producer publication is strictly in order, so the caller's
    /// `upper_bound` (taken from the cursor) is already the answer.
    pub fn highest_published(&self, lower_bound: i64, upper_bound: i64) -> i64 {
        match self {
            Self::Single(_) => upper_bound,
            Self::Multi(claim) => claim.highest_published(lower_bound, upper_bound),
        }
    }
}
