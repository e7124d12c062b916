//! The sequencer facade: one object owning the ring, the cursor, and the
//! strategies, wired once and then shared by every producer and consumer.
//!
//! Wiring order matters: construct, create barriers and consumer
//! sequences, call [`Sequencer::set_gating_sequences`] with the terminal
//! consumers, then share the sequencer (typically behind an `Arc`) and
//! start publishing. The gating list is not synchronized; it must not
//! change once publication begins.

use std::sync::Arc;

use crate::error::Result;
use crate::ring::buffer::{EventFactory, RingBuffer};
use crate::ring::claim::{ClaimMode, ClaimStrategy};
use crate::ring::barrier::SequenceBarrier;
use crate::ring::sequence::Sequence;
use crate::ring::wait::{WaitMode, WaitStrategy};

/// Coordinates producers and consumers over one ring buffer.
pub struct Sequencer<E> {
    buffer: RingBuffer<E>,
    cursor: Arc<Sequence>,
    claim_strategy: Arc<ClaimStrategy>,
    wait_strategy: Arc<WaitStrategy>,
    gating_sequences: Vec<Arc<Sequence>>,
}

impl<E> Sequencer<E> {
    /// Build a sequencer over `capacity` slots produced by `factory`.
    ///
    /// `capacity` must be a positive power of two.
    pub fn new(
        capacity: usize,
        claim_mode: ClaimMode,
        wait_mode: WaitMode,
        factory: &dyn EventFactory<E>,
    ) -> Result<Self> {
        let buffer = RingBuffer::new(capacity, factory)?;
        let claim_strategy = Arc::new(ClaimStrategy::new(claim_mode, capacity)?);
        Ok(Self {
            buffer,
            cursor: Arc::new(Sequence::default()),
            claim_strategy,
            wait_strategy: Arc::new(WaitStrategy::new(wait_mode)),
            gating_sequences: Vec::new(),
        })
    }

    /// Build a sequencer with default-constructed slots.
    pub fn with_default(capacity: usize, claim_mode: ClaimMode, wait_mode: WaitMode) -> Result<Self>
    where
        E: Default,
    {
        Self::new(capacity, claim_mode, wait_mode, &E::default)
    }

    /// Replace the gating set with the terminal consumers' sequences.
    ///
    /// Call once wiring is complete and before steady-state publication;
    /// producers read this list unsynchronized.
    pub fn set_gating_sequences(&mut self, sequences: Vec<Arc<Sequence>>) {
        self.gating_sequences = sequences;
    }

    /// Current cursor value: last published sequence (single-producer) or
    /// last reserved sequence (multi-producer).
    pub fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    /// Number of slots in the ring.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Which claim mode this sequencer runs.
    pub fn claim_mode(&self) -> ClaimMode {
        self.claim_strategy.mode()
    }

    /// Create a barrier gating on the cursor and `dependents`.
    ///
    /// The head consumer of a graph passes no dependents and waits on the
    /// cursor; downstream consumers pass their upstreams' sequences.
    pub fn new_barrier(&self, dependents: &[Arc<Sequence>]) -> SequenceBarrier {
        SequenceBarrier::new(
            self.cursor.clone(),
            dependents.to_vec(),
            self.wait_strategy.clone(),
            self.claim_strategy.clone(),
        )
    }

    /// Non-blocking probe: is there room to claim one more sequence?
    pub fn has_available_capacity(&self) -> bool {
        self.claim_strategy
            .has_available_capacity(&self.cursor, &self.gating_sequences)
    }

    /// Claim the next sequence, blocking (cooperative yield) while the
    /// ring is full.
    pub fn next(&self) -> i64 {
        self.next_batch(1)
    }

    /// Claim `delta` consecutive sequences, returning the last.
    pub fn next_batch(&self, delta: i64) -> i64 {
        self.claim_strategy
            .increment_and_get(&self.cursor, &self.gating_sequences, delta)
    }

    /// Publish one sequence and wake any blocked waiters.
    pub fn publish(&self, sequence: i64) {
        self.claim_strategy.publish(&self.cursor, sequence);
        self.wait_strategy.signal_all_when_blocking();
    }

    /// Publish an inclusive range and wake any blocked waiters.
    ///
    /// In multi-producer mode every sequence in the range gets its own
    /// availability flag; batch publication must use this rather than
    /// publishing only the upper bound.
    pub fn publish_range(&self, low: i64, high: i64) {
        self.claim_strategy.publish_range(&self.cursor, low, high);
        self.wait_strategy.signal_all_when_blocking();
    }

    /// Has `sequence` been published?
    pub fn is_available(&self, sequence: i64) -> bool {
        self.claim_strategy.is_available(&self.cursor, sequence)
    }

    /// Shared reference to the slot for `sequence`.
    ///
    /// # Safety
    ///
    /// See [`RingBuffer::slot`]: `sequence` must be published and within
    /// one lap of every gating consumer.
    pub unsafe fn slot(&self, sequence: i64) -> &E {
        self.buffer.slot(sequence)
    }

    /// Exclusive reference to the slot for `sequence`.
    ///
    /// # Safety
    ///
    /// See [`RingBuffer::slot_mut`]: the caller must hold the unpublished
    /// claim on `sequence`.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slot_mut(&self, sequence: i64) -> &mut E {
        self.buffer.slot_mut(sequence)
    }
}
