//! Per-consumer view of what is safe to read.
//!
//! A barrier composes the producer cursor, the upstream sequences this
//! consumer must not overtake, the shared wait strategy, and the claim
//! strategy (which resolves what is actually *published*, not merely
//! reserved, in multi-producer mode). Consumer graphs are wired by
//! handing each consumer a barrier over its upstreams' sequences.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ring::claim::ClaimStrategy;
use crate::ring::sequence::{Sequence, FIRST_SEQUENCE};
use crate::ring::wait::WaitStrategy;

/// Gate a consumer behind the cursor and its upstream consumers.
pub struct SequenceBarrier {
    cursor: Arc<Sequence>,
    dependents: Vec<Arc<Sequence>>,
    wait_strategy: Arc<WaitStrategy>,
    claim_strategy: Arc<ClaimStrategy>,
    alerted: AtomicBool,
}

impl SequenceBarrier {
    pub(crate) fn new(
        cursor: Arc<Sequence>,
        dependents: Vec<Arc<Sequence>>,
        wait_strategy: Arc<WaitStrategy>,
        claim_strategy: Arc<ClaimStrategy>,
    ) -> Self {
        Self {
            cursor,
            dependents,
            wait_strategy,
            claim_strategy,
            alerted: AtomicBool::new(false),
        }
    }

    /// Block until `sequence` is safely readable.
    ///
    /// Returns the highest contiguously published sequence `>= sequence`
    /// that this consumer may read (possibly higher than requested), or
    /// [`crate::ALERTED`] when the barrier is alerted. The wait strategy
    /// answers "how far has my visibility source advanced"; the claim
    /// strategy then narrows that to "how much of it is actually
    /// published".
    pub fn wait_for(&self, sequence: i64) -> i64 {
        let available =
            self.wait_strategy
                .wait_for(sequence, &self.cursor, &self.dependents, &self.alerted);
        if available < FIRST_SEQUENCE {
            return available;
        }
        self.claim_strategy.highest_published(sequence, available)
    }

    /// As [`wait_for`](Self::wait_for), plus [`crate::TIMEOUT`] once
    /// `timeout` elapses.
    pub fn wait_for_timeout(&self, sequence: i64, timeout: Duration) -> i64 {
        let available = self.wait_strategy.wait_for_timeout(
            sequence,
            &self.cursor,
            &self.dependents,
            &self.alerted,
            timeout,
        );
        if available < FIRST_SEQUENCE {
            return available;
        }
        self.claim_strategy.highest_published(sequence, available)
    }

    /// Value of the producer cursor.
    pub fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    /// Has this barrier been alerted?
    pub fn is_alerted(&self) -> bool {
        self.alerted.load(Ordering::Acquire)
    }

    /// Raise or clear the alert. Waiters observe a raised alert on their
    /// next probe; blocking waiters additionally need
    /// [`signal_all_when_blocking`](Self::signal_all_when_blocking).
    pub fn set_alerted(&self, alerted: bool) {
        self.alerted.store(alerted, Ordering::Release);
    }

    /// Wake any waiter parked in the blocking strategy.
    pub fn signal_all_when_blocking(&self) {
        self.wait_strategy.signal_all_when_blocking();
    }
}
