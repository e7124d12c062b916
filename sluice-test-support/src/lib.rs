//! # sluice-test-support
//!
//! Testing infrastructure for the sluice workspace.
//!
//! ## Components
//!
//! - [`StubEvent`] - minimal slot payload for exercising the ring
//! - [`CapturingHandler`] - records every `(sequence, value)` delivery
//! - [`CheckingHandler`] - asserts contiguous, in-order delivery
//! - [`ConsumerRig`] - one consumer thread wired, spawned, and joinable
//! - [`wait_for_sequence`] - bounded poll on a progress sequence
//!
//! The multi-threaded topology tests under `tests/` are built entirely
//! from these pieces.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sluice::{
    EventHandler, EventProcessor, ProcessorHandle, Sequence, SequenceBarrier, Sequencer,
    INITIAL_SEQUENCE,
};

/// How long a test waits for cross-thread progress before declaring the
/// run wedged.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(10);

/// Minimal event payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StubEvent {
    pub value: i64,
}

/// Records every delivery as a `(sequence, value)` pair.
pub struct CapturingHandler {
    seen: Arc<Mutex<Vec<(i64, i64)>>>,
}

impl CapturingHandler {
    pub fn new() -> (Self, Arc<Mutex<Vec<(i64, i64)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Self { seen: seen.clone() }, seen)
    }
}

impl EventHandler<StubEvent> for CapturingHandler {
    fn on_event(&mut self, sequence: i64, event: &StubEvent) {
        self.seen.lock().unwrap().push((sequence, event.value));
    }
}

/// Asserts strictly contiguous in-order delivery and counts events.
///
/// Violations are counted rather than panicked on, so a broken ordering
/// surfaces as a failed assertion in the test body instead of a poisoned
/// consumer thread.
pub struct CheckingHandler {
    next_expected: i64,
    violations: Arc<AtomicUsize>,
    delivered: Arc<AtomicI64>,
}

impl CheckingHandler {
    pub fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicI64>) {
        let violations = Arc::new(AtomicUsize::new(0));
        let delivered = Arc::new(AtomicI64::new(0));
        (
            Self {
                next_expected: INITIAL_SEQUENCE + 1,
                violations: violations.clone(),
                delivered: delivered.clone(),
            },
            violations,
            delivered,
        )
    }
}

impl EventHandler<StubEvent> for CheckingHandler {
    fn on_event(&mut self, sequence: i64, _event: &StubEvent) {
        if sequence != self.next_expected {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
        self.next_expected = sequence + 1;
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }
}

/// One consumer wired into a graph and running on its own thread.
pub struct ConsumerRig {
    progress: Arc<Sequence>,
    handle: ProcessorHandle,
    thread: JoinHandle<()>,
}

impl ConsumerRig {
    /// Spawn a processor over `barrier` feeding `handler`, reporting
    /// progress through `progress` (which the caller has already wired
    /// as a gating sequence or downstream dependent).
    pub fn spawn<H>(
        sequencer: Arc<Sequencer<StubEvent>>,
        barrier: SequenceBarrier,
        handler: H,
        progress: Arc<Sequence>,
    ) -> Self
    where
        H: EventHandler<StubEvent> + Send + 'static,
    {
        let mut processor =
            EventProcessor::with_sequence(sequencer, barrier, handler, progress.clone());
        let handle = processor.handle();
        let thread = thread::spawn(move || processor.run());
        Self {
            progress,
            handle,
            thread,
        }
    }

    /// This consumer's progress sequence.
    pub fn progress(&self) -> Arc<Sequence> {
        self.progress.clone()
    }

    /// Block until the consumer has processed through `target`.
    pub fn await_sequence(&self, target: i64) {
        wait_for_sequence(&self.progress, target);
    }

    /// Halt the processor and join its thread.
    pub fn shutdown(self) {
        self.handle.halt();
        self.thread.join().unwrap();
    }
}

/// Poll `sequence` until it reaches `target`, panicking after
/// [`DRAIN_DEADLINE`].
pub fn wait_for_sequence(sequence: &Sequence, target: i64) {
    let start = Instant::now();
    while sequence.get() < target {
        assert!(
            start.elapsed() < DRAIN_DEADLINE,
            "sequence stuck at {} waiting for {}",
            sequence.get(),
            target
        );
        thread::yield_now();
    }
}
