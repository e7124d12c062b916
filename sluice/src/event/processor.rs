//! Consumer driver: the loop that turns a barrier into handler calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, SluiceError};
use crate::insights;
use crate::ring::barrier::SequenceBarrier;
use crate::ring::sequence::{Sequence, INITIAL_SEQUENCE};
use crate::ring::sequencer::Sequencer;

/// Receives published events on the consumer thread, in sequence order.
///
/// The lifecycle hooks run on the same thread as `on_event`: `on_start`
/// before the first event of a `run`, `on_shutdown` after the loop
/// exits. Panics from any hook are not caught; they terminate the
/// consumer thread and leave the consumer's sequence where it was.
pub trait EventHandler<E> {
    fn on_event(&mut self, sequence: i64, event: &E);

    fn on_start(&mut self) {}

    fn on_shutdown(&mut self) {}
}

/// Drives one consumer: waits on its barrier, hands each published slot
/// to the handler, then publishes its own progress.
///
/// Wire-up order: create the processor, register
/// [`sequence`](Self::sequence) with the sequencer (as a gating sequence,
/// or as a dependent of downstream barriers), take a
/// [`handle`](Self::handle) for shutdown, then move the processor into
/// its thread and call [`run`](Self::run).
pub struct EventProcessor<E, H> {
    sequencer: Arc<Sequencer<E>>,
    barrier: Arc<SequenceBarrier>,
    sequence: Arc<Sequence>,
    running: Arc<AtomicBool>,
    handler: H,
}

impl<E, H: EventHandler<E>> EventProcessor<E, H> {
    pub fn new(sequencer: Arc<Sequencer<E>>, barrier: SequenceBarrier, handler: H) -> Self {
        Self::with_sequence(sequencer, barrier, handler, Arc::new(Sequence::default()))
    }

    /// Build a processor around an externally created progress sequence.
    ///
    /// Graph wiring usually needs the sequence before the sequencer can
    /// be shared: create it, register it (gating list or downstream
    /// barriers), then hand it to the processor.
    pub fn with_sequence(
        sequencer: Arc<Sequencer<E>>,
        barrier: SequenceBarrier,
        handler: H,
        sequence: Arc<Sequence>,
    ) -> Self {
        Self {
            sequencer,
            barrier: Arc::new(barrier),
            sequence,
            running: Arc::new(AtomicBool::new(false)),
            handler,
        }
    }

    /// This consumer's progress sequence.
    pub fn sequence(&self) -> Arc<Sequence> {
        self.sequence.clone()
    }

    /// A handle that can stop the processor from another thread.
    pub fn handle(&self) -> ProcessorHandle {
        ProcessorHandle {
            running: self.running.clone(),
            barrier: self.barrier.clone(),
        }
    }

    /// Process events until halted. Safe to call again after a halt; the
    /// loop resumes at the sequence after the last one processed.
    ///
    /// Already running: returns immediately.
    pub fn run(&mut self) {
        let _ = self.try_run();
    }

    /// As [`run`](Self::run), but reports a start in the wrong state
    /// instead of ignoring it.
    pub fn try_run(&mut self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(SluiceError::AlreadyRunning);
        }
        self.barrier.set_alerted(false);
        insights::processor_started();
        self.handler.on_start();

        loop {
            // Always recomputed from the stored sequence: "next to
            // process" must equal "last processed + 1" even across
            // halt/run cycles.
            let next = self.sequence.get() + 1;
            let available = self.barrier.wait_for(next);
            if available < INITIAL_SEQUENCE {
                // Alerted (or a timed barrier expired): shut down.
                break;
            }
            if available >= next {
                for sequence in next..=available {
                    // Safety: sequence is published and this consumer
                    // gates the producer, so the slot cannot be rewritten
                    // before the sequence below advances.
                    let event = unsafe { self.sequencer.slot(sequence) };
                    self.handler.on_event(sequence, event);
                }
                self.sequence.set(available);
            }
            // available == next - 1: a reservation ahead of us is not
            // published yet; go around again.
            if !self.running.load(Ordering::Acquire) {
                break;
            }
        }

        self.handler.on_shutdown();
        insights::processor_shutdown(self.sequence.get());
        self.running.store(false, Ordering::Release);
        Ok(())
    }
}

/// Cloneable stop-handle for a running [`EventProcessor`].
#[derive(Clone)]
pub struct ProcessorHandle {
    running: Arc<AtomicBool>,
    barrier: Arc<SequenceBarrier>,
}

impl ProcessorHandle {
    /// Stop the processor. Idempotent; halting a stopped processor is a
    /// no-op.
    pub fn halt(&self) {
        let _ = self.try_halt();
    }

    /// As [`halt`](Self::halt), but reports a stop in the wrong state
    /// instead of ignoring it.
    ///
    /// Sets the alert flag *and* signals the wait strategy: a waiter
    /// parked on the blocking strategy's condvar cannot observe the flag
    /// until woken.
    pub fn try_halt(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Err(SluiceError::NotRunning);
        }
        self.barrier.set_alerted(true);
        self.barrier.signal_all_when_blocking();
        Ok(())
    }

    /// Is the processor currently inside its run loop?
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
