//! Lock-free inter-thread messaging over a pre-allocated ring buffer.
//!
//! sluice decouples producers from consumers with a single shared
//! circular buffer indexed by a monotonically increasing sequence
//! number. Producers claim slots, write, and publish; consumers observe
//! the published cursor through a [`SequenceBarrier`] and process events
//! strictly in order, fanning out or chaining into dependency graphs.
//!
//! ## Topologies
//!
//! | Shape     | Wiring                                                   |
//! |-----------|----------------------------------------------------------|
//! | Unicast   | one producer, one gating consumer                        |
//! | Multicast | independent consumers, all gating, no dependents         |
//! | Pipeline  | A → B → C; each barrier depends on the upstream sequence |
//! | Diamond   | A and B in parallel, C depends on both                   |
//!
//! ## Configuration
//!
//! - [`ClaimMode`]: `SingleProducer` (no atomics on the claim path; one
//!   claiming thread only) or `MultiProducer` (CAS reservations plus
//!   per-slot availability flags).
//! - [`WaitMode`]: `BusySpin`, `Yielding`, `Sleeping`, or `Blocking`.
//!   Identical contracts, very different latency/CPU trades.
//! - Capacity: any positive power of two.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use sluice::{
//!     ClaimMode, EventProcessor, EventProducer, EventHandler, Sequence, Sequencer, WaitMode,
//! };
//!
//! #[derive(Default)]
//! struct Tick {
//!     value: i64,
//! }
//!
//! struct Sum(i64);
//!
//! impl EventHandler<Tick> for Sum {
//!     fn on_event(&mut self, _sequence: i64, event: &Tick) {
//!         self.0 += event.value;
//!     }
//! }
//!
//! let mut sequencer =
//!     Sequencer::<Tick>::with_default(8, ClaimMode::SingleProducer, WaitMode::Yielding)?;
//!
//! // Wire the graph: barrier and progress sequence first, then gate.
//! let barrier = sequencer.new_barrier(&[]);
//! let progress = Arc::new(Sequence::default());
//! sequencer.set_gating_sequences(vec![progress.clone()]);
//! let sequencer = Arc::new(sequencer);
//!
//! let mut processor =
//!     EventProcessor::with_sequence(sequencer.clone(), barrier, Sum(0), progress);
//! let handle = processor.handle();
//! let consumer = thread::spawn(move || processor.run());
//!
//! let producer = EventProducer::new(sequencer);
//! producer.publish_event(&|seq: i64, slot: &mut Tick| slot.value = seq, 4);
//!
//! # thread::sleep(std::time::Duration::from_millis(50));
//! handle.halt();
//! consumer.join().unwrap();
//! # Ok::<(), sluice::SluiceError>(())
//! ```
//!
//! ## Safety
//!
//! Slot access is coordinated by sequence ownership rather than locks:
//! a claimed, unpublished sequence grants its producer exclusive access
//! to one slot, and publication hands the slot to consumers until the
//! ring wraps. The `unsafe` slot accessors on [`Sequencer`] encode that
//! protocol; the [`EventProducer`]/[`EventProcessor`] adaptors wrap them
//! safely.

pub mod constants;
pub mod error;
pub mod event;
pub mod insights;
pub mod ring;

pub use error::{Result, SluiceError};
pub use event::{EventHandler, EventProcessor, EventProducer, EventTranslator, ProcessorHandle};
pub use ring::barrier::SequenceBarrier;
pub use ring::buffer::{EventFactory, RingBuffer};
pub use ring::claim::{ClaimMode, ClaimStrategy};
pub use ring::sequence::{
    minimum_sequence, Sequence, ALERTED, FIRST_SEQUENCE, INITIAL_SEQUENCE, TIMEOUT,
};
pub use ring::sequencer::Sequencer;
pub use ring::wait::{WaitMode, WaitStrategy};
