//! The ring core: sequence counters, slot storage, claim and wait
//! strategies, barriers, and the sequencer facade that ties them
//! together.

pub mod barrier;
pub mod buffer;
pub mod claim;
pub mod sequence;
pub mod sequencer;
pub mod wait;

pub use barrier::SequenceBarrier;
pub use buffer::{EventFactory, RingBuffer};
pub use claim::{ClaimMode, ClaimStrategy};
pub use sequence::{minimum_sequence, Sequence};
pub use sequencer::Sequencer;
pub use wait::{WaitMode, WaitStrategy};
