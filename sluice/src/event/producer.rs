//! Producer-side three-stage publish helper: claim, translate, publish.

use std::sync::Arc;

use crate::ring::claim::ClaimMode;
use crate::ring::sequencer::Sequencer;

/// Writes one event's worth of data into a claimed slot.
///
/// Called once per published sequence, on the producer thread, between
/// claim and publish. The slot holds whatever the previous lap left
/// there; the translator must overwrite every field it cares about.
pub trait EventTranslator<E> {
    fn translate_to(&self, sequence: i64, event: &mut E);
}

impl<E, F> EventTranslator<E> for F
where
    F: Fn(i64, &mut E),
{
    fn translate_to(&self, sequence: i64, event: &mut E) {
        self(sequence, event)
    }
}

/// Three-stage publishing adaptor over a shared sequencer.
///
/// In single-producer mode each translated slot is published as soon as
/// it is written, so consumers see progress inside a large batch. In
/// multi-producer mode the whole range is published at the end: each
/// slot needs its own availability flag, and flagging a slot before its
/// neighbours are written is fine because consumers only ever read the
/// contiguous published prefix.
pub struct EventProducer<E> {
    sequencer: Arc<Sequencer<E>>,
}

impl<E> EventProducer<E> {
    pub fn new(sequencer: Arc<Sequencer<E>>) -> Self {
        Self { sequencer }
    }

    /// Claim `batch_size` slots, translate each, publish.
    ///
    /// Blocks (cooperative yield) while the ring lacks capacity.
    /// Returns the last published sequence.
    pub fn publish_event(&self, translator: &dyn EventTranslator<E>, batch_size: i64) -> i64 {
        let last = self.sequencer.next_batch(batch_size);
        let first = last - batch_size + 1;

        match self.sequencer.claim_mode() {
            ClaimMode::SingleProducer => {
                for sequence in first..=last {
                    // Safety: sequence is claimed here and unpublished.
                    let slot = unsafe { self.sequencer.slot_mut(sequence) };
                    translator.translate_to(sequence, slot);
                    self.sequencer.publish(sequence);
                }
            }
            ClaimMode::MultiProducer => {
                for sequence in first..=last {
                    // Safety: sequence is claimed here and unpublished.
                    let slot = unsafe { self.sequencer.slot_mut(sequence) };
                    translator.translate_to(sequence, slot);
                }
                self.sequencer.publish_range(first, last);
            }
        }
        last
    }

    /// The sequencer this producer publishes into.
    pub fn sequencer(&self) -> &Arc<Sequencer<E>> {
        &self.sequencer
    }
}

impl<E> Clone for EventProducer<E> {
    fn clone(&self) -> Self {
        Self {
            sequencer: self.sequencer.clone(),
        }
    }
}
