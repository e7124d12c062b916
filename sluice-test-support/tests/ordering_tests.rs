//! Cross-thread ordering, visibility, and shutdown properties.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use sluice::{
    ClaimMode, EventProducer, Sequence, Sequencer, WaitMode, FIRST_SEQUENCE, TIMEOUT,
};
use sluice_test_support::{CapturingHandler, CheckingHandler, ConsumerRig, StubEvent};

fn translate(sequence: i64, slot: &mut StubEvent) {
    slot.value = sequence;
}

fn gated(
    capacity: usize,
    claim_mode: ClaimMode,
    wait_mode: WaitMode,
) -> (Arc<Sequencer<StubEvent>>, Arc<Sequence>) {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(capacity, claim_mode, wait_mode).unwrap();
    let gate = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(vec![gate.clone()]);
    (Arc::new(sequencer), gate)
}

/// Out-of-order multi-producer commits stay invisible until the prefix
/// is whole.
#[test]
fn test_out_of_order_publish_is_invisible_until_contiguous() {
    let (sequencer, _gate) = gated(8, ClaimMode::MultiProducer, WaitMode::BusySpin);
    let barrier = sequencer.new_barrier(&[]);

    // Reserve four slots up front, then commit them out of order.
    assert_eq!(sequencer.next_batch(4), 3);

    sequencer.publish(1);
    assert_eq!(barrier.wait_for(FIRST_SEQUENCE), FIRST_SEQUENCE - 1);
    sequencer.publish(3);
    assert_eq!(barrier.wait_for(FIRST_SEQUENCE), FIRST_SEQUENCE - 1);
    sequencer.publish(2);
    assert_eq!(barrier.wait_for(FIRST_SEQUENCE), FIRST_SEQUENCE - 1);

    sequencer.publish(0);
    assert_eq!(barrier.wait_for(FIRST_SEQUENCE), 3);
}

/// Heavy single-producer traffic over a tiny ring: every value survives
/// the wraps intact.
#[test]
fn test_wrapped_slots_always_hold_the_producer_write() {
    const EVENTS: i64 = 1000;
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(8, ClaimMode::SingleProducer, WaitMode::Yielding)
            .unwrap();
    let barrier = sequencer.new_barrier(&[]);
    let progress = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler, seen) = CapturingHandler::new();
    let rig = ConsumerRig::spawn(sequencer.clone(), barrier, handler, progress);

    let producer = EventProducer::new(sequencer);
    let publisher = thread::spawn(move || {
        for _ in 0..EVENTS {
            producer.publish_event(&|seq: i64, slot: &mut StubEvent| slot.value = seq * 3, 1);
        }
    });

    publisher.join().unwrap();
    rig.await_sequence(EVENTS - 1);
    rig.shutdown();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), EVENTS as usize);
    for (i, &(sequence, value)) in seen.iter().enumerate() {
        assert_eq!(sequence, i as i64);
        assert_eq!(value, sequence * 3);
    }
}

/// Three racing producers, one checking consumer, constant wrap
/// pressure from a small ring.
#[test]
fn test_contended_multi_producer_stream_stays_contiguous() {
    const PER_PRODUCER: i64 = 200;
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(8, ClaimMode::MultiProducer, WaitMode::Yielding)
            .unwrap();
    let barrier = sequencer.new_barrier(&[]);
    let progress = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler, violations, delivered) = CheckingHandler::new();
    let rig = ConsumerRig::spawn(sequencer.clone(), barrier, handler, progress);

    let producers: Vec<_> = (0..3)
        .map(|_| {
            let producer = EventProducer::new(sequencer.clone());
            thread::spawn(move || {
                for _ in 0..PER_PRODUCER {
                    producer.publish_event(&translate, 1);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    rig.await_sequence(3 * PER_PRODUCER - 1);
    rig.shutdown();

    assert_eq!(violations.load(Ordering::Relaxed), 0);
    assert_eq!(delivered.load(Ordering::Relaxed), 3 * PER_PRODUCER);
}

/// Every wait mode drains the same unicast graph and shuts down cleanly.
#[test]
fn test_every_wait_mode_drains_and_halts() {
    for wait_mode in [
        WaitMode::BusySpin,
        WaitMode::Yielding,
        WaitMode::Sleeping,
        WaitMode::Blocking,
    ] {
        let mut sequencer =
            Sequencer::<StubEvent>::with_default(8, ClaimMode::SingleProducer, wait_mode).unwrap();
        let barrier = sequencer.new_barrier(&[]);
        let progress = Arc::new(Sequence::default());
        sequencer.set_gating_sequences(vec![progress.clone()]);
        let sequencer = Arc::new(sequencer);

        let (handler, seen) = CapturingHandler::new();
        let rig = ConsumerRig::spawn(sequencer.clone(), barrier, handler, progress);

        let producer = EventProducer::new(sequencer);
        producer.publish_event(&translate, 5);
        rig.await_sequence(4);
        rig.shutdown();

        assert_eq!(seen.lock().unwrap().len(), 5, "wait mode {wait_mode:?}");
    }
}

/// A timed wait with no producer activity expires; the same wait with a
/// publish inside the window returns the published sequence.
#[test]
fn test_timed_barrier_wait_expires_then_succeeds() {
    let (sequencer, _gate) = gated(8, ClaimMode::SingleProducer, WaitMode::Blocking);
    let barrier = sequencer.new_barrier(&[]);

    assert_eq!(
        barrier.wait_for_timeout(FIRST_SEQUENCE, Duration::from_micros(1)),
        TIMEOUT
    );

    let publisher = {
        let sequencer = sequencer.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let seq = sequencer.next();
            sequencer.publish(seq);
        })
    };
    assert_eq!(
        barrier.wait_for_timeout(FIRST_SEQUENCE, Duration::from_secs(1)),
        FIRST_SEQUENCE
    );
    publisher.join().unwrap();
}
