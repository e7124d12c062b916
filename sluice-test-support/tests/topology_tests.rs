//! End-to-end consumer-graph topologies.
//!
//! Each test wires a full producer/consumer graph over a small ring,
//! drains a known event count, and checks every consumer's progress and
//! every delivered payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sluice::{ClaimMode, EventProducer, Sequence, Sequencer, WaitMode, INITIAL_SEQUENCE};
use sluice_test_support::{CapturingHandler, CheckingHandler, ConsumerRig, StubEvent};

const CAPACITY: usize = 8;

fn translate(sequence: i64, slot: &mut StubEvent) {
    slot.value = sequence;
}

fn new_progress() -> Arc<Sequence> {
    Arc::new(Sequence::default())
}

/// 1P-1C unicast: a single consumer gates the producer directly.
#[test]
fn test_unicast_drains_batches_across_a_wrap() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(CAPACITY, ClaimMode::SingleProducer, WaitMode::BusySpin)
            .unwrap();
    let barrier = sequencer.new_barrier(&[]);
    let progress = new_progress();
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler, seen) = CapturingHandler::new();
    let rig = ConsumerRig::spawn(sequencer.clone(), barrier, handler, progress);
    let producer = EventProducer::new(sequencer);

    // 1 + 3 + 5 events: the last batch wraps the 8-slot ring.
    producer.publish_event(&translate, 1);
    rig.await_sequence(0);
    producer.publish_event(&translate, 3);
    rig.await_sequence(3);
    producer.publish_event(&translate, 5);
    rig.await_sequence(8);
    rig.shutdown();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 9);
    for (i, &(sequence, value)) in seen.iter().enumerate() {
        assert_eq!(sequence, i as i64);
        assert_eq!(value, i as i64);
    }
}

/// 1P-3C pipeline: A → B → C, only C gates the producer.
#[test]
fn test_pipeline_chain_drains_in_lockstep() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(CAPACITY, ClaimMode::SingleProducer, WaitMode::BusySpin)
            .unwrap();

    let barrier_a = sequencer.new_barrier(&[]);
    let progress_a = new_progress();
    let barrier_b = sequencer.new_barrier(&[progress_a.clone()]);
    let progress_b = new_progress();
    let barrier_c = sequencer.new_barrier(&[progress_b.clone()]);
    let progress_c = new_progress();

    sequencer.set_gating_sequences(vec![progress_c.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler_a, _) = CapturingHandler::new();
    let (handler_b, _) = CapturingHandler::new();
    let (handler_c, seen_c) = CapturingHandler::new();
    let rigs = [
        ConsumerRig::spawn(sequencer.clone(), barrier_a, handler_a, progress_a),
        ConsumerRig::spawn(sequencer.clone(), barrier_b, handler_b, progress_b),
        ConsumerRig::spawn(sequencer.clone(), barrier_c, handler_c, progress_c),
    ];
    let producer = EventProducer::new(sequencer);

    let mut expected = INITIAL_SEQUENCE;
    for batch in [1, 3, 5, 8] {
        expected += batch;
        producer.publish_event(&translate, batch);
        for rig in &rigs {
            rig.await_sequence(expected);
            assert_eq!(rig.progress().get(), expected);
        }
    }

    for rig in rigs {
        rig.shutdown();
    }
    assert_eq!(seen_c.lock().unwrap().len(), 17);
}

/// 1P-3C multicast: three independent consumers, all gating.
#[test]
fn test_multicast_delivers_every_event_to_every_consumer() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(CAPACITY, ClaimMode::SingleProducer, WaitMode::BusySpin)
            .unwrap();

    let mut rigs = Vec::new();
    let mut seens = Vec::new();
    let mut gating = Vec::new();
    let mut pending = Vec::new();
    for _ in 0..3 {
        let barrier = sequencer.new_barrier(&[]);
        let progress = new_progress();
        gating.push(progress.clone());
        pending.push((barrier, progress));
    }
    sequencer.set_gating_sequences(gating);
    let sequencer = Arc::new(sequencer);

    for (barrier, progress) in pending {
        let (handler, seen) = CapturingHandler::new();
        seens.push(seen);
        rigs.push(ConsumerRig::spawn(
            sequencer.clone(),
            barrier,
            handler,
            progress,
        ));
    }
    let producer = EventProducer::new(sequencer);

    let mut expected = INITIAL_SEQUENCE;
    for batch in [1, 3, 5, 8] {
        expected += batch;
        producer.publish_event(&translate, batch);
        for rig in &rigs {
            rig.await_sequence(expected);
            assert_eq!(rig.progress().get(), expected);
        }
    }

    for rig in rigs {
        rig.shutdown();
    }
    for seen in seens {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 17);
        assert!(seen.iter().enumerate().all(|(i, &(s, v))| {
            s == i as i64 && v == i as i64
        }));
    }
}

/// 1P-3C diamond: A and B fan out in parallel, C joins on both.
#[test]
fn test_diamond_join_waits_for_both_branches() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(CAPACITY, ClaimMode::SingleProducer, WaitMode::BusySpin)
            .unwrap();

    let barrier_a = sequencer.new_barrier(&[]);
    let progress_a = new_progress();
    let barrier_b = sequencer.new_barrier(&[]);
    let progress_b = new_progress();
    let barrier_c = sequencer.new_barrier(&[progress_a.clone(), progress_b.clone()]);
    let progress_c = new_progress();

    sequencer.set_gating_sequences(vec![progress_c.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler_a, _) = CapturingHandler::new();
    let (handler_b, _) = CapturingHandler::new();
    let (handler_c, seen_c) = CapturingHandler::new();
    let rigs = [
        ConsumerRig::spawn(sequencer.clone(), barrier_a, handler_a, progress_a),
        ConsumerRig::spawn(sequencer.clone(), barrier_b, handler_b, progress_b),
        ConsumerRig::spawn(sequencer.clone(), barrier_c, handler_c, progress_c),
    ];
    let producer = EventProducer::new(sequencer);

    let mut expected = INITIAL_SEQUENCE;
    for batch in [1, 3, 5, 8] {
        expected += batch;
        producer.publish_event(&translate, batch);
        for rig in &rigs {
            rig.await_sequence(expected);
            assert_eq!(rig.progress().get(), expected);
        }
    }

    for rig in rigs {
        rig.shutdown();
    }
    assert_eq!(seen_c.lock().unwrap().len(), 17);
}

/// 3P-1C: three producer threads racing into one multi-producer ring.
#[test]
fn test_three_producers_one_consumer_single_events() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(CAPACITY, ClaimMode::MultiProducer, WaitMode::BusySpin)
            .unwrap();
    let barrier = sequencer.new_barrier(&[]);
    let progress = new_progress();
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler, seen) = CapturingHandler::new();
    let rig = ConsumerRig::spawn(sequencer.clone(), barrier, handler, progress);

    let producers: Vec<_> = (0..3)
        .map(|_| {
            let producer = EventProducer::new(sequencer.clone());
            thread::spawn(move || {
                producer.publish_event(&translate, 1);
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    rig.await_sequence(2);
    rig.shutdown();

    let seen = seen.lock().unwrap();
    // Exactly once each, in sequence order, no gaps.
    assert_eq!(*seen, vec![(0, 0), (1, 1), (2, 2)]);
}

/// 3P-1C with mixed batch sizes per producer.
#[test]
fn test_three_producers_one_consumer_mixed_batches() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(CAPACITY, ClaimMode::MultiProducer, WaitMode::BusySpin)
            .unwrap();
    let barrier = sequencer.new_barrier(&[]);
    let progress = new_progress();
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let (handler, violations, delivered) = CheckingHandler::new();
    let rig = ConsumerRig::spawn(sequencer.clone(), barrier, handler, progress);

    let producers: Vec<_> = [1i64, 3, 5]
        .into_iter()
        .map(|batch| {
            let producer = EventProducer::new(sequencer.clone());
            thread::spawn(move || {
                producer.publish_event(&translate, batch);
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    rig.await_sequence(8);
    rig.shutdown();

    assert_eq!(violations.load(Ordering::Relaxed), 0);
    assert_eq!(delivered.load(Ordering::Relaxed), 9);
}

/// A full 4-slot ring stalls the producer until the gate moves.
#[test]
fn test_back_pressure_releases_on_consumer_advance() {
    let mut sequencer =
        Sequencer::<StubEvent>::with_default(4, ClaimMode::SingleProducer, WaitMode::BusySpin)
            .unwrap();
    let gate = new_progress();
    sequencer.set_gating_sequences(vec![gate.clone()]);
    let sequencer = Arc::new(sequencer);

    for _ in 0..4 {
        let seq = sequencer.next();
        sequencer.publish(seq);
    }
    assert_eq!(sequencer.cursor(), 3);

    let completed = Arc::new(AtomicBool::new(false));
    let publisher = {
        let sequencer = sequencer.clone();
        let completed = completed.clone();
        thread::spawn(move || {
            let seq = sequencer.next();
            sequencer.publish(seq);
            completed.store(true, Ordering::Release);
        })
    };

    thread::sleep(Duration::from_millis(20));
    assert!(!completed.load(Ordering::Acquire));
    assert_eq!(sequencer.cursor(), 3);

    gate.set(0);
    publisher.join().unwrap();
    assert!(completed.load(Ordering::Acquire));
    assert_eq!(sequencer.cursor(), 4);
}
