//! Unicast throughput demo - one producer, one consumer.
//!
//! Streams 1,000,000 sequence-stamped events through a 64k ring and
//! reports the drain rate.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use sluice::{
    ClaimMode, EventHandler, EventProcessor, EventProducer, Sequence, Sequencer, WaitMode,
};

const RING_SIZE: usize = 64 * 1024;
const EVENTS: i64 = 1_000_000;
const BATCH_SIZE: i64 = 1024;

#[derive(Default)]
struct ValueEvent {
    value: i64,
}

struct Summing {
    sum: i64,
    count: i64,
}

impl EventHandler<ValueEvent> for Summing {
    fn on_event(&mut self, _sequence: i64, event: &ValueEvent) {
        self.sum += event.value;
        self.count += 1;
    }

    fn on_shutdown(&mut self) {
        println!("consumer saw {} events, sum {}", self.count, self.sum);
    }
}

fn main() {
    let mut sequencer = Sequencer::<ValueEvent>::with_default(
        RING_SIZE,
        ClaimMode::SingleProducer,
        WaitMode::BusySpin,
    )
    .expect("ring size is a power of two");

    let barrier = sequencer.new_barrier(&[]);
    let progress = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let mut processor = EventProcessor::with_sequence(
        sequencer.clone(),
        barrier,
        Summing { sum: 0, count: 0 },
        progress.clone(),
    );
    let handle = processor.handle();
    let consumer = thread::spawn(move || processor.run());

    let producer = EventProducer::new(sequencer);
    let start = Instant::now();
    let mut published = 0i64;
    while published < EVENTS {
        let batch = BATCH_SIZE.min(EVENTS - published);
        producer.publish_event(&|seq: i64, event: &mut ValueEvent| event.value = seq, batch);
        published += batch;
    }

    while progress.get() < EVENTS - 1 {
        thread::yield_now();
    }
    let elapsed = start.elapsed();
    handle.halt();
    consumer.join().unwrap();

    let rate = (EVENTS as f64) / elapsed.as_secs_f64();
    println!("{EVENTS} events in {elapsed:?} ({rate:.0} events/sec)");
}
