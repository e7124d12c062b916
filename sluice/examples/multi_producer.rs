//! Multi-producer demo - three producers racing into one consumer.
//!
//! Each producer publishes 100,000 events; the consumer checks that the
//! merged stream arrives gap-free and in sequence order.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use sluice::{
    ClaimMode, EventHandler, EventProcessor, EventProducer, Sequence, Sequencer, WaitMode,
};

const RING_SIZE: usize = 8 * 1024;
const PRODUCERS: usize = 3;
const EVENTS_PER_PRODUCER: i64 = 100_000;

#[derive(Default)]
struct ValueEvent {
    value: i64,
}

struct GapCheck {
    next_expected: i64,
    gaps: u64,
}

impl EventHandler<ValueEvent> for GapCheck {
    fn on_event(&mut self, sequence: i64, event: &ValueEvent) {
        if sequence != self.next_expected || event.value != sequence {
            self.gaps += 1;
        }
        self.next_expected = sequence + 1;
    }

    fn on_shutdown(&mut self) {
        println!(
            "consumer processed {} events, {} ordering violations",
            self.next_expected, self.gaps
        );
    }
}

fn main() {
    let total = (PRODUCERS as i64) * EVENTS_PER_PRODUCER;

    let mut sequencer = Sequencer::<ValueEvent>::with_default(
        RING_SIZE,
        ClaimMode::MultiProducer,
        WaitMode::Yielding,
    )
    .expect("ring size is a power of two");

    let barrier = sequencer.new_barrier(&[]);
    let progress = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(vec![progress.clone()]);
    let sequencer = Arc::new(sequencer);

    let mut processor = EventProcessor::with_sequence(
        sequencer.clone(),
        barrier,
        GapCheck {
            next_expected: 0,
            gaps: 0,
        },
        progress.clone(),
    );
    let handle = processor.handle();
    let consumer = thread::spawn(move || processor.run());

    let start = Instant::now();
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let producer = EventProducer::new(sequencer.clone());
            thread::spawn(move || {
                for _ in 0..EVENTS_PER_PRODUCER {
                    producer
                        .publish_event(&|seq: i64, event: &mut ValueEvent| event.value = seq, 1);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    while progress.get() < total - 1 {
        thread::yield_now();
    }
    let elapsed = start.elapsed();
    handle.halt();
    consumer.join().unwrap();

    let rate = (total as f64) / elapsed.as_secs_f64();
    println!("{total} events from {PRODUCERS} producers in {elapsed:?} ({rate:.0} events/sec)");
}
