//! Wait strategies for threads blocked on a sequence.
//!
//! Each strategy decides how a waiter burns time until the visibility
//! source reaches the requested sequence. All four share one contract and
//! differ only in the latency/CPU trade:
//!
//! | Strategy | Latency  | CPU      | Use case                          |
//! |----------|----------|----------|-----------------------------------|
//! | BusySpin | lowest   | highest  | isolated cores, sub-µs targets    |
//! | Yielding | low      | high     | shared cores, latency-sensitive   |
//! | Sleeping | moderate | low      | bursty traffic, quiet periods     |
//! | Blocking | highest  | lowest   | CPU-starved or many-consumer hosts|
//!
//! The visibility source is `min(dependents)` when the waiter has
//! upstream consumers, otherwise the producer cursor. Waits return the
//! observed source value (which may exceed the request), or [`ALERTED`] /
//! [`TIMEOUT`] as negative out-of-band signals.

use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::constants::{DEFAULT_RETRY_BUDGET, DEFAULT_SLEEP_MICROS};
use crate::insights;
use crate::ring::sequence::{minimum_sequence, Sequence, ALERTED, TIMEOUT};

/// Wait strategy selection, chosen once at sequencer construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Pure spin loop. Lowest latency, saturates a core.
    BusySpin,
    /// Spin for a budget, then yield each further iteration.
    Yielding,
    /// Spin, then yield, then sleep in 1 µs ticks.
    Sleeping,
    /// Mutex + condvar. Lowest CPU, highest latency; producers must
    /// signal after every publish.
    Blocking,
}

/// The visibility source for a waiter: upstream consumers when present,
/// otherwise the producer cursor.
#[inline(always)]
fn visible_sequence(cursor: &Sequence, dependents: &[Arc<Sequence>]) -> i64 {
    if dependents.is_empty() {
        cursor.get()
    } else {
        minimum_sequence(dependents)
    }
}

/// Shared poll loop for the non-blocking strategies. `backoff` is called
/// once per failed probe; the deadline is checked after each probe, never
/// mid-slice.
fn poll_until(
    sequence: i64,
    cursor: &Sequence,
    dependents: &[Arc<Sequence>],
    alerted: &AtomicBool,
    deadline: Option<Instant>,
    mut backoff: impl FnMut(),
) -> i64 {
    loop {
        let available = visible_sequence(cursor, dependents);
        if available >= sequence {
            return available;
        }
        if alerted.load(Ordering::Acquire) {
            insights::alert_raised(sequence);
            return ALERTED;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                insights::wait_timed_out(sequence);
                return TIMEOUT;
            }
        }
        backoff();
    }
}

/// Busy spin wait strategy - lowest latency, highest CPU usage.
///
/// Continuously polls the visibility source in a tight loop. Strongly
/// recommended to pin waiters on isolated cores; a spinning consumer on a
/// shared core starves whatever it shares with.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusySpinWait;

impl BusySpinWait {
    pub fn new() -> Self {
        Self
    }

    fn wait(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> i64 {
        poll_until(sequence, cursor, dependents, alerted, deadline, hint::spin_loop)
    }
}

/// Yielding wait strategy - spin for a fixed budget, then yield.
///
/// A good compromise when waiters share cores with other work.
#[derive(Debug, Clone, Copy)]
pub struct YieldingWait {
    spin_tries: u32,
}

impl YieldingWait {
    /// `spin_tries`: iterations of pure spinning before the first yield.
    pub fn new(spin_tries: u32) -> Self {
        Self { spin_tries }
    }

    fn wait(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> i64 {
        let mut counter = self.spin_tries;
        poll_until(sequence, cursor, dependents, alerted, deadline, || {
            if counter > 0 {
                counter -= 1;
                hint::spin_loop();
            } else {
                thread::yield_now();
            }
        })
    }
}

impl Default for YieldingWait {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BUDGET)
    }
}

/// Sleeping wait strategy - three-phase back-off.
///
/// Spins for the first half of the budget, yields for the second half,
/// then sleeps in short fixed ticks. Suits burst traffic with quiet
/// periods where latency is not critical.
#[derive(Debug, Clone, Copy)]
pub struct SleepingWait {
    retry_budget: u32,
    sleep_tick: Duration,
}

impl SleepingWait {
    pub fn new(retry_budget: u32, sleep_tick: Duration) -> Self {
        Self {
            retry_budget,
            sleep_tick,
        }
    }

    fn wait(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> i64 {
        let mut counter = self.retry_budget;
        let half = self.retry_budget / 2;
        poll_until(sequence, cursor, dependents, alerted, deadline, || {
            if counter > half {
                counter -= 1;
                hint::spin_loop();
            } else if counter > 0 {
                counter -= 1;
                thread::yield_now();
            } else {
                thread::sleep(self.sleep_tick);
            }
        })
    }
}

impl Default for SleepingWait {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BUDGET, Duration::from_micros(DEFAULT_SLEEP_MICROS))
    }
}

/// Blocking wait strategy - mutex + condition variable.
///
/// Two-phase: park on the condvar until the *cursor* passes the request,
/// then busy-wait on the dependents (they advance quickly once the cursor
/// does). The sequencer signals after every publish, and shutdown must
/// raise the alert *and* signal, or a waiter that parked just before the
/// flag flipped stays parked.
#[derive(Default)]
pub struct BlockingWait {
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl BlockingWait {
    pub fn new() -> Self {
        Self::default()
    }

    fn wait(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> i64 {
        let mut available = cursor.get();
        if available < sequence {
            let mut guard = self.mutex.lock();
            loop {
                available = cursor.get();
                if available >= sequence {
                    break;
                }
                if alerted.load(Ordering::Acquire) {
                    insights::alert_raised(sequence);
                    return ALERTED;
                }
                match deadline {
                    None => self.condvar.wait(&mut guard),
                    Some(deadline) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining.is_zero()
                            || self.condvar.wait_for(&mut guard, remaining).timed_out()
                        {
                            // One last look: the publish may have raced the
                            // deadline.
                            available = cursor.get();
                            if available >= sequence {
                                break;
                            }
                            insights::wait_timed_out(sequence);
                            return TIMEOUT;
                        }
                    }
                }
            }
        }

        if dependents.is_empty() {
            return available;
        }
        poll_until(sequence, cursor, dependents, alerted, deadline, hint::spin_loop)
    }

    fn signal_all(&self) {
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }
}

/// Runtime wait strategy with inline variant dispatch.
///
/// An enum rather than a trait object keeps `wait_for` monomorphic on the
/// hot path; the match compiles to a jump, not a vtable load.
pub enum WaitStrategy {
    BusySpin(BusySpinWait),
    Yielding(YieldingWait),
    Sleeping(SleepingWait),
    Blocking(BlockingWait),
}

impl WaitStrategy {
    /// Build the strategy for a mode with its default tuning.
    pub fn new(mode: WaitMode) -> Self {
        match mode {
            WaitMode::BusySpin => Self::BusySpin(BusySpinWait::new()),
            WaitMode::Yielding => Self::Yielding(YieldingWait::default()),
            WaitMode::Sleeping => Self::Sleeping(SleepingWait::default()),
            WaitMode::Blocking => Self::Blocking(BlockingWait::new()),
        }
    }

    /// Block until the visibility source reaches `sequence`.
    ///
    /// Returns the observed source value (`>= sequence`), or [`ALERTED`]
    /// when the alert flag flips first.
    pub fn wait_for(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
    ) -> i64 {
        match self {
            Self::BusySpin(w) => w.wait(sequence, cursor, dependents, alerted, None),
            Self::Yielding(w) => w.wait(sequence, cursor, dependents, alerted, None),
            Self::Sleeping(w) => w.wait(sequence, cursor, dependents, alerted, None),
            Self::Blocking(w) => w.wait(sequence, cursor, dependents, alerted, None),
        }
    }

    /// As [`wait_for`](Self::wait_for), plus [`TIMEOUT`] once `timeout`
    /// has elapsed on the monotonic clock.
    ///
    /// The deadline is checked between back-off slices, so the effective
    /// granularity is bounded by the strategy's slice (up to one sleep
    /// tick for Sleeping, one condvar wake for Blocking).
    pub fn wait_for_timeout(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        timeout: Duration,
    ) -> i64 {
        let deadline = Some(Instant::now() + timeout);
        match self {
            Self::BusySpin(w) => w.wait(sequence, cursor, dependents, alerted, deadline),
            Self::Yielding(w) => w.wait(sequence, cursor, dependents, alerted, deadline),
            Self::Sleeping(w) => w.wait(sequence, cursor, dependents, alerted, deadline),
            Self::Blocking(w) => w.wait(sequence, cursor, dependents, alerted, deadline),
        }
    }

    /// Wake blocked waiters. No-op for every strategy except Blocking.
    #[inline]
    pub fn signal_all_when_blocking(&self) {
        if let Self::Blocking(w) = self {
            w.signal_all();
        }
    }
}

impl std::fmt::Debug for WaitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BusySpin(_) => "BusySpin",
            Self::Yielding(_) => "Yielding",
            Self::Sleeping(_) => "Sleeping",
            Self::Blocking(_) => "Blocking",
        };
        f.debug_tuple("WaitStrategy").field(&name).finish()
    }
}
