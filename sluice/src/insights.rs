//! Insights - observability shims for sluice.
//!
//! Every function here compiles to nothing unless the `tracing` cargo
//! feature is enabled, so the hot paths carry zero instrumentation cost
//! by default.
//!
//! # Usage
//!
//! ```toml
//! sluice = { version = "0.1", features = ["tracing"] }
//! ```
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```

/// Record a producer stalled on the wrap point waiting for gating consumers.
#[cfg(feature = "tracing")]
#[inline]
pub fn producer_blocked(wrap_point: i64, min_gating: i64) {
    tracing::trace!(wrap_point, min_gating, "producer waiting on gating sequences");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn producer_blocked(_wrap_point: i64, _min_gating: i64) {}

/// Record a waiter observing the alert flag.
#[cfg(feature = "tracing")]
#[inline]
pub fn alert_raised(waiting_on: i64) {
    tracing::debug!(waiting_on, "wait aborted by alert");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn alert_raised(_waiting_on: i64) {}

/// Record a timed wait expiring without the sequence becoming visible.
#[cfg(feature = "tracing")]
#[inline]
pub fn wait_timed_out(waiting_on: i64) {
    tracing::debug!(waiting_on, "wait timed out");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn wait_timed_out(_waiting_on: i64) {}

/// Record an event processor entering its run loop.
#[cfg(feature = "tracing")]
#[inline]
pub fn processor_started() {
    tracing::debug!("event processor started");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn processor_started() {}

/// Record an event processor leaving its run loop.
#[cfg(feature = "tracing")]
#[inline]
pub fn processor_shutdown(last_sequence: i64) {
    tracing::debug!(last_sequence, "event processor shut down");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn processor_shutdown(_last_sequence: i64) {}
