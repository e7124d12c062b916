//! Core numeric constants shared by the ring machinery.

/// Cache line size for alignment (64 bytes on most CPUs).
pub const CACHE_LINE_SIZE: usize = 64;

/// Padded atomic footprint. Two cache lines, so the adjacent-line
/// spatial prefetcher on x86_64 cannot drag a neighbour along.
pub const PADDED_ATOMIC_SIZE: usize = 128;

/// Default ring buffer capacity (must be a power of 2).
pub const DEFAULT_CAPACITY: usize = 1024;

/// Spin iterations before the yielding wait strategy starts yielding.
pub const DEFAULT_RETRY_BUDGET: u32 = 200;

/// Sleep tick for the sleeping wait strategy, in microseconds.
pub const DEFAULT_SLEEP_MICROS: u64 = 1;
