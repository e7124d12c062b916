//! Error types and handling for the sluice library.

use thiserror::Error;

/// Result type alias for sluice operations.
pub type Result<T> = std::result::Result<T, SluiceError>;

/// Main error type for the sluice library.
///
/// Construction-time failures are the only fatal errors. Runtime
/// cancellation and timeout are carried as negative sequence sentinels
/// (see [`crate::ring::sequence`]) so the hot path never allocates.
#[derive(Error, Debug)]
pub enum SluiceError {
    /// Ring buffer capacity is not a positive power of two.
    #[error("invalid ring capacity {requested}: must be a positive power of two")]
    InvalidCapacity {
        /// The capacity the caller asked for.
        requested: usize,
    },

    /// A processor operation requires a running processor.
    #[error("event processor is not running")]
    NotRunning,

    /// A processor operation requires a stopped processor.
    #[error("event processor is already running")]
    AlreadyRunning,
}

impl SluiceError {
    /// Create a new invalid-capacity error.
    pub fn invalid_capacity(requested: usize) -> Self {
        Self::InvalidCapacity { requested }
    }

    /// Check if this error is recoverable by retrying later.
    ///
    /// Lifecycle races are recoverable (the processor reaches the desired
    /// state on its own); a bad capacity never is.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotRunning | Self::AlreadyRunning)
    }

    /// Check if this error was raised at construction time.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::InvalidCapacity { .. })
    }
}
