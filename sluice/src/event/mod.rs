//! The event layer: user-facing producer and consumer adaptors around
//! the ring core.

pub mod processor;
pub mod producer;

pub use processor::{EventHandler, EventProcessor, ProcessorHandle};
pub use producer::{EventProducer, EventTranslator};
