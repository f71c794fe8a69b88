//! Frame persistence: the ordered write queue and the artifact writer.
//!
//! This module owns the durable side of a capture session:
//!
//! 1. **Pipeline**: single-worker ordered queue; `submit` never blocks the
//!    sensor callback, `finish` emits the session batch
//! 2. **Writer**: per-bundle artifact encoding and atomic file placement

pub mod pipeline;
pub mod writer;

// Re-export commonly used types
pub use pipeline::{PersistencePipeline, PipelineEvent};
pub use writer::{calibration_text, depth_text, OutputWriter, PersistError};
