//! Domain types for the capture orchestrator.
//!
//! This module contains the core data structures:
//! - Poses: target poses on the capture ring
//! - Frames: raw sensor frames and capture bundles
//! - Outputs: persisted per-frame artifacts and session batches

pub mod frame;
pub mod output;
pub mod pose;

// Re-export commonly used types
pub use frame::{ColorImage, DepthMap, RawFrameBundle, SensorFrame};
pub use output::{OutputBatch, PersistedOutput};
pub use pose::TargetPose;
