//! Capture orchestration: target generation, matching, classification.
//!
//! This module contains:
//! - PoseRing: target poses on a circle around the pivot
//! - CaptureTracker: pending-target bookkeeping and live-pose matching
//! - FrameClassifier: per-frame capture decisions (ring and free modes)
//! - CaptureSession: glue wiring the above into the persistence pipeline

pub mod classifier;
pub mod ring;
pub mod session;
pub mod tracker;

// Re-export commonly used types
pub use classifier::{CaptureMode, FrameClassifier};
pub use ring::PoseRing;
pub use session::{CaptureError, CaptureSession, SensorCapabilities, SessionEvent};
pub use tracker::CaptureTracker;
