//! footscan - Guided multi-view capture orchestrator for 3D foot scanning
//!
//! Drives a guided capture session: a ring of target camera poses is
//! generated around a pivot, live sensor poses are matched against those
//! targets, each captured frame is persisted through a strictly ordered
//! asynchronous pipeline, and the persisted files are partitioned into the
//! input groups a downstream reconstruction engine consumes.
//!
//! # Architecture
//!
//! Components communicate by message passing, never shared locks:
//! - Sensor callbacks run inline classification and a non-blocking enqueue
//! - One dedicated worker owns the persistence queue (writes in submission
//!   order, batch barrier on finish)
//! - One dedicated worker owns the reconstruction queue (one run at a time)
//!
//! # Modules
//!
//! - `capture`: pose ring, live-pose tracking, frame classification, session glue
//! - `persist`: the ordered persistence pipeline and artifact writer
//! - `reconstruction`: input partitioning and engine orchestration
//! - `dataset`: pre-captured dataset loading (simulator path)
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Inspect the target ring
//! footscan ring --count 10 --offset 0.5
//!
//! # Partition a captured dataset
//! footscan dataset --dir ./captures
//!
//! # Run reconstruction over it
//! footscan reconstruct --dir ./captures --output ./foot.obj
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod persist;
pub mod reconstruction;

// Re-export main types at crate root for convenience
pub use capture::{CaptureMode, CaptureSession, CaptureTracker, FrameClassifier, PoseRing};
pub use capture::{CaptureError, SensorCapabilities, SessionEvent};
pub use domain::{ColorImage, DepthMap, OutputBatch, PersistedOutput, RawFrameBundle, SensorFrame, TargetPose};
pub use persist::{OutputWriter, PersistencePipeline, PipelineEvent};
pub use reconstruction::{
    InputPartitioner, ReconstructionEngine, ReconstructionInput, ReconstructionOrchestrator,
    ReconstructionOutcome,
};
