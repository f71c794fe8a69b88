//! Reconstruction input preparation and engine orchestration.
//!
//! This module contains:
//! - ReconstructionInput: file groups for one engine invocation
//! - InputPartitioner: index-table mapping from batch to groups
//! - ReconstructionEngine: the external engine boundary
//! - ReconstructionOrchestrator: the dedicated single-run worker

pub mod engine;
pub mod input;
pub mod orchestrator;
pub mod partition;

// Re-export commonly used types
pub use engine::{CommandEngine, EngineError, ReconstructionEngine};
pub use input::ReconstructionInput;
pub use orchestrator::{OrchestratorPolicy, ReconstructionOrchestrator, ReconstructionOutcome};
pub use partition::InputPartitioner;
