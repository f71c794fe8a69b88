//! Reconstruction Integration Tests
//!
//! Full chain over real files: persisted captures -> partitioner ->
//! orchestrator -> outcome, including consumed-file cleanup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use footscan::config::{PartitionTables, SOLE_CAPTURE_INDEX};
use footscan::domain::PersistedOutput;
use footscan::reconstruction::{
    EngineError, InputPartitioner, OrchestratorPolicy, ReconstructionEngine, ReconstructionInput,
    ReconstructionOrchestrator, ReconstructionOutcome,
};
use tempfile::TempDir;

/// Engine that records the groups it received and writes the model file
struct RecordingEngine {
    succeed: bool,
    seen: std::sync::Mutex<Option<(usize, usize, usize)>>,
}

#[async_trait]
impl ReconstructionEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn reconstruct(
        &self,
        input: &ReconstructionInput,
        output_path: &Path,
    ) -> Result<PathBuf, EngineError> {
        if let ReconstructionInput::Paths {
            lateral_a,
            lateral_b,
            sole,
        } = input
        {
            *self.seen.lock().unwrap() = Some((lateral_a.len(), lateral_b.len(), sole.len()));
        }

        if self.succeed {
            std::fs::write(output_path, b"obj")?;
            Ok(output_path.to_path_buf())
        } else {
            Err(EngineError::Other("synthetic failure".to_string()))
        }
    }
}

fn write_output(dir: &Path, index: i32, stem: &str) -> PersistedOutput {
    let image_path = dir.join(format!("original_{}.png", stem));
    let depth_data_path = dir.join(format!("depth_logs_{}.txt", stem));
    let calibration_path = dir.join(format!("depth_calibration_{}.txt", stem));
    std::fs::write(&image_path, b"png").unwrap();
    std::fs::write(&depth_data_path, "1,2\n").unwrap();
    std::fs::write(&calibration_path, "intrinsics:\n").unwrap();

    PersistedOutput {
        index,
        image_path,
        depth_data_path,
        calibration_path: Some(calibration_path),
    }
}

fn capture_set(dir: &Path) -> Vec<PersistedOutput> {
    let mut outputs: Vec<PersistedOutput> = (0..10)
        .map(|i| write_output(dir, i, &i.to_string()))
        .collect();
    outputs.push(write_output(dir, SOLE_CAPTURE_INDEX, "sole-a"));
    outputs.push(write_output(dir, SOLE_CAPTURE_INDEX, "sole-b"));
    outputs
}

#[tokio::test]
async fn test_partitioned_batch_reaches_engine_grouped() {
    let temp = TempDir::new().unwrap();
    let outputs = capture_set(temp.path());

    let input = InputPartitioner::new(PartitionTables::default()).partition(&outputs);

    let engine = Arc::new(RecordingEngine {
        succeed: true,
        seen: std::sync::Mutex::new(None),
    });
    let (orchestrator, mut outcomes) =
        ReconstructionOrchestrator::spawn(engine.clone(), OrchestratorPolicy::default());

    let model_path = temp.path().join("foot.obj");
    orchestrator.run(input, model_path.clone());

    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(outcome, ReconstructionOutcome::Success { model_path });

    // Default tables: A = [0..4] + shared 5, B = [6..9] + shared 5
    let seen = engine.seen.lock().unwrap().unwrap();
    assert_eq!(seen, (6, 5, 2));

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_success_with_cleanup_removes_consumed_files() {
    let temp = TempDir::new().unwrap();
    let outputs = capture_set(temp.path());
    let input = InputPartitioner::new(PartitionTables::default()).partition(&outputs);

    let engine = Arc::new(RecordingEngine {
        succeed: true,
        seen: std::sync::Mutex::new(None),
    });
    let policy = OrchestratorPolicy {
        fallback_model: None,
        cleanup_inputs: true,
    };
    let (orchestrator, mut outcomes) = ReconstructionOrchestrator::spawn(engine, policy);

    let model_path = temp.path().join("foot.obj");
    orchestrator.run(input, model_path.clone());
    let outcome = outcomes.recv().await.unwrap();
    assert!(matches!(outcome, ReconstructionOutcome::Success { .. }));

    // Every consumed capture file is gone; the model stays
    for output in &outputs {
        for file in output.files() {
            assert!(!file.exists(), "{} should have been removed", file.display());
        }
    }
    assert!(model_path.exists());

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_plain_failure_keeps_capture_files() {
    let temp = TempDir::new().unwrap();
    let outputs = capture_set(temp.path());
    let input = InputPartitioner::new(PartitionTables::default()).partition(&outputs);

    let engine = Arc::new(RecordingEngine {
        succeed: false,
        seen: std::sync::Mutex::new(None),
    });
    let policy = OrchestratorPolicy {
        fallback_model: None,
        cleanup_inputs: true,
    };
    let (orchestrator, mut outcomes) = ReconstructionOrchestrator::spawn(engine, policy);

    orchestrator.run(input, temp.path().join("foot.obj"));
    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(outcome, ReconstructionOutcome::Failed { fallback: None });

    // No fallback applied, so the captures survive for a retry
    for output in &outputs {
        assert!(output.image_path.exists());
    }

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_applied_fallback_consumes_capture_files() {
    let temp = TempDir::new().unwrap();
    let outputs = capture_set(temp.path());
    let input = InputPartitioner::new(PartitionTables::default()).partition(&outputs);

    let fallback = temp.path().join("demo-foot.obj");
    std::fs::write(&fallback, b"demo").unwrap();

    let engine = Arc::new(RecordingEngine {
        succeed: false,
        seen: std::sync::Mutex::new(None),
    });
    let policy = OrchestratorPolicy {
        fallback_model: Some(fallback.clone()),
        cleanup_inputs: true,
    };
    let (orchestrator, mut outcomes) = ReconstructionOrchestrator::spawn(engine, policy);

    orchestrator.run(input, temp.path().join("foot.obj"));
    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(
        outcome,
        ReconstructionOutcome::Failed {
            fallback: Some(fallback.clone())
        }
    );

    // Degraded mode consumed the captures; the fallback asset survives
    for output in &outputs {
        assert!(!output.image_path.exists());
    }
    assert!(fallback.exists());

    orchestrator.shutdown().await;
}
