//! Reconstruction orchestration.
//!
//! Owns the dedicated reconstruction worker: run requests queue up and
//! execute one at a time, never concurrently. Outcomes — success, or
//! failure with an optional pre-canned fallback — flow back as events.
//! Once a run has consumed the capture files (success or applied
//! fallback), they are removed from storage.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::engine::ReconstructionEngine;
use super::input::ReconstructionInput;

/// Result of one reconstruction run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconstructionOutcome {
    /// The engine produced a model at this path
    Success { model_path: PathBuf },

    /// The engine failed; `fallback` carries the pre-canned asset if the
    /// caller opted into degraded mode
    Failed { fallback: Option<PathBuf> },
}

struct RunRequest {
    input: ReconstructionInput,
    output_path: PathBuf,
}

/// Degraded-mode and cleanup policy for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorPolicy {
    /// Asset reported on failure instead of nothing (opt-in)
    pub fallback_model: Option<PathBuf>,

    /// Remove consumed capture files after success or applied fallback
    pub cleanup_inputs: bool,
}

/// Single-worker queue around the reconstruction engine.
pub struct ReconstructionOrchestrator {
    run_tx: mpsc::UnboundedSender<RunRequest>,
    worker: JoinHandle<()>,
}

impl ReconstructionOrchestrator {
    /// Spawn the worker. Must be called within a tokio runtime.
    pub fn spawn(
        engine: Arc<dyn ReconstructionEngine>,
        policy: OrchestratorPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<ReconstructionOutcome>) {
        let (run_tx, run_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(run_worker(engine, policy, run_rx, outcome_tx));

        (Self { run_tx, worker }, outcome_rx)
    }

    /// Queue one reconstruction run; at most one executes at a time
    pub fn run(&self, input: ReconstructionInput, output_path: PathBuf) {
        let request = RunRequest { input, output_path };
        if self.run_tx.send(request).is_err() {
            warn!("reconstruction queue closed; run request dropped");
        }
    }

    /// Close the queue and wait for queued runs to complete
    pub async fn shutdown(self) {
        let Self { run_tx, worker } = self;
        drop(run_tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "reconstruction worker did not shut down cleanly");
        }
    }
}

async fn run_worker(
    engine: Arc<dyn ReconstructionEngine>,
    policy: OrchestratorPolicy,
    mut run_rx: mpsc::UnboundedReceiver<RunRequest>,
    outcome_tx: mpsc::UnboundedSender<ReconstructionOutcome>,
) {
    while let Some(request) = run_rx.recv().await {
        info!(engine = engine.name(), "reconstruction started");

        let outcome = match engine
            .reconstruct(&request.input, &request.output_path)
            .await
        {
            Ok(model_path) => {
                info!(model = %model_path.display(), "reconstruction succeeded");
                if policy.cleanup_inputs {
                    remove_consumed_files(&request.input).await;
                }
                ReconstructionOutcome::Success { model_path }
            }
            Err(e) => {
                error!(error = %e, "reconstruction failed");
                let fallback = policy.fallback_model.clone();
                if fallback.is_some() && policy.cleanup_inputs {
                    remove_consumed_files(&request.input).await;
                }
                ReconstructionOutcome::Failed { fallback }
            }
        };

        if outcome_tx.send(outcome).is_err() {
            break;
        }
    }
}

/// Delete the capture files a finished run consumed
async fn remove_consumed_files(input: &ReconstructionInput) {
    for file in input.all_files() {
        if let Err(e) = tokio::fs::remove_file(&file).await {
            warn!(file = %file.display(), error = %e, "failed to remove consumed capture file");
        }
    }
}
