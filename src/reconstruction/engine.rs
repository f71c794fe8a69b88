//! Reconstruction engine boundary.
//!
//! The engine is an opaque collaborator: it receives the prepared file
//! groups and a destination, and answers success or failure. The shipped
//! implementation shells out to an external reconstruction binary; tests
//! substitute their own implementations of the trait.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

use super::input::ReconstructionInput;

/// Errors from one reconstruction run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch reconstruction engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("reconstruction timed out after {0:?}")]
    Timeout(Duration),

    #[error("reconstruction failed with exit code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("reconstruction failed: {0}")]
    Other(String),
}

/// Trait for reconstruction engines
#[async_trait]
pub trait ReconstructionEngine: Send + Sync {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Run one reconstruction over the prepared input groups.
    ///
    /// On success returns the path of the produced model. The call may be
    /// slow; the orchestrator runs it on a dedicated worker.
    async fn reconstruct(
        &self,
        input: &ReconstructionInput,
        output_path: &Path,
    ) -> Result<PathBuf, EngineError>;
}

/// Engine invoking an external reconstruction binary.
///
/// The input groups are serialized to a JSON manifest file and passed via
/// `--input`; the destination via `--output`. A zero exit status means the
/// model was written to the destination.
pub struct CommandEngine {
    binary_path: String,
    run_timeout: Duration,
}

impl CommandEngine {
    pub fn new(binary_path: impl Into<String>, run_timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            run_timeout,
        }
    }

    fn write_manifest(input: &ReconstructionInput) -> Result<NamedTempFile, EngineError> {
        let json = serde_json::to_vec_pretty(input)
            .map_err(|e| EngineError::Other(format!("manifest serialization failed: {}", e)))?;

        let mut manifest = NamedTempFile::new()?;
        manifest.write_all(&json)?;
        manifest.flush()?;
        Ok(manifest)
    }
}

#[async_trait]
impl ReconstructionEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.binary_path
    }

    async fn reconstruct(
        &self,
        input: &ReconstructionInput,
        output_path: &Path,
    ) -> Result<PathBuf, EngineError> {
        // Keep the manifest alive until the process exits
        let manifest = Self::write_manifest(input)?;

        info!(engine = %self.binary_path, output = %output_path.display(), "invoking reconstruction engine");

        let child = Command::new(&self.binary_path)
            .arg("--input")
            .arg(manifest.path())
            .arg("--output")
            .arg(output_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = timeout(self.run_timeout, child.wait_with_output())
            .await
            .map_err(|_| EngineError::Timeout(self.run_timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_engine_reports_failure_with_stderr() {
        // `false` exits non-zero without reading its arguments
        let engine = CommandEngine::new("false", Duration::from_secs(5));
        let input = ReconstructionInput::Paths {
            lateral_a: vec![],
            lateral_b: vec![],
            sole: vec![],
        };

        let result = engine.reconstruct(&input, Path::new("/tmp/out.obj")).await;
        assert!(matches!(result, Err(EngineError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_command_engine_success_returns_output_path() {
        let engine = CommandEngine::new("true", Duration::from_secs(5));
        let input = ReconstructionInput::Paths {
            lateral_a: vec![],
            lateral_b: vec![],
            sole: vec![],
        };

        let path = engine
            .reconstruct(&input, Path::new("/tmp/out.obj"))
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/out.obj"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_io_error() {
        let engine = CommandEngine::new("definitely-not-a-real-engine", Duration::from_secs(5));
        let input = ReconstructionInput::Paths {
            lateral_a: vec![],
            lateral_b: vec![],
            sole: vec![],
        };

        let result = engine.reconstruct(&input, Path::new("/tmp/out.obj")).await;
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
