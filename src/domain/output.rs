//! Persisted capture artifacts and session batches.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paths of the artifacts written for one captured frame.
///
/// Created by the persistence pipeline after all artifacts for a bundle
/// land on disk; consumed by the input partitioner; deleted from storage
/// once a reconstruction run has used the underlying files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedOutput {
    /// Ring capture index, or the sole-capture sentinel
    pub index: i32,

    /// Encoded color image
    pub image_path: PathBuf,

    /// Depth values as delimited text
    pub depth_data_path: PathBuf,

    /// Intrinsics/extrinsics dump; absent for datasets captured without
    /// calibration
    pub calibration_path: Option<PathBuf>,
}

impl PersistedOutput {
    /// All files backing this output, in the order the reconstruction
    /// engine expects them (image, depth, calibration)
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.image_path.clone(), self.depth_data_path.clone()];
        if let Some(ref calibration) = self.calibration_path {
            files.push(calibration.clone());
        }
        files
    }
}

/// All outputs accumulated between a pipeline `reset` and `finish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputBatch {
    pub outputs: Vec<PersistedOutput>,

    /// When the finish barrier drained
    pub finished_at: DateTime<Utc>,
}

impl OutputBatch {
    /// Every file referenced by the batch, in batch order
    pub fn files(&self) -> Vec<PathBuf> {
        self.outputs.iter().flat_map(|o| o.files()).collect()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
