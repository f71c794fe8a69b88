//! Partitioning persisted outputs into reconstruction groups.
//!
//! Group membership is determined solely by the static index tables; the
//! tables themselves are camera-geometry engineering data carried in
//! configuration. The partitioner only honors them.

use std::path::PathBuf;

use crate::config::{PartitionTables, SOLE_CAPTURE_INDEX};
use crate::domain::PersistedOutput;

use super::input::ReconstructionInput;

/// Maps a finished output batch onto the engine's input groups.
#[derive(Debug, Clone)]
pub struct InputPartitioner {
    tables: PartitionTables,
}

impl InputPartitioner {
    pub fn new(tables: PartitionTables) -> Self {
        Self { tables }
    }

    /// Partition a full-scan batch into the two lateral groups and the
    /// sole group.
    ///
    /// Outputs are visited in batch order, so lateral ordering is stable
    /// for a given batch and the sole group preserves capture order. An
    /// index listed in `shared` feeds both lateral groups; the sole
    /// sentinel index always lands in the sole group.
    pub fn partition(&self, outputs: &[PersistedOutput]) -> ReconstructionInput {
        let mut lateral_a: Vec<Vec<PathBuf>> = Vec::new();
        let mut lateral_b: Vec<Vec<PathBuf>> = Vec::new();
        let mut sole: Vec<Vec<PathBuf>> = Vec::new();

        for output in outputs {
            let files = output.files();

            if self.tables.lateral_a.contains(&output.index) {
                lateral_a.push(files.clone());
            }
            if self.tables.lateral_b.contains(&output.index) {
                lateral_b.push(files.clone());
            }
            if self.tables.shared.contains(&output.index) {
                lateral_a.push(files.clone());
                lateral_b.push(files.clone());
            }
            if output.index == SOLE_CAPTURE_INDEX {
                sole.push(files);
            }
        }

        ReconstructionInput::Paths {
            lateral_a,
            lateral_b,
            sole,
        }
    }

    /// Partition a sole-only batch around an existing reconstructed model
    pub fn partition_combined(
        &self,
        model_path: PathBuf,
        outputs: &[PersistedOutput],
    ) -> ReconstructionInput {
        let sole = outputs
            .iter()
            .filter(|o| o.index == SOLE_CAPTURE_INDEX)
            .map(|o| o.files())
            .collect();

        ReconstructionInput::Combined {
            path: model_path,
            sole,
        }
    }
}
