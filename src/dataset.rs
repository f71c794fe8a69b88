//! Pre-captured dataset loading.
//!
//! Lets the rest of the system run without live sensor hardware: a
//! directory of previously captured artifacts is scanned into the same
//! `PersistedOutput` form the persistence pipeline produces, ready for
//! partitioning and reconstruction.
//!
//! Layout: ring frames are named by their capture index
//! (`original_3.png`, `depth_logs_3.txt`, `depth_calibration_3.txt`);
//! sole frames by the identifier minted at capture time. Incomplete
//! triples are skipped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{OutputSettings, SOLE_CAPTURE_INDEX};
use crate::domain::PersistedOutput;

/// Errors that can occur while scanning a dataset directory
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("invalid scan pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Scans a dataset directory into persisted outputs.
#[derive(Debug)]
pub struct DatasetLoader {
    dir: PathBuf,
    settings: OutputSettings,
}

impl DatasetLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_settings(dir, OutputSettings::default())
    }

    pub fn with_settings(dir: impl Into<PathBuf>, settings: OutputSettings) -> Self {
        Self {
            dir: dir.into(),
            settings,
        }
    }

    /// Load every complete frame triple in the directory.
    ///
    /// Ring outputs come first in index order, then sole outputs in
    /// identifier order; both orders are stable across runs.
    pub fn load(&self, ring_count: usize) -> Result<Vec<PersistedOutput>, DatasetError> {
        if !self.dir.is_dir() {
            return Err(DatasetError::DirectoryNotFound(self.dir.clone()));
        }

        let mut outputs = Vec::new();

        for index in 0..ring_count {
            match self.triple(index as i32, &index.to_string()) {
                Some(output) => outputs.push(output),
                None => debug!(index, "ring frame missing from dataset"),
            }
        }

        for identifier in self.sole_identifiers(ring_count)? {
            match self.triple(SOLE_CAPTURE_INDEX, &identifier) {
                Some(output) => outputs.push(output),
                None => warn!(%identifier, "incomplete sole frame skipped"),
            }
        }

        debug!(count = outputs.len(), dir = %self.dir.display(), "dataset loaded");
        Ok(outputs)
    }

    /// Identifiers of sole frames: every image whose identifier is not a
    /// ring index
    fn sole_identifiers(&self, ring_count: usize) -> Result<Vec<String>, DatasetError> {
        let pattern = self
            .dir
            .join(format!("{}_*.png", self.settings.image_prefix))
            .to_string_lossy()
            .into_owned();

        let prefix = format!("{}_", self.settings.image_prefix);
        let mut identifiers: Vec<String> = glob::glob(&pattern)?
            .filter_map(Result::ok)
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|stem| stem.strip_prefix(&prefix))
                    .map(str::to_owned)
            })
            .filter(|identifier| !is_ring_identifier(identifier, ring_count))
            .collect();

        identifiers.sort();
        Ok(identifiers)
    }

    /// Locate the artifact triple for one identifier.
    ///
    /// Image and depth are required; calibration is optional for datasets
    /// captured before calibration dumps existed.
    fn triple(&self, index: i32, identifier: &str) -> Option<PersistedOutput> {
        let image_path = self.artifact(&self.settings.image_prefix, identifier, "png");
        let depth_path = self.artifact(&self.settings.depth_prefix, identifier, "txt");
        if !image_path.exists() || !depth_path.exists() {
            return None;
        }

        let calibration = self.artifact(&self.settings.calibration_prefix, identifier, "txt");

        Some(PersistedOutput {
            index,
            image_path,
            depth_data_path: depth_path,
            calibration_path: calibration.exists().then_some(calibration),
        })
    }

    fn artifact(&self, prefix: &str, identifier: &str, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", prefix, identifier, extension))
    }
}

fn is_ring_identifier(identifier: &str, ring_count: usize) -> bool {
    identifier
        .parse::<usize>()
        .map(|index| index < ring_count)
        .unwrap_or(false)
}

/// Convenience: scan `dir` with default naming
pub fn load_dataset(dir: &Path, ring_count: usize) -> Result<Vec<PersistedOutput>, DatasetError> {
    DatasetLoader::new(dir).load(ring_count)
}
