//! Artifact writing for captured frames.
//!
//! Three files per bundle: the PNG-encoded color image, the depth map as
//! delimited text, and a calibration dump. Each artifact is written to a
//! temp file and renamed into place, so a bundle either appears complete
//! or not at all on a clean filesystem.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use nalgebra::{Matrix3, Matrix4};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::OutputSettings;
use crate::domain::{DepthMap, PersistedOutput, RawFrameBundle};

/// Errors that can occur while persisting a bundle
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("depth map {width}x{height} too small to trim its border")]
    DepthTooSmall { width: usize, height: usize },
}

/// Writes the per-frame artifacts into the capture storage directory.
#[derive(Debug)]
pub struct OutputWriter {
    storage_dir: PathBuf,
    settings: OutputSettings,
}

impl OutputWriter {
    /// Create a writer rooted at `storage_dir`, creating it if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        Self::with_settings(storage_dir, OutputSettings::default())
    }

    pub fn with_settings(
        storage_dir: impl Into<PathBuf>,
        settings: OutputSettings,
    ) -> Result<Self, PersistError> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self {
            storage_dir,
            settings,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Persist all three artifacts for one bundle.
    ///
    /// Ring captures reuse the matched target id as the file identifier;
    /// free captures get a fresh one so files never collide even though
    /// they share the sole sentinel index.
    pub fn write_bundle(&self, bundle: &RawFrameBundle) -> Result<PersistedOutput, PersistError> {
        let identifier = bundle
            .target_id
            .unwrap_or_else(Uuid::new_v4)
            .to_string();

        let depth_path = self.artifact_path(&self.settings.depth_prefix, &identifier, "txt");
        self.write_text(&depth_text(&bundle.depth)?, &depth_path)?;

        let image_path = self.artifact_path(&self.settings.image_prefix, &identifier, "png");
        self.write_image(bundle, &image_path)?;

        let calibration_path =
            self.artifact_path(&self.settings.calibration_prefix, &identifier, "txt");
        self.write_text(
            &calibration_text(&bundle.intrinsics, &bundle.extrinsics),
            &calibration_path,
        )?;

        debug!(index = bundle.index, %identifier, "bundle persisted");

        Ok(PersistedOutput {
            index: bundle.index,
            image_path,
            depth_data_path: depth_path,
            calibration_path: Some(calibration_path),
        })
    }

    fn artifact_path(&self, prefix: &str, identifier: &str, extension: &str) -> PathBuf {
        self.storage_dir
            .join(format!("{}_{}.{}", prefix, identifier, extension))
    }

    fn write_image(&self, bundle: &RawFrameBundle, path: &Path) -> Result<(), PersistError> {
        let mut encoded = Vec::new();
        bundle
            .color
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
        self.write_bytes(&encoded, path)
    }

    fn write_text(&self, text: &str, path: &Path) -> Result<(), PersistError> {
        self.write_bytes(text.as_bytes(), path)
    }

    /// Temp-file + rename so partially written artifacts never surface
    fn write_bytes(&self, bytes: &[u8], path: &Path) -> Result<(), PersistError> {
        let mut temp = NamedTempFile::new_in(&self.storage_dir)?;
        temp.write_all(bytes)?;
        temp.persist(path).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}

/// Render a depth map as comma-delimited columns and newline-delimited
/// rows, dropping a one-pixel border on all sides where sensor depth is
/// unreliable.
pub fn depth_text(depth: &DepthMap) -> Result<String, PersistError> {
    let (width, height) = (depth.width(), depth.height());
    if width <= 2 || height <= 2 {
        return Err(PersistError::DepthTooSmall { width, height });
    }

    let mut text = String::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            text.push_str(&depth.value_at(x, y).to_string());
            if x != width - 2 {
                text.push(',');
            }
        }
        text.push('\n');
    }

    Ok(text)
}

/// Render the calibration dump: an `intrinsics:` block then an
/// `extrinsics:` block, one matrix row per line, space-separated.
pub fn calibration_text(intrinsics: &Matrix3<f32>, extrinsics: &Matrix4<f32>) -> String {
    let mut text = String::from("intrinsics:\n");
    for row in 0..3 {
        let line: Vec<String> = (0..3).map(|col| intrinsics[(row, col)].to_string()).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }

    text.push_str("\nextrinsics:\n");
    for row in 0..4 {
        let line: Vec<String> = (0..4).map(|col| extrinsics[(row, col)].to_string()).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }

    text
}
