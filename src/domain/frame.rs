//! Raw sensor frames and the bundles built from them.
//!
//! A [`SensorFrame`] is what the sensor collaborator delivers on its
//! real-time callback; a [`RawFrameBundle`] is the immutable snapshot the
//! classifier hands to the persistence pipeline once it decides a frame is
//! worth keeping.

use nalgebra::{Matrix3, Matrix4, Point3};
use uuid::Uuid;

/// Color pixel buffer, RGBA8
pub type ColorImage = image::RgbaImage;

/// Dense per-pixel depth in meters, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl DepthMap {
    /// Build a depth map from row-major values.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        if values.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    /// Depth map with every pixel at the same distance
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Depth at pixel (x, y)
    pub fn value_at(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// One frame as delivered by the sensor collaborator.
///
/// Color and depth buffers are optional: the sensor may drop either under
/// load, and classification silently skips such frames.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub color: Option<ColorImage>,
    pub depth: Option<DepthMap>,

    /// Camera intrinsics, 3x3
    pub intrinsics: Matrix3<f32>,

    /// Camera-to-world transform, 4x4
    pub extrinsics: Matrix4<f32>,
}

impl SensorFrame {
    /// Camera position in world space (translation column of the transform)
    pub fn camera_position(&self) -> Point3<f32> {
        Point3::new(
            self.extrinsics[(0, 3)],
            self.extrinsics[(1, 3)],
            self.extrinsics[(2, 3)],
        )
    }
}

/// An immutable captured-frame snapshot queued for persistence.
///
/// Ownership passes from the classifier into the persistence pipeline and
/// is released once the artifacts are written or the write fails.
#[derive(Debug, Clone)]
pub struct RawFrameBundle {
    /// Ring target index, or [`crate::config::SOLE_CAPTURE_INDEX`] for free captures
    pub index: i32,

    /// Matched target id for ring captures; `None` for free captures
    pub target_id: Option<Uuid>,

    pub color: ColorImage,
    pub depth: DepthMap,
    pub intrinsics: Matrix3<f32>,
    pub extrinsics: Matrix4<f32>,
}
