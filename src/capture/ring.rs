//! Target-pose generation on a ring around the pivot.
//!
//! Pure geometry: the same (pivot, rotation offset, count) always yields
//! the same targets, including index assignment. Exact-angle predicates
//! (quadrant corrections, tilt flips) are evaluated in integer step
//! arithmetic rather than on floating-point angles so the output is
//! bit-reproducible for every count.

use std::f32::consts::{FRAC_PI_2, TAU};

use nalgebra::{Point3, Vector3};

use crate::config::CaptureSettings;
use crate::domain::TargetPose;

/// Generates the guided capture ring.
#[derive(Debug, Clone)]
pub struct PoseRing {
    /// Ring radius around the pivot, meters
    radius: f32,

    /// Ring height above the pivot, meters
    height: f32,

    /// Magnitude of the viewpoint tilt toward the pivot, radians
    tilt: f32,
}

impl PoseRing {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            radius: settings.ring_radius,
            height: settings.capture_height,
            tilt: settings.capture_tilt,
        }
    }

    /// Generate `count` target poses on the ring around `pivot`.
    ///
    /// Positions are placed at the raw step angle minus `rotation_offset`;
    /// orientations use the raw angle plus `rotation_offset` with a
    /// quadrant correction so the yaw stays continuous across axis-aligned
    /// points. Index 0 goes to the first generated point, each following
    /// point gets the previous index plus one modulo `count`.
    pub fn generate(
        &self,
        pivot: Point3<f32>,
        rotation_offset: f32,
        count: usize,
    ) -> Vec<TargetPose> {
        let mut targets = Vec::with_capacity(count);
        if count == 0 {
            return targets;
        }

        let step = TAU / count as f32;
        let mut index: i32 = 0;

        for k in 0..count {
            let raw = k as f32 * step;
            let shifted = raw - rotation_offset;

            let position = Point3::new(
                pivot.x + self.radius * shifted.cos(),
                pivot.y + self.height,
                pivot.z + self.radius * shifted.sin(),
            );

            // raw == 3π/2  ⇔  4k == 3·count
            // raw ≡ 0 (mod π/2)  ⇔  count divides 4k
            let mut yaw = raw + rotation_offset;
            if 4 * k == 3 * count {
                yaw = rotation_offset;
            } else if (4 * k) % count == 0 {
                yaw -= FRAC_PI_2;
            }

            // Tilt below the ring plane, except at π/4, π/2 and 5π/4 where
            // the viewpoint angles in from above
            let mut tilt = self.tilt;
            if 8 * k == count || 4 * k == count || 8 * k == 5 * count {
                tilt = -tilt;
            }

            targets.push(TargetPose::new(
                index,
                position,
                Vector3::new(tilt, yaw, 0.0),
            ));
            index = (index + 1) % count as i32;
        }

        targets
    }
}
