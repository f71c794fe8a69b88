//! Live-pose matching against the pending target set.

use nalgebra::Point3;

use crate::domain::TargetPose;

/// Holds the targets not yet captured in the current session and matches
/// incoming live camera poses against them.
///
/// The tracker owns the pending set exclusively; a matched target is
/// removed before it is returned, so each generated target can be captured
/// at most once per session.
#[derive(Debug)]
pub struct CaptureTracker {
    pending: Vec<TargetPose>,
    tolerance: f32,
}

impl CaptureTracker {
    /// Create a tracker with the given per-axis position tolerance, meters
    pub fn new(tolerance: f32) -> Self {
        Self {
            pending: Vec::new(),
            tolerance,
        }
    }

    /// Replace the pending set for a new session
    pub fn reset(&mut self, targets: Vec<TargetPose>) {
        self.pending = targets;
    }

    /// Match a live camera position against the pending targets.
    ///
    /// Every axis difference must be within tolerance; the first pending
    /// target in container order wins, not the closest one. On a match the
    /// target leaves the pending set.
    pub fn match_pose(&mut self, live: &Point3<f32>) -> Option<TargetPose> {
        let tolerance = self.tolerance;
        let matched = self.pending.iter().position(|target| {
            (target.position.x - live.x).abs() <= tolerance
                && (target.position.y - live.y).abs() <= tolerance
                && (target.position.z - live.z).abs() <= tolerance
        })?;

        Some(self.pending.remove(matched))
    }

    /// Targets still waiting to be captured, in generation order
    pub fn pending(&self) -> &[TargetPose] {
        &self.pending
    }

    /// True once every target has been matched
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}
