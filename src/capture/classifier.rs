//! Per-frame capture decisions.
//!
//! The classifier runs inline on the sensor callback: O(ring size) pure
//! computation, no I/O, no blocking. It never errors — a frame either
//! yields one bundle or is dropped.

use tracing::debug;

use crate::config::SOLE_CAPTURE_INDEX;
use crate::domain::{RawFrameBundle, SensorFrame};

use super::tracker::CaptureTracker;

/// How a session decides what to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Guided session: frames are captured when the live pose matches a
    /// pending ring target
    Ring,

    /// Free session: frames are captured on an external trigger edge and
    /// tagged with the sole sentinel index
    Free,
}

/// Builds raw frame bundles from sensor frames.
#[derive(Debug)]
pub struct FrameClassifier {
    mode: CaptureMode,

    /// Free-mode trigger flag; cleared on the first depth-carrying frame
    trigger_armed: bool,
}

impl FrameClassifier {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            trigger_armed: false,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Arm the free-mode trigger. A no-op in ring mode.
    pub fn trigger_capture(&mut self) {
        if self.mode == CaptureMode::Free {
            self.trigger_armed = true;
        }
    }

    /// Decide whether `frame` should be captured.
    ///
    /// Ring mode checks buffer availability before consulting the tracker
    /// so an incomplete frame never consumes a target. Free mode disarms
    /// the trigger as soon as a depth-carrying frame arrives, even if the
    /// color buffer then turns out to be missing — one trigger, at most
    /// one capture.
    pub fn classify(
        &mut self,
        frame: &SensorFrame,
        tracker: &mut CaptureTracker,
    ) -> Option<RawFrameBundle> {
        match self.mode {
            CaptureMode::Ring => {
                let color = frame.color.as_ref()?;
                let depth = frame.depth.as_ref()?;

                let target = tracker.match_pose(&frame.camera_position())?;
                debug!(index = target.index, "live pose matched ring target");

                Some(RawFrameBundle {
                    index: target.index,
                    target_id: Some(target.id),
                    color: color.clone(),
                    depth: depth.clone(),
                    intrinsics: frame.intrinsics,
                    extrinsics: frame.extrinsics,
                })
            }
            CaptureMode::Free => {
                if !self.trigger_armed {
                    return None;
                }
                let depth = frame.depth.as_ref()?;
                self.trigger_armed = false;

                let color = frame.color.as_ref()?;
                debug!("trigger consumed by free capture");

                Some(RawFrameBundle {
                    index: SOLE_CAPTURE_INDEX,
                    target_id: None,
                    color: color.clone(),
                    depth: depth.clone(),
                    intrinsics: frame.intrinsics,
                    extrinsics: frame.extrinsics,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColorImage, DepthMap, TargetPose};
    use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

    fn frame_at(x: f32, y: f32, z: f32, color: bool, depth: bool) -> SensorFrame {
        let mut extrinsics = Matrix4::identity();
        extrinsics[(0, 3)] = x;
        extrinsics[(1, 3)] = y;
        extrinsics[(2, 3)] = z;

        SensorFrame {
            color: color.then(|| ColorImage::new(4, 4)),
            depth: depth.then(|| DepthMap::filled(4, 4, 1.0)),
            intrinsics: Matrix3::identity(),
            extrinsics,
        }
    }

    fn tracker_with_target_at_origin() -> CaptureTracker {
        let mut tracker = CaptureTracker::new(0.05);
        tracker.reset(vec![TargetPose::new(
            0,
            Point3::origin(),
            Vector3::zeros(),
        )]);
        tracker
    }

    #[test]
    fn test_ring_capture_tags_bundle_with_target() {
        let mut classifier = FrameClassifier::new(CaptureMode::Ring);
        let mut tracker = tracker_with_target_at_origin();
        let expected_id = tracker.pending()[0].id;

        let bundle = classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .unwrap();

        assert_eq!(bundle.index, 0);
        assert_eq!(bundle.target_id, Some(expected_id));
        assert!(tracker.is_exhausted());
    }

    #[test]
    fn test_ring_drops_frame_without_consuming_target_when_depth_missing() {
        let mut classifier = FrameClassifier::new(CaptureMode::Ring);
        let mut tracker = tracker_with_target_at_origin();

        let bundle = classifier.classify(&frame_at(0.0, 0.0, 0.0, true, false), &mut tracker);
        assert!(bundle.is_none());
        // The target survives the dropped frame
        assert_eq!(tracker.pending().len(), 1);
    }

    #[test]
    fn test_ring_drops_unmatched_frame() {
        let mut classifier = FrameClassifier::new(CaptureMode::Ring);
        let mut tracker = tracker_with_target_at_origin();

        let bundle = classifier.classify(&frame_at(1.0, 1.0, 1.0, true, true), &mut tracker);
        assert!(bundle.is_none());
        assert_eq!(tracker.pending().len(), 1);
    }

    #[test]
    fn test_free_capture_requires_trigger() {
        let mut classifier = FrameClassifier::new(CaptureMode::Free);
        let mut tracker = CaptureTracker::new(0.05);

        assert!(classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .is_none());

        classifier.trigger_capture();
        let bundle = classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .unwrap();

        assert_eq!(bundle.index, SOLE_CAPTURE_INDEX);
        assert_eq!(bundle.target_id, None);
    }

    #[test]
    fn test_single_capture_per_trigger() {
        let mut classifier = FrameClassifier::new(CaptureMode::Free);
        let mut tracker = CaptureTracker::new(0.05);

        classifier.trigger_capture();
        assert!(classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .is_some());
        // Next frame without a new trigger is ignored
        assert!(classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .is_none());
    }

    #[test]
    fn test_trigger_survives_depthless_frames() {
        let mut classifier = FrameClassifier::new(CaptureMode::Free);
        let mut tracker = CaptureTracker::new(0.05);

        classifier.trigger_capture();
        // No depth yet: trigger stays armed
        assert!(classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, false), &mut tracker)
            .is_none());
        assert!(classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .is_some());
    }

    #[test]
    fn test_trigger_in_ring_mode_is_ignored() {
        let mut classifier = FrameClassifier::new(CaptureMode::Ring);
        let mut tracker = CaptureTracker::new(0.05);
        tracker.reset(Vec::new());

        classifier.trigger_capture();
        assert!(classifier
            .classify(&frame_at(0.0, 0.0, 0.0, true, true), &mut tracker)
            .is_none());
    }
}
