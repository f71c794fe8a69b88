//! Target poses on the capture ring.

use nalgebra::{Point3, Vector3};
use uuid::Uuid;

/// A single target pose a user is guided to during a ring session.
///
/// Targets are created in a batch by the pose ring and consumed exactly
/// once when the tracker matches a live camera pose against them; they are
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPose {
    /// Unique identifier, used to label the persisted artifacts and to let
    /// UI collaborators highlight the matched ring node
    pub id: Uuid,

    /// Capture index within the ring, in [0, ring_count)
    pub index: i32,

    /// Target camera position in world space, meters
    pub position: Point3<f32>,

    /// Euler orientation (tilt, yaw, roll), radians
    pub orientation: Vector3<f32>,
}

impl TargetPose {
    /// Create a target pose with a fresh identifier
    pub fn new(index: i32, position: Point3<f32>, orientation: Vector3<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            position,
            orientation,
        }
    }
}
