//! Position and orientation snapshot

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Quat, Vec3};

/// Rigid pose of a tracked object at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSample {
    /// World-space position
    pub position: Vec3,
    /// World-space orientation
    pub rotation: Quat,
}

impl Default for TransformSample {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformSample {
    /// Create a sample from a position and orientation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Sample at the origin with no rotation
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }

    /// Sample at `position` with no rotation
    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::identity())
    }

    /// Blend toward `other` by `fraction`
    ///
    /// Position is blended linearly, rotation spherically. `fraction` is
    /// clamped to `[0, 1]`, so the result never overshoots either endpoint.
    pub fn interpolate(&self, other: &Self, fraction: f32) -> Self {
        let t = fraction.clamp(0.0, 1.0);
        // Endpoints are returned exactly
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *other;
        }
        let position = self.position.lerp(&other.position, t);
        // Antipodal quaternions have no unique slerp path
        let rotation = self
            .rotation
            .try_slerp(&other.rotation, t, f32::EPSILON)
            .unwrap_or_else(|| self.rotation.nlerp(&other.rotation, t));
        Self { position, rotation }
    }

    /// Map a point from this pose's local space into world space
    pub fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Map a world-space point into this pose's local space
    pub fn inverse_transform_point(&self, world: &Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_interpolate_halfway() {
        let a = TransformSample::from_position(Vec3::new(0.0, 0.0, 0.0));
        let b = TransformSample::new(
            Vec3::new(2.0, 4.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
        );
        let mid = a.interpolate(&b, 0.5);
        assert_relative_eq!(mid.position, Vec3::new(1.0, 2.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(mid.rotation.angle(), std::f32::consts::FRAC_PI_4, epsilon = EPSILON);
    }

    #[test]
    fn test_interpolate_clamps_fraction() {
        let a = TransformSample::from_position(Vec3::new(1.0, 0.0, 0.0));
        let b = TransformSample::from_position(Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(a.interpolate(&b, 2.0).position, b.position, epsilon = EPSILON);
        assert_relative_eq!(a.interpolate(&b, -1.0).position, a.position, epsilon = EPSILON);
    }

    #[test]
    fn test_transform_round_trip_point() {
        let pose = TransformSample::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 0.7),
        );
        let local = Vec3::new(0.5, -1.0, 2.0);
        let back = pose.inverse_transform_point(&pose.transform_point(&local));
        assert_relative_eq!(back, local, epsilon = EPSILON);
    }
}
