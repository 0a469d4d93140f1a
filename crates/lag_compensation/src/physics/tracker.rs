//! Common interface of everything that records pose history
//!
//! Colliders and collections share it. Other back-ends, for example one that
//! moves physics-engine bodies instead of running closed-form tests, implement
//! the same trait to reuse the history and broad-phase logic.

use crate::error::HistoryError;
use crate::history::{HistoryBuffer, TransformSample};
use crate::physics::collision::{BoundingSphere, Ray};

/// Which pose a query should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseSource {
    /// Current transform
    #[default]
    Live,
    /// Last interpolated history pose
    Cached,
}

/// Object with a pose history and a bounding sphere
pub trait Tracker {
    /// Pose history
    fn history(&self) -> &HistoryBuffer;

    /// Mutable pose history
    fn history_mut(&mut self) -> &mut HistoryBuffer;

    /// Current pose
    fn live_pose(&self) -> TransformSample;

    /// Radius of the sphere around the pose origin containing the object
    fn bounding_radius(&self) -> f32;

    /// Store the live pose as the frame for `time`
    fn record_frame(&mut self, time: f64) -> Result<(), HistoryError> {
        let pose = self.live_pose();
        self.history_mut().record(time, pose)
    }

    /// Interpolate the history at `time` into the cache
    ///
    /// `now` is the present time, used when `time` is newer than every frame.
    fn cache_interpolation(&mut self, time: f64, now: f64) -> Result<TransformSample, HistoryError> {
        let live = self.live_pose();
        self.history_mut().interpolate(time, &live, now)
    }

    /// Pose for `source`, `None` when nothing is cached
    fn pose(&self, source: PoseSource) -> Option<TransformSample> {
        match source {
            PoseSource::Live => Some(self.live_pose()),
            PoseSource::Cached => self.history().cached().map(|(_, pose)| pose),
        }
    }

    /// Bounding sphere at `source`
    fn bounding_sphere(&self, source: PoseSource) -> Option<BoundingSphere> {
        self.pose(source)
            .map(|pose| BoundingSphere::new(pose.position, self.bounding_radius()))
    }

    /// Whether the ray's line passes through the bounding sphere
    fn check_bounding_sphere(&self, ray: &Ray, source: PoseSource) -> bool {
        self.bounding_sphere(source)
            .is_some_and(|sphere| sphere.intersects_line(ray))
    }

    /// Whether the bounding sphere can touch the first `range` units of the ray
    fn check_range(&self, ray: &Ray, range: f32, source: PoseSource) -> bool {
        self.bounding_sphere(source)
            .is_some_and(|sphere| sphere.within_range(ray, range))
    }
}
