//! Single shaped collider with its own pose history

use crate::history::{HistoryBuffer, TransformSample};
use crate::physics::collision::{BoundingSphere, CastHit, Intersection, Ray, Shape};
use crate::physics::tracker::{PoseSource, Tracker};

/// A shape bound to a pose history
///
/// The collider holds its world pose directly. During a rewind the live pose
/// is temporarily replaced by the interpolated one and the original is kept
/// aside until [`Collider::restore`].
#[derive(Debug, Clone)]
pub struct Collider {
    shape: Shape,
    history: HistoryBuffer,
    live: TransformSample,
    collidable: bool,
    saved_pose: Option<TransformSample>,
}

impl Collider {
    /// Create a collider at `pose` with the default history capacity
    pub fn new(shape: Shape, pose: TransformSample) -> Self {
        Self::with_history(shape, pose, HistoryBuffer::default())
    }

    /// Create a collider at `pose` using `history`
    pub fn with_history(shape: Shape, pose: TransformSample, history: HistoryBuffer) -> Self {
        Self {
            shape,
            history,
            live: pose,
            collidable: true,
            saved_pose: None,
        }
    }

    /// Collision shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Mutable collision shape, for authoring
    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    /// Move the collider
    pub fn set_pose(&mut self, pose: TransformSample) {
        self.live = pose;
    }

    /// Whether live casts can hit this collider
    pub fn is_collidable(&self) -> bool {
        self.collidable
    }

    /// Enable or disable live casts against this collider
    pub fn set_collidable(&mut self, collidable: bool) {
        self.collidable = collidable;
    }

    /// Whether the live pose is currently replaced by a historical one
    pub fn is_displaced(&self) -> bool {
        self.saved_pose.is_some()
    }

    /// Apply the cached historical pose to the live transform
    ///
    /// The original live pose is saved only on the first displacement, so
    /// repeated calls never overwrite it. Returns `false` and leaves the
    /// collider untouched when nothing is cached.
    pub fn displace_to_cached(&mut self) -> bool {
        let Some(pose) = self.pose(PoseSource::Cached) else {
            return false;
        };
        if self.saved_pose.is_none() {
            self.saved_pose = Some(self.live);
        }
        self.live = pose;
        true
    }

    /// Put the saved live pose back
    pub fn restore(&mut self) {
        if let Some(saved) = self.saved_pose.take() {
            self.live = saved;
        }
    }

    /// Full narrow-phase result at `source`, skipping the broad phase
    pub fn intersect(&self, ray: &Ray, range: f32, source: PoseSource) -> Intersection {
        self.pose(source)
            .map_or(Intersection::Miss, |pose| self.shape.intersect(ray, range, &pose))
    }

    /// Cast `ray` against this collider
    ///
    /// A bounding-sphere line test and a range test run before the exact
    /// shape test. Live casts skip non-collidable colliders; cached casts
    /// miss when no pose is cached.
    pub fn raycast(&self, ray: &Ray, range: f32, source: PoseSource) -> Option<CastHit> {
        if source == PoseSource::Live && !self.collidable {
            return None;
        }
        let pose = self.pose(source)?;
        let sphere = BoundingSphere::new(pose.position, self.shape.bounding_radius());
        if !sphere.may_hit(ray, range) {
            return None;
        }
        self.shape.intersect(ray, range, &pose).hit()
    }
}

impl Tracker for Collider {
    fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    fn history_mut(&mut self) -> &mut HistoryBuffer {
        &mut self.history
    }

    fn live_pose(&self) -> TransformSample {
        self.live
    }

    fn bounding_radius(&self) -> f32 {
        self.shape.bounding_radius()
    }
}
