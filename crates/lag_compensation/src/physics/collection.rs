//! Group of colliders behind one coarse bounding sphere
//!
//! A collection represents one game entity. Its own history tracks the
//! entity's center, which drives the broad phase; the children carry the
//! actual shapes and their own histories.
//!
//! Rewinds follow an explicit state machine:
//!
//! ```text
//! Idle --interpolate_all--> Interpolated --commit_to_cached--> Committed --reset--> Idle
//! ```
//!
//! `reset` is accepted from every state. Committing twice, or interpolating a
//! committed collection at a different time, is rejected.

use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, LagCompensationError, LagResult};
use crate::history::{HistoryBuffer, TransformSample};
use crate::physics::collider::Collider;
use crate::physics::collision::{CastHit, Ray};
use crate::physics::tracker::{PoseSource, Tracker};

/// Where a collection is in its rewind cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RewindState {
    /// Live poses, no full interpolation
    #[default]
    Idle,
    /// Every child holds a cached historical pose
    Interpolated,
    /// Cached poses are applied to the live transforms
    Committed,
}

/// Colliders sharing one bounding sphere
#[derive(Debug, Clone)]
pub struct ColliderCollection {
    bounding_radius: f32,
    history: HistoryBuffer,
    live: TransformSample,
    saved_pose: Option<TransformSample>,
    children: Vec<Collider>,
    state: RewindState,
}

impl ColliderCollection {
    /// Create an empty collection centered at `pose`
    pub fn new(bounding_radius: f32, pose: TransformSample) -> Self {
        Self {
            bounding_radius,
            history: HistoryBuffer::default(),
            live: pose,
            saved_pose: None,
            children: Vec::new(),
            state: RewindState::Idle,
        }
    }

    /// Add a child collider, returning its index
    pub fn add_collider(&mut self, mut collider: Collider) -> usize {
        collider
            .history_mut()
            .set_capacity(self.history.capacity());
        self.children.push(collider);
        self.children.len() - 1
    }

    /// Remove and return the child at `index`
    ///
    /// Indices of later children shift down by one.
    pub fn remove_collider(&mut self, index: usize) -> Option<Collider> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Child at `index`
    pub fn collider(&self, index: usize) -> Option<&Collider> {
        self.children.get(index)
    }

    /// Mutable child at `index`
    pub fn collider_mut(&mut self, index: usize) -> Option<&mut Collider> {
        self.children.get_mut(index)
    }

    /// All children in index order
    pub fn colliders(&self) -> &[Collider] {
        &self.children
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the collection has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Current rewind state
    pub fn state(&self) -> RewindState {
        self.state
    }

    /// Set the authored bounding radius
    pub fn set_bounding_radius(&mut self, radius: f32) {
        self.bounding_radius = radius;
    }

    /// Smallest radius around the live center that contains every child's
    /// live bounding sphere
    pub fn required_bounding_radius(&self) -> f32 {
        self.children
            .iter()
            .map(|child| (child.live_pose().position - self.live.position).norm() + child.bounding_radius())
            .fold(0.0, f32::max)
    }

    /// Resize the history of the center and of every child
    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
        for child in &mut self.children {
            child.history_mut().set_capacity(capacity);
        }
    }

    /// Move only the center
    pub fn set_pose(&mut self, pose: TransformSample) {
        self.live = pose;
    }

    /// Move the center and carry every child along rigidly
    pub fn set_pose_rigid(&mut self, pose: TransformSample) {
        let old = self.live;
        let turn = pose.rotation * old.rotation.inverse();
        for child in &mut self.children {
            let child_pose = child.live_pose();
            let local = old.inverse_transform_point(&child_pose.position);
            child.set_pose(TransformSample::new(
                pose.transform_point(&local),
                turn * child_pose.rotation,
            ));
        }
        self.live = pose;
    }

    /// Enable or disable live casts against every child
    pub fn set_collidable(&mut self, collidable: bool) {
        for child in &mut self.children {
            child.set_collidable(collidable);
        }
    }

    /// Record the live center and every child at `time`
    ///
    /// Each history records on its own. A child refusing the frame is logged
    /// and skipped without holding back its siblings; the result reports the
    /// center only.
    pub fn record_frame_all(&mut self, time: f64) -> Result<(), HistoryError> {
        let center = self.record_frame(time);
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(e) = child.record_frame(time) {
                log::warn!("Collider {} skipped frame at {}: {}", index, time, e);
            }
        }
        center
    }

    /// Interpolate only the center at `time`, for the broad phase
    pub fn cache_center(&mut self, time: f64, now: f64) -> LagResult<TransformSample> {
        if self.state == RewindState::Committed && self.history.cached_time() != Some(time) {
            return Err(LagCompensationError::IllegalTransition {
                action: "interpolate at a different time",
                state: self.state,
            });
        }
        Ok(self.cache_interpolation(time, now)?)
    }

    /// Interpolate the center and every child at `time`
    ///
    /// Does nothing when this time was already fully interpolated. A child
    /// whose history cannot answer `time` is logged and left without a cached
    /// pose, so it misses cached casts; only a center underflow fails the call.
    pub fn interpolate_all(&mut self, time: f64, now: f64) -> LagResult<()> {
        if self.history.is_fresh_for(time) {
            return Ok(());
        }
        self.cache_center(time, now)?;

        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(e) = child.cache_interpolation(time, now) {
                log::warn!("Collider {} treated as a miss: {}", index, e);
            }
        }

        self.history.mark_fresh();
        if self.state == RewindState::Idle {
            self.state = RewindState::Interpolated;
        }
        Ok(())
    }

    /// Apply every cached pose to the live transforms
    ///
    /// The center moves too, so live broad-phase tests follow the rewound
    /// children. Children without a cached pose are made non-collidable for
    /// the duration of the rewind; the others become collidable.
    pub fn commit_to_cached(&mut self) -> LagResult<()> {
        if self.state != RewindState::Interpolated {
            return Err(LagCompensationError::IllegalTransition {
                action: "commit",
                state: self.state,
            });
        }

        if let Some(center) = self.pose(PoseSource::Cached) {
            self.saved_pose.get_or_insert(self.live);
            self.live = center;
        }
        for child in &mut self.children {
            let displaced = child.displace_to_cached();
            child.set_collidable(displaced);
        }

        self.state = RewindState::Committed;
        Ok(())
    }

    /// Restore live poses and forget every cached interpolation
    pub fn reset(&mut self) {
        if let Some(saved) = self.saved_pose.take() {
            self.live = saved;
        }
        for child in &mut self.children {
            child.restore();
            child.set_collidable(true);
            child.history_mut().invalidate();
        }
        self.history.invalidate();
        self.state = RewindState::Idle;
    }

    /// Nearest hit over all children as `(hit, child_index)`
    ///
    /// Each child runs its own bounding-sphere pre-check first.
    pub fn cast(&self, ray: &Ray, range: f32, source: PoseSource) -> Option<(CastHit, usize)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(index, child)| child.raycast(ray, range, source).map(|hit| (hit, index)))
            .min_by(|(a, _), (b, _)| a.entry_distance.total_cmp(&b.entry_distance))
    }

    /// Broad-phase gate for the whole collection at `source`
    pub fn may_hit(&self, ray: &Ray, range: f32, source: PoseSource) -> bool {
        self.check_bounding_sphere(ray, source) && self.check_range(ray, range, source)
    }
}

impl Tracker for ColliderCollection {
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
        self.bounding_radius
    }
}
