//! Registry of collections and the rewind orchestration
//!
//! The cast system owns every registered [`ColliderCollection`] and answers
//! nearest-hit queries in two phases: a bounding-sphere test per collection
//! (broad phase), then exact shape tests per child (narrow phase).
//!
//! Rewinds come in three flavors:
//! - [`ColliderCastSystem::raycast_cached`] interpolates lazily and tests the
//!   cached poses directly, leaving live transforms alone.
//! - [`ColliderCastSystem::simulate_start`] / [`ColliderCastSystem::simulate_reset`]
//!   bracket a rewind in which live casts see historical poses. Collections
//!   are only moved once [`ColliderCastSystem::raycast_prepare`] proves a ray
//!   can reach them.
//! - [`ColliderCastSystem::simulate_fully`] moves everything up front.

use slotmap::{new_key_type, SlotMap};

use crate::config::{BoundingRadiusPolicy, LagCompensationConfig};
use crate::error::{LagCompensationError, LagResult};
use crate::foundation::math::Vec3;
use crate::foundation::time::Clock;
use crate::physics::collection::{ColliderCollection, RewindState};
use crate::physics::collision::{CastHit, Ray};
use crate::physics::tracker::{PoseSource, Tracker};

new_key_type! {
    /// Handle to a registered collection
    pub struct CollectionHandle;
}

/// Nearest hit across collections: `(hit, collection, child_index)`
pub type CastResult = (CastHit, CollectionHandle, usize);

/// Slack when comparing an authored radius to the required one
const RADIUS_TOLERANCE: f32 = 1e-4;

/// Registry of live collections for one simulation
pub struct ColliderCastSystem {
    config: LagCompensationConfig,
    clock: Box<dyn Clock>,
    collections: SlotMap<CollectionHandle, ColliderCollection>,
    rewind_time: Option<f64>,
    last_recorded: Option<f64>,
}

impl ColliderCastSystem {
    /// Create an empty registry
    pub fn init(config: LagCompensationConfig, clock: Box<dyn Clock>) -> LagResult<Self> {
        config.validate()?;
        log::info!(
            "Cast system initialized: {} frames every {}s",
            config.history_capacity,
            config.store_interval
        );
        Ok(Self {
            config,
            clock,
            collections: SlotMap::with_key(),
            rewind_time: None,
            last_recorded: None,
        })
    }

    /// Tear the registry down, restoring any rewound poses first
    ///
    /// Returns the collections that were still registered.
    pub fn shutdown(mut self) -> Vec<ColliderCollection> {
        self.simulate_reset();
        log::info!("Cast system shutdown with {} collections", self.collections.len());
        self.collections.drain().map(|(_, collection)| collection).collect()
    }

    /// Active configuration
    pub fn config(&self) -> &LagCompensationConfig {
        &self.config
    }

    /// Current time from the clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Register a collection, validating its bounding radius per the configured policy
    pub fn register(&mut self, mut collection: ColliderCollection) -> LagResult<CollectionHandle> {
        let radius = collection.bounding_radius();
        let required = collection.required_bounding_radius();
        if required > radius + RADIUS_TOLERANCE {
            match self.config.bounding_radius_policy {
                BoundingRadiusPolicy::Ignore => {}
                BoundingRadiusPolicy::Warn => {
                    log::warn!(
                        "Collection bounding radius {} is below the required {}; hits may be missed",
                        radius,
                        required
                    );
                }
                BoundingRadiusPolicy::Reject => {
                    return Err(LagCompensationError::BoundingSphereUndersized { radius, required });
                }
                BoundingRadiusPolicy::Expand => {
                    log::debug!("Expanding collection bounding radius {} -> {}", radius, required);
                    collection.set_bounding_radius(required);
                }
            }
        }

        collection.set_history_capacity(self.config.history_capacity);
        Ok(self.collections.insert(collection))
    }

    /// Remove a collection, restoring its live poses if it was rewound
    pub fn unregister(&mut self, handle: CollectionHandle) -> LagResult<ColliderCollection> {
        let mut collection = self
            .collections
            .remove(handle)
            .ok_or(LagCompensationError::UnknownCollection)?;
        collection.reset();
        Ok(collection)
    }

    /// Registered collection
    pub fn get(&self, handle: CollectionHandle) -> Option<&ColliderCollection> {
        self.collections.get(handle)
    }

    /// Mutable registered collection
    pub fn get_mut(&mut self, handle: CollectionHandle) -> Option<&mut ColliderCollection> {
        self.collections.get_mut(handle)
    }

    /// Iterate registered collections
    pub fn iter(&self) -> impl Iterator<Item = (CollectionHandle, &ColliderCollection)> {
        self.collections.iter()
    }

    /// Number of registered collections
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Whether a `simulate_start` rewind is in progress
    pub fn is_rewinding(&self) -> bool {
        self.rewind_time.is_some()
    }

    /// Time of the rewind in progress
    pub fn rewind_time(&self) -> Option<f64> {
        self.rewind_time
    }

    /// Record every collection's live pose at `time`
    ///
    /// A collection that rejects the frame (out-of-order time) is logged and
    /// skipped. Returns the number of collections recorded. Recording while a
    /// rewind is active would store historical poses and is refused.
    ///
    /// The store interval only restarts when at least one collection took the
    /// frame, so an empty system or a fully rejected tick stays due.
    pub fn record_frame_global(&mut self, time: f64) -> LagResult<usize> {
        if self.is_rewinding() {
            return Err(LagCompensationError::RewindActive);
        }
        let mut recorded = 0;
        for (handle, collection) in &mut self.collections {
            match collection.record_frame_all(time) {
                Ok(()) => recorded += 1,
                Err(e) => log::warn!("Skipping frame for {:?}: {}", handle, e),
            }
        }
        if recorded > 0 {
            self.last_recorded = Some(time);
        }
        Ok(recorded)
    }

    /// Record at `time` if `store_interval` has passed since the last recording
    ///
    /// Returns whether any collection recorded a frame.
    pub fn record_frame_if_due(&mut self, time: f64) -> LagResult<bool> {
        let due = self
            .last_recorded
            .map_or(true, |last| time - last >= self.config.store_interval);
        if !due {
            return Ok(false);
        }
        Ok(self.record_frame_global(time)? > 0)
    }

    /// Whether a rewind to another time owns the cached poses
    fn rewind_conflicts(&self, time: f64, action: &str) -> bool {
        match self.rewind_time {
            Some(active) if active != time => {
                log::warn!("Refusing to {} at t={} while t={} is rewound", action, time, active);
                true
            }
            _ => false,
        }
    }

    fn make_ray(origin: Vec3, direction: Vec3) -> Option<Ray> {
        match Ray::new(origin, direction) {
            Ok(ray) => Some(ray),
            Err(e) => {
                log::debug!("Ignoring cast from {:?}: {}", origin, e);
                None
            }
        }
    }

    /// Nearest hit against the live poses
    ///
    /// Collections in `exclude` are skipped, and each collection's bounding
    /// sphere is tested before its children.
    pub fn raycast_live(
        &self,
        origin: Vec3,
        direction: Vec3,
        range: f32,
        exclude: &[CollectionHandle],
    ) -> Option<CastResult> {
        let ray = Self::make_ray(origin, direction)?;
        self.collections
            .iter()
            .filter(|(handle, _)| !exclude.contains(handle))
            .filter(|(_, collection)| collection.may_hit(&ray, range, PoseSource::Live))
            .filter_map(|(handle, collection)| {
                collection
                    .cast(&ray, range, PoseSource::Live)
                    .map(|(hit, index)| (hit, handle, index))
            })
            .min_by(|a, b| a.0.entry_distance.total_cmp(&b.0.entry_distance))
    }

    /// Nearest hit against the poses at `time`
    ///
    /// Each collection's center is interpolated first for the broad phase;
    /// only collections whose bounding sphere the ray reaches are fully
    /// interpolated (once per time). Live transforms are never modified.
    /// Underflows and refused transitions count as misses for that
    /// collection. While a rewind is active only its own time can be cast
    /// against; any other time returns `None`.
    pub fn raycast_cached(
        &mut self,
        time: f64,
        origin: Vec3,
        direction: Vec3,
        range: f32,
        exclude: &[CollectionHandle],
    ) -> Option<CastResult> {
        if self.rewind_conflicts(time, "cast") {
            return None;
        }
        let ray = Self::make_ray(origin, direction)?;
        let now = self.clock.now();

        let mut best: Option<CastResult> = None;
        for (handle, collection) in &mut self.collections {
            if exclude.contains(&handle) {
                continue;
            }
            if let Err(e) = collection.cache_center(time, now) {
                log::debug!("Collection {:?} skipped at t={}: {}", handle, time, e);
                continue;
            }
            if !collection.may_hit(&ray, range, PoseSource::Cached) {
                continue;
            }
            if let Err(e) = collection.interpolate_all(time, now) {
                log::warn!("Collection {:?} skipped at t={}: {}", handle, time, e);
                continue;
            }
            if let Some((hit, index)) = collection.cast(&ray, range, PoseSource::Cached) {
                if best.map_or(true, |(current, _, _)| hit.entry_distance < current.entry_distance) {
                    best = Some((hit, handle, index));
                }
            }
        }
        best
    }

    /// Interpolate every collection's center at `time` without moving anything
    ///
    /// Returns the number of collections with history at `time`, or zero
    /// when a rewind to another time is active.
    pub fn simulate(&mut self, time: f64) -> usize {
        if self.rewind_conflicts(time, "simulate") {
            return 0;
        }
        let now = self.clock.now();
        let mut cached = 0;
        for (handle, collection) in &mut self.collections {
            match collection.cache_center(time, now) {
                Ok(_) => cached += 1,
                Err(e) => log::debug!("Collection {:?} has no pose at t={}: {}", handle, time, e),
            }
        }
        cached
    }

    /// Begin a rewind to `time`
    ///
    /// Caches every center and disables live collidability everywhere until
    /// collections are committed by [`ColliderCastSystem::raycast_prepare`]
    /// or [`ColliderCastSystem::simulate_fully`]. Rewinds do not nest.
    pub fn simulate_start(&mut self, time: f64) -> LagResult<()> {
        if let Some(active) = self.rewind_time {
            log::warn!("Rewind to t={} requested while t={} is active", time, active);
            return Err(LagCompensationError::RewindActive);
        }
        self.simulate(time);
        for (_, collection) in &mut self.collections {
            collection.set_collidable(false);
        }
        self.rewind_time = Some(time);
        Ok(())
    }

    /// Commit every collection whose cached bounding sphere the ray reaches
    ///
    /// Committed collections become collidable at their historical pose, so
    /// following live casts see them. Returns the number newly committed.
    pub fn raycast_prepare(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        range: f32,
        exclude: &[CollectionHandle],
    ) -> LagResult<usize> {
        let Some(time) = self.rewind_time else {
            return Err(LagCompensationError::IllegalTransition {
                action: "prepare a raycast without simulate_start",
                state: RewindState::Idle,
            });
        };
        let Some(ray) = Self::make_ray(origin, direction) else {
            return Ok(0);
        };
        let now = self.clock.now();

        let mut committed = 0;
        for (handle, collection) in &mut self.collections {
            if exclude.contains(&handle) || collection.state() == RewindState::Committed {
                continue;
            }
            if !collection.may_hit(&ray, range, PoseSource::Cached) {
                continue;
            }
            match collection
                .interpolate_all(time, now)
                .and_then(|()| collection.commit_to_cached())
            {
                Ok(()) => committed += 1,
                Err(e) => log::warn!("Collection {:?} not rewound: {}", handle, e),
            }
        }
        Ok(committed)
    }

    /// Begin a rewind to `time` and commit every collection immediately
    pub fn simulate_fully(&mut self, time: f64) -> LagResult<()> {
        self.simulate_start(time)?;
        let now = self.clock.now();
        for (handle, collection) in &mut self.collections {
            if let Err(e) = collection
                .interpolate_all(time, now)
                .and_then(|()| collection.commit_to_cached())
            {
                log::warn!("Collection {:?} not rewound: {}", handle, e);
            }
        }
        Ok(())
    }

    /// End the rewind, restoring live poses and collidability everywhere
    ///
    /// Safe to call when no rewind is active.
    pub fn simulate_reset(&mut self) {
        for (_, collection) in &mut self.collections {
            collection.reset();
        }
        self.rewind_time = None;
    }

    /// Run `f` with every collection rewound to `time`, then reset
    pub fn with_rewind<R>(&mut self, time: f64, f: impl FnOnce(&mut Self) -> R) -> LagResult<R> {
        self.simulate_start(time)?;
        let result = f(self);
        self.simulate_reset();
        Ok(result)
    }
}
