//! # Lag Compensation
//!
//! Server-side hit verification against the past. Tracked objects record
//! their pose on a fixed cadence; when a client reports a shot fired at
//! some earlier time, the server rewinds the relevant objects to that time
//! and tests the shot against exact shapes.
//!
//! ## Features
//!
//! - **Pose History**: Bounded per-object transform history with interpolation
//! - **Parametric Casts**: Exact entry and exit points against spheres, capsules,
//!   cylinders, boxes and triangle meshes
//! - **Two-Phase Queries**: Bounding-sphere rejection before narrow-phase tests
//! - **Rewinds**: Lazy cached casts, or full rewinds with automatic restore
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lag_compensation::prelude::*;
//!
//! fn main() -> Result<(), LagCompensationError> {
//!     let mut system = ColliderCastSystem::init(
//!         LagCompensationConfig::default(),
//!         Box::new(SystemClock::new()),
//!     )?;
//!
//!     let pose = TransformSample::from_position(Vec3::new(0.0, 0.0, 10.0));
//!     let mut target = ColliderCollection::new(1.0, pose);
//!     target.add_collider(Collider::new(Shape::sphere(1.0)?, pose));
//!     system.register(target)?;
//!
//!     system.record_frame_global(system.now())?;
//!
//!     let shot_time = system.now() - 0.1;
//!     if let Some((hit, handle, child)) =
//!         system.raycast_cached(shot_time, Vec3::zeros(), Vec3::z(), 100.0, &[])
//!     {
//!         println!("hit {:?}/{} at {}", handle, child, hit.entry_distance);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod debug;
pub mod error;
pub mod foundation;
pub mod history;
pub mod physics;

pub use error::{HistoryError, LagCompensationError, LagResult};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{BoundingRadiusPolicy, Config, ConfigError, LagCompensationConfig},
        error::{HistoryError, LagCompensationError, LagResult},
        foundation::{
            math::{Quat, Vec3},
            time::{Clock, ManualClock, Stopwatch, SystemClock},
        },
        history::{HistoryBuffer, TransformSample},
        physics::{
            BoundingSphere, CastHit, CastResult, Collider, ColliderCastSystem, ColliderCollection, CollectionHandle,
            Intersection, PoseSource, Ray, RewindState, Shape, Tracker, TriangleMesh,
        },
    };
}
