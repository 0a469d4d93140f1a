//! Collision hierarchy and rewind orchestration
//!
//! Provides the shape intersection library plus the three levels built on
//! it: single colliders, collections sharing a bounding sphere, and the cast
//! system that owns the collections.

pub mod cast_system;
pub mod collection;
pub mod collider;
pub mod collision;
pub mod tracker;

pub use cast_system::{CastResult, ColliderCastSystem, CollectionHandle};
pub use collection::{ColliderCollection, RewindState};
pub use collider::Collider;
pub use collision::{
    BoundingSphere,
    CastHit,
    Intersection,
    Ray,
    Shape,
    Triangle,
    TriangleMesh,
};
pub use tracker::{PoseSource, Tracker};
