//! Closed-form ray intersection for parametric shapes
//!
//! Every routine takes a ray with a unit direction, the cast length and the
//! shape's pose, and reports entry and exit geometry as an [`Intersection`].
//! Degenerate configurations (ray parallel to an axis or slab, zero-length
//! segments, singular denominators) are resolved inside this module and
//! never leak NaN into a [`CastHit`].
//!
//! # Module Organization
//!
//! - [`primitives`] - Ray, hit record, bounding spheres, triangles
//! - [`sphere`], [`capsule`], [`cylinder`], [`cuboid`] - Analytic shapes
//! - [`mesh`] - Indexed triangle meshes
//! - [`shape`] - The [`Shape`] variant type and its dispatch

pub mod capsule;
pub mod cuboid;
pub mod cylinder;
pub mod mesh;
pub mod primitives;
pub mod shape;
pub mod sphere;

// Re-export commonly used types
pub use mesh::TriangleMesh;
pub use primitives::{BoundingSphere, CastHit, Intersection, Ray, Triangle};
pub use shape::Shape;
