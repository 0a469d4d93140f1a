//! Primitive collision types shared by every intersection routine
//!
//! Provides the ray, the entry/exit hit record, the three-way intersection
//! outcome, bounding spheres for the broad phase and triangles for meshes.

use crate::error::{LagCompensationError, LagResult};
use crate::foundation::math::{constants::DIRECTION_EPSILON_SQ, utils, Vec3};

/// A ray with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray, normalizing `direction`
    ///
    /// A zero-length or non-finite direction is a [`LagCompensationError::DegenerateRay`].
    pub fn new(origin: Vec3, direction: Vec3) -> LagResult<Self> {
        let len_sq = direction.norm_squared();
        if !len_sq.is_finite() || len_sq < DIRECTION_EPSILON_SQ || !origin.iter().all(|c| c.is_finite()) {
            return Err(LagCompensationError::DegenerateRay);
        }
        Ok(Self {
            origin,
            direction: direction / len_sq.sqrt(),
        })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Signed distance along the ray to the point closest to `point`
    pub fn closest_approach(&self, point: &Vec3) -> f32 {
        (point - self.origin).dot(&self.direction)
    }

    /// Squared distance from `point` to the infinite line carrying the ray
    pub fn squared_distance_to(&self, point: &Vec3) -> f32 {
        utils::squared_distance_point_line(point, &self.origin, &self.direction)
    }
}

/// Entry and exit of a ray through a closed surface
///
/// Distances default to `+inf`, meaning that side was not hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Point where the ray enters the surface
    pub entry_point: Vec3,
    /// Outward surface normal at the entry point
    pub entry_normal: Vec3,
    /// Distance along the ray to the entry point
    pub entry_distance: f32,
    /// Point where the ray leaves the surface
    pub exit_point: Vec3,
    /// Outward surface normal at the exit point
    pub exit_normal: Vec3,
    /// Distance along the ray to the exit point
    pub exit_distance: f32,
}

impl Default for CastHit {
    fn default() -> Self {
        Self {
            entry_point: Vec3::zeros(),
            entry_normal: Vec3::zeros(),
            entry_distance: f32::INFINITY,
            exit_point: Vec3::zeros(),
            exit_normal: Vec3::zeros(),
            exit_distance: f32::INFINITY,
        }
    }
}

impl CastHit {
    /// Build a hit from entry/exit distances along `ray` and their normals
    ///
    /// Non-finite distances leave the matching point at its default.
    pub fn from_distances(
        ray: &Ray,
        entry_distance: f32,
        entry_normal: Vec3,
        exit_distance: f32,
        exit_normal: Vec3,
    ) -> Self {
        let mut hit = Self::default();
        if entry_distance.is_finite() {
            hit.entry_distance = entry_distance;
            hit.entry_point = ray.point_at(entry_distance);
            hit.entry_normal = entry_normal;
        }
        if exit_distance.is_finite() {
            hit.exit_distance = exit_distance;
            hit.exit_point = ray.point_at(exit_distance);
            hit.exit_normal = exit_normal;
        }
        hit
    }

    /// A hit counts iff the entry is finite and inside `[0, range]`
    pub fn is_valid(&self, range: f32) -> bool {
        self.entry_distance.is_finite() && self.entry_distance >= 0.0 && self.entry_distance <= range
    }

    /// Sort this hit into [`Intersection`] for a cast of length `range`
    pub fn classify(self, range: f32) -> Intersection {
        if self.is_valid(range) {
            Intersection::Hit(self)
        } else if self.entry_distance.is_finite() || self.exit_distance.is_finite() {
            Intersection::OutOfRange(self)
        } else {
            Intersection::Miss
        }
    }
}

/// Outcome of a narrow-phase test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    /// The ray's line never touches the surface
    Miss,
    /// The surface is crossed, but not inside `[0, range]` (behind the origin,
    /// too far, or the origin is already inside)
    OutOfRange(CastHit),
    /// Valid hit
    Hit(CastHit),
}

impl Intersection {
    /// The hit, if valid
    pub fn hit(self) -> Option<CastHit> {
        match self {
            Self::Hit(hit) => Some(hit),
            Self::Miss | Self::OutOfRange(_) => None,
        }
    }

    /// Whether the surface was crossed at all, in range or not
    pub fn any(&self) -> bool {
        !matches!(self, Self::Miss)
    }
}

/// A bounding sphere for broad-phase rejection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether the infinite line carrying `ray` passes within the sphere
    pub fn intersects_line(&self, ray: &Ray) -> bool {
        ray.squared_distance_to(&self.center) <= self.radius * self.radius
    }

    /// Whether the sphere can touch the segment `[0, range]` of the ray
    ///
    /// Compares the closest-approach parameter against `[-radius, range + radius]`.
    pub fn within_range(&self, ray: &Ray, range: f32) -> bool {
        let t = ray.closest_approach(&self.center);
        t >= -self.radius && t <= range + self.radius
    }

    /// Broad-phase gate: line test, then range test
    pub fn may_hit(&self, ray: &Ray, range: f32) -> bool {
        self.intersects_line(ray) && self.within_range(ray, range)
    }

    /// Whether `other` fits entirely inside this sphere
    pub fn contains(&self, other: &Self) -> bool {
        (other.center - self.center).norm() + other.radius <= self.radius
    }
}

/// A triangle for mesh intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Triangle vertices in mesh space
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized face normal (right-hand rule, counter-clockwise front)
    pub fn face_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    ///
    /// Both faces are hit. Only hits at `t >= 0` are reported.
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by Möller & Trumbore
    pub fn intersect_ray(&self, origin: &Vec3, direction: &Vec3) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle, or degenerate triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        (t >= 0.0).then_some((t, u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 3.0, 4.0)).expect("valid ray");
        assert_relative_eq!(ray.direction.norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(ray.point_at(5.0), Vec3::new(0.0, 3.0, 4.0), epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_ray_rejected() {
        assert!(matches!(
            Ray::new(Vec3::zeros(), Vec3::zeros()),
            Err(LagCompensationError::DegenerateRay)
        ));
        assert!(Ray::new(Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 1.0)).is_err());
        assert!(Ray::new(Vec3::new(f32::INFINITY, 0.0, 0.0), Vec3::x()).is_err());
    }

    #[test]
    fn test_default_hit_is_invalid() {
        let hit = CastHit::default();
        assert!(!hit.is_valid(f32::MAX));
        assert_eq!(hit.classify(100.0), Intersection::Miss);
    }

    #[test]
    fn test_classify_by_range() {
        let ray = Ray::new(Vec3::zeros(), Vec3::z()).expect("valid ray");
        let hit = CastHit::from_distances(&ray, 5.0, -Vec3::z(), 7.0, Vec3::z());
        assert!(matches!(hit.classify(10.0), Intersection::Hit(_)));
        assert!(matches!(hit.classify(4.0), Intersection::OutOfRange(_)));
        assert!(hit.classify(4.0).any());
        assert!(hit.classify(4.0).hit().is_none());

        let behind = CastHit::from_distances(&ray, -3.0, -Vec3::z(), -1.0, Vec3::z());
        assert!(matches!(behind.classify(10.0), Intersection::OutOfRange(_)));
    }

    #[test]
    fn test_bounding_sphere_gates() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 1.0, 10.0), 2.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::z()).expect("valid ray");
        assert!(sphere.intersects_line(&ray));
        assert!(sphere.within_range(&ray, 8.5));
        assert!(!sphere.within_range(&ray, 7.0));

        let behind = BoundingSphere::new(Vec3::new(0.0, 0.0, -3.0), 2.0);
        assert!(behind.intersects_line(&ray));
        assert!(!behind.may_hit(&ray, 100.0));

        let off_axis = BoundingSphere::new(Vec3::new(5.0, 0.0, 10.0), 2.0);
        assert!(!off_axis.intersects_line(&ray));
    }

    #[test]
    fn test_bounding_sphere_contains() {
        let outer = BoundingSphere::new(Vec3::zeros(), 3.0);
        assert!(outer.contains(&BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0)));
        assert!(!outer.contains(&BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 2.0)));
    }

    #[test]
    fn test_triangle_hit_from_both_sides() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let (t, _, _) = tri
            .intersect_ray(&Vec3::new(0.0, 0.0, 5.0), &-Vec3::z())
            .expect("front side");
        assert_relative_eq!(t, 5.0, epsilon = EPSILON);
        let (t, _, _) = tri
            .intersect_ray(&Vec3::new(0.0, 0.0, -2.0), &Vec3::z())
            .expect("back side");
        assert_relative_eq!(t, 2.0, epsilon = EPSILON);
        assert!(tri.intersect_ray(&Vec3::new(0.0, 0.0, 5.0), &Vec3::z()).is_none());
        assert!(tri.face_normal().z > 0.0);
    }
}
