//! Ray against sphere

use super::primitives::{CastHit, Intersection, Ray};
use crate::foundation::math::Vec3;

/// Entry and exit distances of `ray`'s line through the sphere
///
/// Measured from the closest approach to `center`, so a far origin does not
/// lose the chord to cancellation. `None` when the line misses.
pub(crate) fn sphere_roots(ray: &Ray, center: &Vec3, radius: f32) -> Option<(f32, f32)> {
    let midpoint = ray.closest_approach(center);
    let offset_sq = (ray.point_at(midpoint) - center).norm_squared();
    let half_chord_sq = radius * radius - offset_sq;
    if half_chord_sq < 0.0 {
        return None;
    }
    let half_chord = half_chord_sq.sqrt();
    Some((midpoint - half_chord, midpoint + half_chord))
}

/// Outward normal of the sphere at the point `distance` along `ray`
pub(crate) fn sphere_normal(ray: &Ray, distance: f32, center: &Vec3, radius: f32) -> Vec3 {
    (ray.point_at(distance) - center) / radius
}

/// Intersect `ray` with a sphere
pub fn intersect_sphere(ray: &Ray, range: f32, center: &Vec3, radius: f32) -> Intersection {
    let Some((entry, exit)) = sphere_roots(ray, center, radius) else {
        return Intersection::Miss;
    };
    CastHit::from_distances(
        ray,
        entry,
        sphere_normal(ray, entry, center, radius),
        exit,
        sphere_normal(ray, exit, center, radius),
    )
    .classify(range)
}
