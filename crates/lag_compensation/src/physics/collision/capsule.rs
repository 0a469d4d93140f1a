//! Ray against capsule (cylinder closed by two hemispheres)

use super::cylinder::{AxisSegment, Barrel, Region};
use super::primitives::{CastHit, Intersection, Ray};
use super::sphere::{intersect_sphere, sphere_normal, sphere_roots};
use crate::foundation::math::{Quat, Vec3};

/// Intersect `ray` with a capsule of total `height` along its local Y axis
///
/// The hemisphere centers sit `height / 2 - radius` from `center`. A capsule
/// whose height equals its diameter is a sphere and is tested as one.
pub fn intersect_capsule(
    ray: &Ray,
    range: f32,
    center: &Vec3,
    rotation: &Quat,
    radius: f32,
    height: f32,
) -> Intersection {
    let half_length = (height * 0.5 - radius).max(0.0);
    if half_length <= f32::EPSILON {
        return intersect_sphere(ray, range, center, radius);
    }
    let segment = AxisSegment::new(center, rotation, half_length);

    match segment.barrel_roots(ray, radius) {
        Barrel::Miss => Intersection::Miss,
        Barrel::Parallel => {
            let (Some(start), Some(end)) = (
                sphere_roots(ray, &segment.a, radius),
                sphere_roots(ray, &segment.b, radius),
            ) else {
                return Intersection::Miss;
            };
            let (entry, entry_center) = if start.0 <= end.0 {
                (start.0, segment.a)
            } else {
                (end.0, segment.b)
            };
            let (exit, exit_center) = if start.1 >= end.1 {
                (start.1, segment.a)
            } else {
                (end.1, segment.b)
            };
            CastHit::from_distances(
                ray,
                entry,
                sphere_normal(ray, entry, &entry_center, radius),
                exit,
                sphere_normal(ray, exit, &exit_center, radius),
            )
            .classify(range)
        }
        Barrel::Roots(entry, exit) => {
            let entry_region = segment.region(ray, entry);
            let exit_region = segment.region(ray, exit);
            if entry_region != Region::Barrel && entry_region == exit_region {
                // Only one hemisphere can be crossed
                let (cap, _) = segment.end(entry_region);
                return intersect_sphere(ray, range, &cap, radius);
            }

            let entry = match entry_region {
                Region::Barrel => Some((entry, segment.barrel_normal(ray, entry))),
                cap => {
                    let (cap, _) = segment.end(cap);
                    sphere_roots(ray, &cap, radius)
                        .map(|(d, _)| (d, sphere_normal(ray, d, &cap, radius)))
                }
            };
            let exit = match exit_region {
                Region::Barrel => Some((exit, segment.barrel_normal(ray, exit))),
                cap => {
                    let (cap, _) = segment.end(cap);
                    sphere_roots(ray, &cap, radius)
                        .map(|(_, d)| (d, sphere_normal(ray, d, &cap, radius)))
                }
            };

            match (entry, exit) {
                (Some((entry, entry_normal)), Some((exit, exit_normal))) => {
                    CastHit::from_distances(ray, entry, entry_normal, exit, exit_normal)
                        .classify(range)
                }
                _ => Intersection::Miss,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_side_hit_on_barrel() {
        let ray = Ray::new(Vec3::new(0.0, 0.5, -10.0), Vec3::z()).expect("valid ray");
        let hit = intersect_capsule(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), 1.0, 4.0)
            .hit()
            .expect("barrel hit");
        assert_relative_eq!(hit.entry_distance, 9.0, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 11.0, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, -Vec3::z(), epsilon = EPSILON);
    }

    #[test]
    fn test_axial_ray_hits_hemisphere_tips() {
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), -Vec3::y()).expect("valid ray");
        let hit = intersect_capsule(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), 1.0, 4.0)
            .hit()
            .expect("tip hit");
        // Tips at y = +/-2
        assert_relative_eq!(hit.entry_distance, 8.0, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 12.0, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_normal, -Vec3::y(), epsilon = EPSILON);
    }

    #[test]
    fn test_ray_through_upper_hemisphere_only() {
        // Hemisphere center at y=1; ray at y=1.5 stays above the barrel
        let ray = Ray::new(Vec3::new(-10.0, 1.5, 0.0), Vec3::x()).expect("valid ray");
        let hit = intersect_capsule(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), 1.0, 4.0)
            .hit()
            .expect("cap hit");
        let half_chord = (1.0f32 - 0.25).sqrt();
        assert_relative_eq!(hit.entry_distance, 10.0 - half_chord, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 10.0 + half_chord, epsilon = EPSILON);
        assert!(hit.entry_normal.y > 0.0);
    }

    #[test]
    fn test_ray_above_capsule_misses() {
        let ray = Ray::new(Vec3::new(-10.0, 2.5, 0.0), Vec3::x()).expect("valid ray");
        assert_eq!(
            intersect_capsule(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), 1.0, 4.0),
            Intersection::Miss
        );
    }

    #[test]
    fn test_diagonal_ray_enters_barrel_exits_hemisphere() {
        let ray = Ray::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)).expect("valid ray");
        let hit = intersect_capsule(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), 1.0, 4.0)
            .hit()
            .expect("hit");
        assert_relative_eq!(hit.entry_distance, std::f32::consts::SQRT_2, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, -Vec3::x(), epsilon = EPSILON);
        // Leaves through the sphere centered at (0, 1, 0)
        assert_relative_eq!((hit.exit_point - Vec3::new(0.0, 1.0, 0.0)).norm(), 1.0, epsilon = EPSILON);
        assert!(hit.exit_normal.y > 0.0);
    }

    #[test]
    fn test_degenerate_capsule_is_sphere() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::z()).expect("valid ray");
        let hit = intersect_capsule(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), 1.0, 2.0)
            .hit()
            .expect("sphere hit");
        assert_relative_eq!(hit.entry_distance, 4.0, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 6.0, epsilon = EPSILON);
    }

    #[test]
    fn test_far_near_axial_ray_hits_hemispheres() {
        let ray = Ray::new(Vec3::new(1.5, 1000.0, 0.0), Vec3::new(-0.0009, -1.0, 0.0)).expect("valid ray");
        let hit = intersect_capsule(&ray, 2000.0, &Vec3::zeros(), &Quat::identity(), 1.0, 4.0)
            .hit()
            .expect("hemisphere hit");
        // Hemisphere centers at y = +/-1
        assert_relative_eq!((hit.entry_point - Vec3::y()).norm(), 1.0, epsilon = 1e-2);
        assert_relative_eq!((hit.exit_point + Vec3::y()).norm(), 1.0, epsilon = 1e-2);
        assert!(hit.entry_normal.y > 0.5);
        assert!(hit.exit_normal.y < -0.5);
    }
}
