//! Ray against oriented box

use super::primitives::{CastHit, Intersection, Ray};
use crate::foundation::math::{constants::PARALLEL_EPSILON, Quat, Vec3};

/// Outward local-space normal of the face nearest to `local`
///
/// Picks the axis whose coordinate is closest to its half extent: X when it
/// is strictly closest, else Y when strictly closest, else Z.
pub(crate) fn face_normal(local: &Vec3, half_extents: &Vec3) -> Vec3 {
    let gap = |i: usize| half_extents[i] - local[i].abs();
    let (gx, gy, gz) = (gap(0), gap(1), gap(2));

    let axis = if gx < gy && gx < gz {
        0
    } else if gy < gx && gy < gz {
        1
    } else {
        2
    };

    let mut normal = Vec3::zeros();
    normal[axis] = local[axis].signum();
    normal
}

/// Intersect `ray` with a box of `half_extents` centered at `center`
///
/// The ray is moved into box space and clipped against the three slabs. The
/// surviving interval gives both the entry and the exit distance.
pub fn intersect_cuboid(
    ray: &Ray,
    range: f32,
    center: &Vec3,
    rotation: &Quat,
    half_extents: &Vec3,
) -> Intersection {
    let inverse = rotation.inverse();
    let local_origin = inverse * (ray.origin - center);
    let local_dir = inverse * ray.direction;

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for i in 0..3 {
        let origin_i = local_origin[i];
        let dir_i = local_dir[i];
        let extent = half_extents[i];

        if dir_i.abs() < PARALLEL_EPSILON {
            // Ray parallel to slab
            if origin_i < -extent || origin_i > extent {
                return Intersection::Miss;
            }
        } else {
            let inv_dir = 1.0 / dir_i;
            let t1 = (-extent - origin_i) * inv_dir;
            let t2 = (extent - origin_i) * inv_dir;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return Intersection::Miss;
            }
        }
    }

    // All three slabs parallel: only possible for a non-unit direction
    if !t_min.is_finite() || !t_max.is_finite() {
        return Intersection::Miss;
    }

    let entry_local = local_origin + local_dir * t_min;
    let exit_local = local_origin + local_dir * t_max;
    CastHit::from_distances(
        ray,
        t_min,
        rotation * face_normal(&entry_local, half_extents),
        t_max,
        rotation * face_normal(&exit_local, half_extents),
    )
    .classify(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_unit_box_face_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::z()).expect("valid ray");
        let hit = intersect_cuboid(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), &Vec3::new(1.0, 1.0, 1.0))
            .hit()
            .expect("face hit");
        assert_relative_eq!(hit.entry_point, Vec3::new(0.0, 0.0, 1.0), epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, Vec3::z(), epsilon = EPSILON);
        assert_relative_eq!(hit.entry_distance, 4.0, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_point, Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_normal, -Vec3::z(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 6.0, epsilon = EPSILON);
    }

    #[test]
    fn test_rotated_box_normal_in_world_space() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_4);
        let center = Vec3::new(0.0, 0.0, -10.0);
        let ray = Ray::new(Vec3::zeros(), -Vec3::z()).expect("valid ray");
        let hit = intersect_cuboid(&ray, 100.0, &center, &rotation, &Vec3::new(1.0, 1.0, 1.0))
            .hit()
            .expect("edge-on hit");
        // Diamond cross-section: the leading edge is sqrt(2) in front of the center
        assert_relative_eq!(hit.entry_distance, 10.0 - std::f32::consts::SQRT_2, epsilon = 1e-4);
        assert_relative_eq!(hit.entry_normal.norm(), 1.0, epsilon = EPSILON);
        assert!(hit.entry_normal.z > 0.0);
    }

    #[test]
    fn test_parallel_ray_outside_slab_misses() {
        let ray = Ray::new(Vec3::new(2.0, 0.0, 5.0), -Vec3::z()).expect("valid ray");
        assert_eq!(
            intersect_cuboid(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), &Vec3::new(1.0, 1.0, 1.0)),
            Intersection::Miss
        );
    }

    #[test]
    fn test_origin_inside_box_is_out_of_range() {
        let ray = Ray::new(Vec3::zeros(), Vec3::x()).expect("valid ray");
        match intersect_cuboid(&ray, 100.0, &Vec3::zeros(), &Quat::identity(), &Vec3::new(2.0, 1.0, 1.0)) {
            Intersection::OutOfRange(hit) => {
                assert_relative_eq!(hit.entry_distance, -2.0, epsilon = EPSILON);
                assert_relative_eq!(hit.exit_distance, 2.0, epsilon = EPSILON);
                assert_relative_eq!(hit.exit_normal, Vec3::x(), epsilon = EPSILON);
            }
            other => panic!("expected out of range, got {other:?}"),
        }
    }

    #[test]
    fn test_face_normal_tie_break() {
        let half = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(face_normal(&Vec3::new(-1.0, 0.0, 0.0), &half), -Vec3::x());
        assert_eq!(face_normal(&Vec3::new(0.0, 1.0, 0.0), &half), Vec3::y());
        // Corner: no axis is strictly closest
        assert_eq!(face_normal(&Vec3::new(1.0, 1.0, 1.0), &half), Vec3::z());
    }
}
