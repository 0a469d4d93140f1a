//! Ray against flat-capped cylinder
//!
//! Also hosts the axis-segment helpers shared with the capsule test: both
//! shapes solve the same infinite-cylinder quadratic and only differ in how
//! they close off the ends.

use super::primitives::{CastHit, Intersection, Ray};
use crate::foundation::math::{
    constants::{DIRECTION_EPSILON_SQ, PARALLEL_EPSILON},
    utils, Quat, Vec3,
};

/// Which part of the shape a point projects onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    /// Past the `a` end of the axis
    BelowStart,
    /// Between the two ends
    Barrel,
    /// Past the `b` end of the axis
    BeyondEnd,
}

/// Roots of the infinite cylinder around the axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Barrel {
    /// Line never comes within the radius
    Miss,
    /// Line runs along the axis, inside the radius
    Parallel,
    /// Entry and exit distances
    Roots(f32, f32),
}

/// Axis segment `a -> b` of a capsule or cylinder in world space
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisSegment {
    pub a: Vec3,
    pub b: Vec3,
    pub axis: Vec3,
}

impl AxisSegment {
    /// Segment of `half_length` on each side of `center` along the local Y axis
    pub fn new(center: &Vec3, rotation: &Quat, half_length: f32) -> Self {
        let axis = rotation * Vec3::y();
        Self {
            a: center - axis * half_length,
            b: center + axis * half_length,
            axis,
        }
    }

    /// Remove the axial component of `v`
    fn perpendicular(&self, v: &Vec3) -> Vec3 {
        v - self.axis * v.dot(&self.axis)
    }

    /// Solve `|perp(o + s*d - a)|^2 = r^2` for `s`
    ///
    /// Only a direction with no measurable perpendicular component counts as
    /// parallel. Its offset from the axis is taken at the closest approach,
    /// not at the ray origin.
    pub fn barrel_roots(&self, ray: &Ray, radius: f32) -> Barrel {
        let w = self.perpendicular(&(ray.origin - self.a));
        let v = self.perpendicular(&ray.direction);

        let a = v.norm_squared();
        let b = 2.0 * v.dot(&w);
        let c = w.norm_squared() - radius * radius;

        if a < DIRECTION_EPSILON_SQ {
            let mid = (self.a + self.b) * 0.5;
            let (on_ray, on_axis) =
                utils::closest_points_on_lines(&ray.origin, &ray.direction, &mid, &self.axis);
            let offset_sq = (on_ray - on_axis).norm_squared();
            return if offset_sq > radius * radius {
                Barrel::Miss
            } else {
                Barrel::Parallel
            };
        }

        let entry = utils::quadratic_root(a, b, c, false);
        let exit = utils::quadratic_root(a, b, c, true);
        if entry.is_nan() || exit.is_nan() {
            return Barrel::Miss;
        }
        Barrel::Roots(entry, exit)
    }

    /// Region the point `distance` along `ray` projects onto
    pub fn region(&self, ray: &Ray, distance: f32) -> Region {
        let t = utils::t_along_line(&self.a, &self.b, &ray.point_at(distance));
        if t < 0.0 {
            Region::BelowStart
        } else if t > 1.0 {
            Region::BeyondEnd
        } else {
            Region::Barrel
        }
    }

    /// Outward barrel normal at the point `distance` along `ray`
    pub fn barrel_normal(&self, ray: &Ray, distance: f32) -> Vec3 {
        let radial = self.perpendicular(&(ray.point_at(distance) - self.a));
        utils::safe_normalize(&radial, self.perpendicular(&-ray.direction))
    }

    /// End point and outward axial direction for a cap region
    pub fn end(&self, region: Region) -> (Vec3, Vec3) {
        match region {
            Region::BelowStart => (self.a, -self.axis),
            Region::Barrel | Region::BeyondEnd => (self.b, self.axis),
        }
    }
}

/// Crossing of the cap disk at `end` with outward `normal`
fn disk_crossing(ray: &Ray, end: &Vec3, normal: &Vec3, radius: f32) -> Option<f32> {
    let along = ray.direction.dot(normal);
    if along.abs() < PARALLEL_EPSILON {
        return None;
    }
    let distance = (end - ray.origin).dot(normal) / along;
    // Tolerate rounding at the rim
    let limit = radius * radius * (1.0 + 1e-3);
    ((ray.point_at(distance) - end).norm_squared() <= limit).then_some(distance)
}

/// Resolve one barrel root to its final distance and normal
fn resolve(
    segment: &AxisSegment,
    ray: &Ray,
    radius: f32,
    distance: f32,
) -> Option<(f32, Vec3)> {
    match segment.region(ray, distance) {
        Region::Barrel => Some((distance, segment.barrel_normal(ray, distance))),
        cap => {
            let (end, normal) = segment.end(cap);
            disk_crossing(ray, &end, &normal, radius).map(|d| (d, normal))
        }
    }
}

/// Intersect `ray` with a cylinder of `height` along its local Y axis
pub fn intersect_cylinder(
    ray: &Ray,
    range: f32,
    center: &Vec3,
    rotation: &Quat,
    radius: f32,
    height: f32,
) -> Intersection {
    let segment = AxisSegment::new(center, rotation, height * 0.5);

    match segment.barrel_roots(ray, radius) {
        Barrel::Miss => Intersection::Miss,
        Barrel::Parallel => {
            let (first, second) = if ray.direction.dot(&segment.axis) > 0.0 {
                (Region::BelowStart, Region::BeyondEnd)
            } else {
                (Region::BeyondEnd, Region::BelowStart)
            };
            let (entry_end, entry_normal) = segment.end(first);
            let (exit_end, exit_normal) = segment.end(second);
            let along = ray.direction.dot(&segment.axis);
            let entry = (entry_end - ray.origin).dot(&segment.axis) / along;
            let exit = (exit_end - ray.origin).dot(&segment.axis) / along;
            CastHit::from_distances(ray, entry, entry_normal, exit, exit_normal).classify(range)
        }
        Barrel::Roots(entry, exit) => {
            let entry_region = segment.region(ray, entry);
            if entry_region != Region::Barrel && entry_region == segment.region(ray, exit) {
                // The chord inside the infinite cylinder lies past one end
                return Intersection::Miss;
            }
            let (Some((entry, entry_normal)), Some((exit, exit_normal))) = (
                resolve(&segment, ray, radius, entry),
                resolve(&segment, ray, radius, exit),
            ) else {
                return Intersection::Miss;
            };
            CastHit::from_distances(ray, entry, entry_normal, exit, exit_normal).classify(range)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn upright() -> Quat {
        Quat::identity()
    }

    #[test]
    fn test_side_hit_on_barrel() {
        let ray = Ray::new(Vec3::new(-10.0, 0.5, 0.0), Vec3::x()).expect("valid ray");
        let hit = intersect_cylinder(&ray, 100.0, &Vec3::zeros(), &upright(), 1.0, 4.0)
            .hit()
            .expect("barrel hit");
        assert_relative_eq!(hit.entry_distance, 9.0, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 11.0, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, -Vec3::x(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_normal, Vec3::x(), epsilon = EPSILON);
    }

    #[test]
    fn test_diagonal_ray_enters_barrel_exits_cap() {
        // Enters the side at y=1, leaves through the top disk at y=2
        let ray = Ray::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)).expect("valid ray");
        let hit = intersect_cylinder(&ray, 100.0, &Vec3::zeros(), &upright(), 1.0, 4.0)
            .hit()
            .expect("hit");
        let sqrt2 = std::f32::consts::SQRT_2;
        assert_relative_eq!(hit.entry_distance, sqrt2, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, -Vec3::x(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 2.0 * sqrt2, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_point, Vec3::new(0.0, 2.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_axial_ray_passes_through_both_caps() {
        let ray = Ray::new(Vec3::new(0.2, 10.0, 0.0), -Vec3::y()).expect("valid ray");
        let hit = intersect_cylinder(&ray, 100.0, &Vec3::zeros(), &upright(), 1.0, 4.0)
            .hit()
            .expect("cap hit");
        assert_relative_eq!(hit.entry_distance, 8.0, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_distance, 12.0, epsilon = EPSILON);
        assert_relative_eq!(hit.exit_normal, -Vec3::y(), epsilon = EPSILON);
    }

    #[test]
    fn test_far_near_axial_ray_hits_caps() {
        // Starts outside the radius but drifts inside before reaching the top disk
        let ray = Ray::new(Vec3::new(1.5, 1000.0, 0.0), Vec3::new(-0.0009, -1.0, 0.0)).expect("valid ray");
        let segment = AxisSegment::new(&Vec3::zeros(), &upright(), 2.0);
        assert!(matches!(segment.barrel_roots(&ray, 1.0), Barrel::Roots(_, _)));

        let hit = intersect_cylinder(&ray, 2000.0, &Vec3::zeros(), &upright(), 1.0, 4.0)
            .hit()
            .expect("cap hit");
        assert_relative_eq!(hit.entry_normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(hit.exit_normal, -Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(hit.entry_point.y, 2.0, epsilon = 1e-2);
        assert_relative_eq!(hit.entry_point.x, 0.6, epsilon = 1e-2);
        assert!(hit.exit_distance > hit.entry_distance);
    }

    #[test]
    fn test_parallel_ray_offset_uses_closest_approach() {
        let segment = AxisSegment::new(&Vec3::zeros(), &upright(), 2.0);
        let inside = Ray::new(Vec3::new(0.5, 10.0, 0.0), -Vec3::y()).expect("valid ray");
        let outside = Ray::new(Vec3::new(0.0, 10.0, 1.5), -Vec3::y()).expect("valid ray");
        assert_eq!(segment.barrel_roots(&inside, 1.0), Barrel::Parallel);
        assert_eq!(segment.barrel_roots(&outside, 1.0), Barrel::Miss);
    }

    #[test]
    fn test_axial_ray_outside_radius_misses() {
        let ray = Ray::new(Vec3::new(3.0, 10.0, 0.0), -Vec3::y()).expect("valid ray");
        assert_eq!(
            intersect_cylinder(&ray, 100.0, &Vec3::zeros(), &upright(), 1.0, 4.0),
            Intersection::Miss
        );
    }

    #[test]
    fn test_ray_passing_above_top_misses() {
        let ray = Ray::new(Vec3::new(-10.0, 3.0, 0.0), Vec3::x()).expect("valid ray");
        assert_eq!(
            intersect_cylinder(&ray, 100.0, &Vec3::zeros(), &upright(), 1.0, 4.0),
            Intersection::Miss
        );
    }

    #[test]
    fn test_rotated_cylinder_lies_along_x() {
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
        let center = Vec3::new(0.0, 0.0, 5.0);
        // Axis now along -X; a ray down the X axis enters through a cap
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 5.0), Vec3::x()).expect("valid ray");
        let hit = intersect_cylinder(&ray, 100.0, &center, &rotation, 1.0, 4.0)
            .hit()
            .expect("cap hit");
        assert_relative_eq!(hit.entry_distance, 8.0, epsilon = EPSILON);
        assert_relative_eq!(hit.entry_normal, -Vec3::x(), epsilon = EPSILON);
    }
}
