//! Math utilities and types
//!
//! Provides the fundamental vector and rotation types used by the collision
//! routines, plus the line helpers shared by the broad and narrow phases.

pub use nalgebra::{
    Vector3,
    Vector4,
    UnitQuaternion,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type, used for RGBA colors
pub type Vec4 = Vector4<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Smallest squared length treated as a usable direction
    pub const DIRECTION_EPSILON_SQ: f32 = 1e-12;

    /// Tolerance for singular denominators in the intersection routines
    pub const PARALLEL_EPSILON: f32 = 1e-6;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Normalize `v`, or return `fallback` when `v` is too short to normalize
    pub fn safe_normalize(v: &Vec3, fallback: Vec3) -> Vec3 {
        let norm = v.norm();
        if norm > 1e-10 { v / norm } else { fallback }
    }

    /// Parameter along the line `a -> b` of the point closest to `p`
    ///
    /// `0` maps to `a` and `1` maps to `b`. For a unit direction `d`, the value
    /// for `(o, o + d)` is the signed distance along the ray.
    pub fn t_along_line(a: &Vec3, b: &Vec3, p: &Vec3) -> f32 {
        let ab = b - a;
        let len_sq = ab.norm_squared();
        if len_sq < constants::DIRECTION_EPSILON_SQ {
            return 0.0;
        }
        (p - a).dot(&ab) / len_sq
    }

    /// Squared shortest distance between point `p` and the line through `o` along `d`
    pub fn squared_distance_point_line(p: &Vec3, o: &Vec3, d: &Vec3) -> f32 {
        // https://mathworld.wolfram.com/Point-LineDistance3-Dimensional.html
        let len_sq = d.norm_squared();
        if len_sq < constants::DIRECTION_EPSILON_SQ {
            return (p - o).norm_squared();
        }
        d.cross(&(o - p)).norm_squared() / len_sq
    }

    /// Closest points between two infinite lines `p1 + s * d1` and `p2 + t * d2`
    ///
    /// Nearly parallel lines pair `p2` with its projection onto the first line.
    pub fn closest_points_on_lines(p1: &Vec3, d1: &Vec3, p2: &Vec3, d2: &Vec3) -> (Vec3, Vec3) {
        let d1 = safe_normalize(d1, Vec3::x());
        let d2 = safe_normalize(d2, Vec3::x());

        let r = p1 - p2;
        let b = d1.dot(&d2);
        let d = d1.dot(&r);
        let e = d2.dot(&r);
        let denominator = 1.0 - b * b;

        let (s, t) = if denominator.abs() > constants::PARALLEL_EPSILON {
            ((b * e - d) / denominator, (e - b * d) / denominator)
        } else {
            (-d, 0.0)
        };

        (p1 + d1 * s, p2 + d2 * t)
    }

    /// One root of `a*x^2 + b*x + c = 0`
    ///
    /// Returns the larger root when `positive` is set, the smaller otherwise
    /// (`a` must be positive). A negative discriminant or `a` below
    /// [`constants::DIRECTION_EPSILON_SQ`] yields NaN; callers must check
    /// with `is_nan` before using the value.
    ///
    /// Both roots come from `q = -(b + sign(b) * sqrt(disc)) / 2` as `q / a`
    /// and `c / q`, which stays accurate when `a` is tiny.
    pub fn quadratic_root(a: f32, b: f32, c: f32, positive: bool) -> f32 {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 || a < constants::DIRECTION_EPSILON_SQ {
            return f32::NAN;
        }
        let q = -0.5 * (b + b.signum() * discriminant.sqrt());
        let first = q / a;
        let second = if q == 0.0 { first } else { c / q };
        if positive {
            first.max(second)
        } else {
            first.min(second)
        }
    }
}
