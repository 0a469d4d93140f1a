//! Wireframe line generation for colliders
//!
//! Produces plain line lists; the host renders them with whatever debug
//! drawing facility it has.

use crate::foundation::math::{constants::PI, Vec3, Vec4};
use crate::history::TransformSample;
use crate::physics::collection::ColliderCollection;
use crate::physics::collider::Collider;
use crate::physics::collision::Shape;
use crate::physics::tracker::{PoseSource, Tracker};

/// Segments in a full circle
pub const CIRCLE_STEPS: usize = 16;

/// Segments in a half circle
pub const HALF_CIRCLE_STEPS: usize = 8;

/// Colored line segment in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Start point
    pub start: Vec3,
    /// End point
    pub end: Vec3,
    /// RGBA color
    pub color: Vec4,
}

/// Color scheme for rewind visualization
#[derive(Clone, Debug)]
pub struct RewindDebugColors {
    /// Shapes at their live pose
    pub live: Vec4,
    /// Shapes at their cached historical pose
    pub cached: Vec4,
    /// Collection bounding spheres
    pub bounds: Vec4,
}

impl Default for RewindDebugColors {
    fn default() -> Self {
        Self {
            live: Vec4::new(0.0, 1.0, 0.0, 1.0),    // Green
            cached: Vec4::new(1.0, 0.5, 0.0, 1.0),  // Orange
            bounds: Vec4::new(0.5, 0.8, 1.0, 0.4),  // Light blue, transparent
        }
    }
}

impl RewindDebugColors {
    /// Color for shapes drawn at `source`
    pub fn for_source(&self, source: PoseSource) -> Vec4 {
        match source {
            PoseSource::Live => self.live,
            PoseSource::Cached => self.cached,
        }
    }
}

/// Line list under construction
struct LineBuilder {
    lines: Vec<DebugLine>,
    color: Vec4,
}

impl LineBuilder {
    fn new(color: Vec4) -> Self {
        Self { lines: Vec::new(), color }
    }

    fn line(&mut self, start: Vec3, end: Vec3) {
        self.lines.push(DebugLine { start, end, color: self.color });
    }

    /// Arc of `sweep` radians around `center`, starting along `u` and turning toward `v`
    fn arc(&mut self, center: Vec3, u: Vec3, v: Vec3, radius: f32, sweep: f32, steps: usize) {
        let point = |i: usize| {
            let angle = sweep * i as f32 / steps as f32;
            center + (u * angle.cos() + v * angle.sin()) * radius
        };
        for i in 0..steps {
            self.line(point(i), point(i + 1));
        }
    }

    fn circle(&mut self, center: Vec3, u: Vec3, v: Vec3, radius: f32) {
        self.arc(center, u, v, radius, 2.0 * PI, CIRCLE_STEPS);
    }

    fn half_circle(&mut self, center: Vec3, u: Vec3, v: Vec3, radius: f32) {
        self.arc(center, u, v, radius, PI, HALF_CIRCLE_STEPS);
    }
}

/// Wireframe of `shape` placed at `pose`
pub fn shape_lines(shape: &Shape, pose: &TransformSample, color: Vec4) -> Vec<DebugLine> {
    let mut out = LineBuilder::new(color);
    let x = pose.rotation * Vec3::x();
    let y = pose.rotation * Vec3::y();
    let z = pose.rotation * Vec3::z();
    let center = pose.position;

    match shape {
        Shape::Sphere { radius } => {
            out.circle(center, x, y, *radius);
            out.circle(center, y, z, *radius);
            out.circle(center, z, x, *radius);
        }
        Shape::Capsule { radius, height } => {
            let half = (height * 0.5 - radius).max(0.0);
            let (top, bottom) = (center + y * half, center - y * half);
            out.circle(top, z, x, *radius);
            out.circle(bottom, z, x, *radius);
            for side in [x, -x, z, -z] {
                out.line(bottom + side * *radius, top + side * *radius);
            }
            out.half_circle(top, x, y, *radius);
            out.half_circle(top, z, y, *radius);
            out.half_circle(bottom, x, -y, *radius);
            out.half_circle(bottom, z, -y, *radius);
        }
        Shape::Cylinder { radius, height } => {
            let (top, bottom) = (center + y * (height * 0.5), center - y * (height * 0.5));
            out.circle(top, z, x, *radius);
            out.circle(bottom, z, x, *radius);
            for side in [x, -x, z, -z] {
                out.line(bottom + side * *radius, top + side * *radius);
            }
        }
        Shape::Cuboid { half_extents } => {
            let corner = |sx: f32, sy: f32, sz: f32| {
                pose.transform_point(&Vec3::new(sx * half_extents.x, sy * half_extents.y, sz * half_extents.z))
            };
            for s in [-1.0, 1.0] {
                for t in [-1.0, 1.0] {
                    out.line(corner(-1.0, s, t), corner(1.0, s, t));
                    out.line(corner(s, -1.0, t), corner(s, 1.0, t));
                    out.line(corner(s, t, -1.0), corner(s, t, 1.0));
                }
            }
        }
        Shape::Mesh(mesh) => {
            for triangle in mesh.triangles() {
                let [a, b, c] = [triangle.v0, triangle.v1, triangle.v2].map(|v| pose.transform_point(&v));
                out.line(a, b);
                out.line(b, c);
                out.line(c, a);
            }
        }
    }
    out.lines
}

/// Wireframe of a sphere, as used for bounding volumes
pub fn sphere_lines(center: Vec3, radius: f32, color: Vec4) -> Vec<DebugLine> {
    let mut out = LineBuilder::new(color);
    out.circle(center, Vec3::x(), Vec3::y(), radius);
    out.circle(center, Vec3::y(), Vec3::z(), radius);
    out.circle(center, Vec3::z(), Vec3::x(), radius);
    out.lines
}

/// Wireframe of a collider at `source`; empty when that pose is unavailable
pub fn collider_lines(collider: &Collider, source: PoseSource, colors: &RewindDebugColors) -> Vec<DebugLine> {
    collider
        .pose(source)
        .map(|pose| shape_lines(collider.shape(), &pose, colors.for_source(source)))
        .unwrap_or_default()
}

/// Wireframes of every child plus the collection's bounding sphere at `source`
pub fn collection_lines(
    collection: &ColliderCollection,
    source: PoseSource,
    colors: &RewindDebugColors,
) -> Vec<DebugLine> {
    let mut lines: Vec<DebugLine> = collection
        .colliders()
        .iter()
        .flat_map(|child| collider_lines(child, source, colors))
        .collect();
    if let Some(bounds) = collection.bounding_sphere(source) {
        lines.extend(sphere_lines(bounds.center, bounds.radius, colors.bounds));
    }
    lines
}
