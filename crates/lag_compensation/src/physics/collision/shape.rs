//! Collision shape variants
//!
//! Shapes are stored in local space around their own origin. The pose comes
//! from the owning collider at test time, live or rewound.

use super::capsule::intersect_capsule;
use super::cuboid::intersect_cuboid;
use super::cylinder::intersect_cylinder;
use super::mesh::TriangleMesh;
use super::primitives::{Intersection, Ray};
use super::sphere::intersect_sphere;
use crate::error::{LagCompensationError, LagResult};
use crate::foundation::math::Vec3;
use crate::history::TransformSample;

/// Collision shape types (stored in local space)
///
/// Capsules and cylinders run along the local Y axis; `height` is the full
/// extent along that axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Sphere around the origin
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Cylinder closed by two hemispheres
    Capsule {
        /// Radius of the barrel and hemispheres
        radius: f32,
        /// Tip-to-tip height, at least twice the radius
        height: f32,
    },
    /// Cylinder closed by flat disks
    Cylinder {
        /// Disk radius
        radius: f32,
        /// Distance between the disks
        height: f32,
    },
    /// Box
    Cuboid {
        /// Half size along each local axis
        half_extents: Vec3,
    },
    /// Triangle mesh
    Mesh(TriangleMesh),
}

fn positive(name: &'static str, value: f32) -> LagResult<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LagCompensationError::InvalidShapeParameter { name, value })
    }
}

fn capsule_height(radius: f32, height: f32) -> LagResult<f32> {
    let height = positive("height", height)?;
    if height < 2.0 * radius {
        return Err(LagCompensationError::InvalidShapeParameter { name: "height", value: height });
    }
    Ok(height)
}

fn extents(half_extents: Vec3) -> LagResult<Vec3> {
    positive("half_extents.x", half_extents.x)?;
    positive("half_extents.y", half_extents.y)?;
    positive("half_extents.z", half_extents.z)?;
    Ok(half_extents)
}

impl Shape {
    /// Sphere of `radius`
    pub fn sphere(radius: f32) -> LagResult<Self> {
        Ok(Self::Sphere { radius: positive("radius", radius)? })
    }

    /// Capsule of `radius` and tip-to-tip `height` (at least `2 * radius`)
    pub fn capsule(radius: f32, height: f32) -> LagResult<Self> {
        let radius = positive("radius", radius)?;
        Ok(Self::Capsule { radius, height: capsule_height(radius, height)? })
    }

    /// Cylinder of `radius` and `height`
    pub fn cylinder(radius: f32, height: f32) -> LagResult<Self> {
        Ok(Self::Cylinder {
            radius: positive("radius", radius)?,
            height: positive("height", height)?,
        })
    }

    /// Box with the given half extents
    pub fn cuboid(half_extents: Vec3) -> LagResult<Self> {
        Ok(Self::Cuboid { half_extents: extents(half_extents)? })
    }

    /// Triangle mesh
    pub fn mesh(mesh: TriangleMesh) -> Self {
        Self::Mesh(mesh)
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Cylinder { .. } => "cylinder",
            Self::Cuboid { .. } => "box",
            Self::Mesh(_) => "mesh",
        }
    }

    /// Radius, for round shapes
    pub fn radius(&self) -> Option<f32> {
        match self {
            Self::Sphere { radius } | Self::Capsule { radius, .. } | Self::Cylinder { radius, .. } => {
                Some(*radius)
            }
            Self::Cuboid { .. } | Self::Mesh(_) => None,
        }
    }

    /// Height, for capsules and cylinders
    pub fn height(&self) -> Option<f32> {
        match self {
            Self::Capsule { height, .. } | Self::Cylinder { height, .. } => Some(*height),
            _ => None,
        }
    }

    /// Half extents, for boxes
    pub fn half_extents(&self) -> Option<Vec3> {
        match self {
            Self::Cuboid { half_extents } => Some(*half_extents),
            _ => None,
        }
    }

    /// Change the radius of a round shape
    ///
    /// Fails with `InvalidShapeParameter` for a bad value, or when the shape
    /// has no radius.
    pub fn set_radius(&mut self, value: f32) -> LagResult<()> {
        let value = positive("radius", value)?;
        match self {
            Self::Sphere { radius } | Self::Cylinder { radius, .. } => *radius = value,
            Self::Capsule { radius, height } => {
                capsule_height(value, *height)?;
                *radius = value;
            }
            Self::Cuboid { .. } | Self::Mesh(_) => {
                return Err(LagCompensationError::InvalidShapeParameter { name: "radius", value });
            }
        }
        Ok(())
    }

    /// Change the height of a capsule or cylinder
    pub fn set_height(&mut self, value: f32) -> LagResult<()> {
        match self {
            Self::Capsule { radius, height } => *height = capsule_height(*radius, value)?,
            Self::Cylinder { height, .. } => *height = positive("height", value)?,
            _ => return Err(LagCompensationError::InvalidShapeParameter { name: "height", value }),
        }
        Ok(())
    }

    /// Change the half extents of a box
    pub fn set_half_extents(&mut self, value: Vec3) -> LagResult<()> {
        let Self::Cuboid { half_extents } = self else {
            return Err(LagCompensationError::InvalidShapeParameter {
                name: "half_extents",
                value: value.x,
            });
        };
        *half_extents = extents(value)?;
        Ok(())
    }

    /// Radius of a sphere around the local origin that contains the shape
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Capsule { height, .. } => height * 0.5,
            // Corner of the profile, not just the half height
            Self::Cylinder { radius, height } => (height * 0.5).hypot(*radius),
            Self::Cuboid { half_extents } => half_extents.norm(),
            Self::Mesh(mesh) => mesh.bounding_radius(),
        }
    }

    /// Narrow-phase test of `ray` against this shape placed at `pose`
    pub fn intersect(&self, ray: &Ray, range: f32, pose: &TransformSample) -> Intersection {
        let TransformSample { position, rotation } = pose;
        match self {
            Self::Sphere { radius } => intersect_sphere(ray, range, position, *radius),
            Self::Capsule { radius, height } => {
                intersect_capsule(ray, range, position, rotation, *radius, *height)
            }
            Self::Cylinder { radius, height } => {
                intersect_cylinder(ray, range, position, rotation, *radius, *height)
            }
            Self::Cuboid { half_extents } => intersect_cuboid(ray, range, position, rotation, half_extents),
            Self::Mesh(mesh) => mesh.intersect(ray, range, position, rotation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn test_constructors_validate() {
        assert!(Shape::sphere(0.0).is_err());
        assert!(Shape::sphere(f32::NAN).is_err());
        assert!(Shape::capsule(1.0, 1.5).is_err());
        assert!(Shape::capsule(1.0, 2.0).is_ok());
        assert!(Shape::cylinder(1.0, -2.0).is_err());
        assert!(matches!(
            Shape::cuboid(Vec3::new(1.0, 0.0, 1.0)),
            Err(LagCompensationError::InvalidShapeParameter { name: "half_extents.y", .. })
        ));
    }

    #[test]
    fn test_bounding_radii() {
        assert_relative_eq!(Shape::sphere(2.0).expect("valid").bounding_radius(), 2.0);
        assert_relative_eq!(Shape::capsule(0.5, 3.0).expect("valid").bounding_radius(), 1.5);
        assert_relative_eq!(Shape::cylinder(3.0, 8.0).expect("valid").bounding_radius(), 5.0);
        assert_relative_eq!(
            Shape::cuboid(Vec3::new(1.0, 2.0, 2.0)).expect("valid").bounding_radius(),
            3.0
        );
    }

    #[test]
    fn test_setters_validate_and_apply() {
        let mut capsule = Shape::capsule(0.5, 2.0).expect("valid");
        assert!(capsule.set_radius(1.5).is_err());
        capsule.set_height(4.0).expect("taller");
        capsule.set_radius(1.5).expect("fits now");
        assert_eq!(capsule.radius(), Some(1.5));
        assert_eq!(capsule.height(), Some(4.0));

        let mut cuboid = Shape::cuboid(Vec3::new(1.0, 1.0, 1.0)).expect("valid");
        assert!(cuboid.set_radius(1.0).is_err());
        cuboid.set_half_extents(Vec3::new(2.0, 1.0, 0.5)).expect("valid");
        assert_eq!(cuboid.half_extents(), Some(Vec3::new(2.0, 1.0, 0.5)));
        assert!(cuboid.set_half_extents(Vec3::new(2.0, -1.0, 0.5)).is_err());
    }

    #[test]
    fn test_dispatch_uses_pose() {
        let shape = Shape::sphere(1.0).expect("valid");
        let pose = TransformSample::new(Vec3::new(0.0, 0.0, 10.0), Quat::identity());
        let ray = Ray::new(Vec3::zeros(), Vec3::z()).expect("valid ray");
        let hit = shape.intersect(&ray, 100.0, &pose).hit().expect("hit");
        assert_relative_eq!(hit.entry_distance, 9.0, epsilon = 1e-5);
        assert_eq!(shape.kind(), "sphere");
    }
}
