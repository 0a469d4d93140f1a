//! Triangle mesh collision geometry
//!
//! Meshes are stored in model space and the ray is moved into that space for
//! testing, so the triangles never need to be transformed.

use super::primitives::{CastHit, Intersection, Ray, Triangle};
use crate::error::{LagCompensationError, LagResult};
use crate::foundation::math::{utils, Quat, Vec3};

/// Indexed triangle mesh in model space
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    bounding_radius: f32,
}

impl TriangleMesh {
    /// Build from indexed vertices, three indices per counter-clockwise face
    pub fn from_indexed(vertices: Vec<Vec3>, indices: Vec<u32>) -> LagResult<Self> {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(LagCompensationError::InvalidMesh(format!(
                "index count {} is not a positive multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(LagCompensationError::InvalidMesh(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(LagCompensationError::InvalidMesh("non-finite vertex".to_string()));
        }

        // Furthest vertex from the model origin
        let bounding_radius = indices
            .iter()
            .map(|&i| vertices[i as usize].norm())
            .fold(0.0f32, f32::max);

        Ok(Self {
            vertices,
            indices,
            bounding_radius,
        })
    }

    /// Build from a flat list of faces, one unshared vertex triple each
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> LagResult<Self> {
        let vertices: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let count = u32::try_from(vertices.len())
            .map_err(|_| LagCompensationError::InvalidMesh("too many vertices".to_string()))?;
        Self::from_indexed(vertices, (0..count).collect())
    }

    /// Copy of this mesh with every vertex scaled per axis
    pub fn scaled(&self, scale: &Vec3) -> LagResult<Self> {
        if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(LagCompensationError::InvalidMesh(format!(
                "scale {scale:?} must be finite and non-zero"
            )));
        }
        let vertices = self.vertices.iter().map(|v| v.component_mul(scale)).collect();
        Self::from_indexed(vertices, self.indices.clone())
    }

    /// Model-space vertices
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle indices, three per face
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of faces
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Largest distance of any vertex from the model origin
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Iterate the faces in model space
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).map(|face| {
            Triangle::new(
                self.vertices[face[0] as usize],
                self.vertices[face[1] as usize],
                self.vertices[face[2] as usize],
            )
        })
    }

    /// Intersect `ray` with this mesh placed at `position` / `rotation`
    ///
    /// Faces whose normal points against the ray are entries, the others are
    /// exits. The nearest of each kind wins. Open meshes can report an entry
    /// with no exit, or the reverse.
    pub fn intersect(&self, ray: &Ray, range: f32, position: &Vec3, rotation: &Quat) -> Intersection {
        let inverse = rotation.inverse();
        let local_origin = inverse * (ray.origin - position);
        let local_dir = inverse * ray.direction;

        let mut entry = (f32::INFINITY, Vec3::zeros());
        let mut exit = (f32::INFINITY, Vec3::zeros());

        for triangle in self.triangles() {
            let Some((t, _, _)) = triangle.intersect_ray(&local_origin, &local_dir) else {
                continue;
            };
            let normal = triangle.face_normal();
            let slot = if normal.dot(&local_dir) < 0.0 { &mut entry } else { &mut exit };
            if t < slot.0 {
                *slot = (t, normal);
            }
        }

        let to_world = |normal: Vec3| rotation * utils::safe_normalize(&normal, Vec3::zeros());
        CastHit::from_distances(ray, entry.0, to_world(entry.1), exit.0, to_world(exit.1)).classify(range)
    }
}
