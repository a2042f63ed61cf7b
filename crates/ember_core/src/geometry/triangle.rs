//! Triangle primitives.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! Construction rejects degenerate triangles so the renderer never has to.

use super::{face_forward, Primitive};
use crate::{SceneError, SceneResult};
use ember_math::{Aabb, Ray, Vec3, EPSILON};

/// Shared vertex data and intersection routine.
#[derive(Debug, Clone)]
struct TriangleCore {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    bbox: Aabb,
}

impl TriangleCore {
    fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> SceneResult<Self> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let edge3 = v2 - v1;

        // Reject triangles with any edge too short to produce a stable normal
        if edge1.length() < EPSILON || edge2.length() < EPSILON || edge3.length() < EPSILON {
            return Err(SceneError::DegenerateTriangle { v0, v1, v2 });
        }
        if edge1.cross(edge2).length() < EPSILON * EPSILON {
            return Err(SceneError::DegenerateTriangle { v0, v1, v2 });
        }

        let bbox = Aabb::surrounding(&Aabb::from_points(v0, v1), &Aabb::from_points(v0, v2));

        Ok(Self {
            v0,
            edge1,
            edge2,
            bbox,
        })
    }

    /// Returns (t, u, v) for a hit on the triangle's plane inside its edges.
    fn hit(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some((f * self.edge2.dot(q), u, v))
    }

    /// Barycentric (u, v) of a point assumed to lie on the triangle plane.
    fn barycentric(&self, p: Vec3) -> (f32, f32) {
        let d = p - self.v0;
        let d00 = self.edge1.dot(self.edge1);
        let d01 = self.edge1.dot(self.edge2);
        let d11 = self.edge2.dot(self.edge2);
        let d20 = d.dot(self.edge1);
        let d21 = d.dot(self.edge2);
        let denom = d00 * d11 - d01 * d01;
        let u = (d11 * d20 - d01 * d21) / denom;
        let v = (d00 * d21 - d01 * d20) / denom;
        (u, v)
    }
}

/// A flat-shaded triangle.
#[derive(Debug, Clone)]
pub struct Triangle {
    core: TriangleCore,
    normal: Vec3,
}

impl Triangle {
    /// Create a triangle, or fail if it is degenerate.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> SceneResult<Self> {
        let core = TriangleCore::new(v0, v1, v2)?;
        let normal = core.edge1.cross(core.edge2).normalize();
        Ok(Self { core, normal })
    }
}

impl Primitive for Triangle {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        if let Some((t, _, _)) = self.core.hit(ray) {
            hit(t);
        }
    }

    fn normal(&self, _point: Vec3, ray: &Ray) -> Vec3 {
        face_forward(self.normal, ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.core.bbox)
    }

    fn kind(&self) -> &'static str {
        "triangle"
    }
}

/// A triangle with per-vertex normals, interpolated across the face.
#[derive(Debug, Clone)]
pub struct SmoothTriangle {
    core: TriangleCore,
    n0: Vec3,
    n1: Vec3,
    n2: Vec3,
}

impl SmoothTriangle {
    pub fn new(v: [Vec3; 3], n: [Vec3; 3]) -> SceneResult<Self> {
        let core = TriangleCore::new(v[0], v[1], v[2])?;
        Ok(Self {
            core,
            n0: n[0].normalize_or_zero(),
            n1: n[1].normalize_or_zero(),
            n2: n[2].normalize_or_zero(),
        })
    }
}

impl Primitive for SmoothTriangle {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        if let Some((t, _, _)) = self.core.hit(ray) {
            hit(t);
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        let (u, v) = self.core.barycentric(point);
        let n = (self.n0 * (1.0 - u - v) + self.n1 * u + self.n2 * v).normalize_or_zero();
        face_forward(n, ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.core.bbox)
    }

    fn kind(&self) -> &'static str {
        "smooth triangle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_triangle_hit() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        let mut hits = Vec::new();
        tri.intersect(&ray, &mut |t| hits.push(t));

        assert_eq!(hits.len(), 1);
        assert!((hits[0] - 2.0).abs() < 1e-5);
        assert_eq!(tri.normal(ray.at(2.0), &ray), -Vec3::Z);
    }

    #[test]
    fn test_triangle_miss_outside_edges() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(2.0, 2.0, -2.0), Vec3::Z);
        let mut count = 0;
        tri.intersect(&ray, &mut |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let result = Triangle::new(p, p + Vec3::splat(1e-6), Vec3::ZERO);
        assert!(matches!(result, Err(SceneError::DegenerateTriangle { .. })));

        // Collinear vertices
        let result = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_smooth_triangle_interpolates() {
        let tri = SmoothTriangle::new(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec3::Z, Vec3::Z, (Vec3::Z + Vec3::Y).normalize()],
        )
        .unwrap();
        let ray = Ray::new(Vec3::new(0.1, 0.1, 1.0), -Vec3::Z);

        // Near v0 the normal is close to +Z
        let n = tri.normal(Vec3::new(0.01, 0.01, 0.0), &ray);
        assert!(n.z > 0.99);

        // At v2 it tilts toward +Y
        let n = tri.normal(Vec3::Y, &ray);
        assert!(n.y > 0.5);
    }
}
