use super::{face_forward, Primitive};
use ember_math::{Aabb, Ray, Vec3};

/// A flat annulus: the part of a plane between two radii around `center`.
#[derive(Debug, Clone)]
pub struct Ring {
    center: Vec3,
    normal: Vec3,
    inner: f32,
    outer: f32,
}

impl Ring {
    pub fn new(center: Vec3, normal: Vec3, inner: f32, outer: f32) -> Self {
        Self {
            center,
            normal: normal.normalize_or_zero(),
            inner: inner.min(outer).max(0.0),
            outer: outer.max(inner),
        }
    }
}

impl Primitive for Ring {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        let denom = self.normal.dot(ray.direction);
        if denom == 0.0 {
            return;
        }
        let t = self.normal.dot(self.center - ray.origin) / denom;
        let dist = (ray.at(t) - self.center).length();
        if dist >= self.inner && dist <= self.outer {
            hit(t);
        }
    }

    fn normal(&self, _point: Vec3, ray: &Ray) -> Vec3 {
        face_forward(self.normal, ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let r = Vec3::splat(self.outer);
        Some(Aabb::from_points(self.center - r, self.center + r))
    }

    fn kind(&self) -> &'static str {
        "ring"
    }
}
