//! Sphere primitive.

use super::{face_forward, Primitive};
use ember_math::{Aabb, Ray, Vec3};

/// A sphere given by center and radius.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Both roots of a unit-direction ray against a sphere, nearest first.
pub(crate) fn sphere_roots(center: Vec3, radius: f32, ray: &Ray) -> Option<(f32, f32)> {
    let v = center - ray.origin;
    let b = v.dot(ray.direction);
    let disc = b * b + radius * radius - v.length_squared();
    if disc <= 0.0 {
        return None;
    }
    let disc = disc.sqrt();
    Some((b - disc, b + disc))
}

impl Primitive for Sphere {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        if let Some((t1, t2)) = sphere_roots(self.center, self.radius, ray) {
            hit(t1);
            hit(t2);
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        face_forward((point - self.center).normalize_or_zero(), ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn kind(&self) -> &'static str {
        "sphere"
    }
}
