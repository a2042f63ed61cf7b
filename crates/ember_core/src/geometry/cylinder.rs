//! Open cylinders (no end caps).

use super::{face_forward, Primitive};
use ember_math::{Aabb, Ray, Vec3};

/// Roots of a ray against the infinite cylinder around `axis` (unit) through `base`.
fn cylinder_roots(base: Vec3, axis: Vec3, radius: f32, ray: &Ray) -> Option<(f32, f32)> {
    let oc = ray.origin - base;
    let d_perp = ray.direction - ray.direction.dot(axis) * axis;
    let o_perp = oc - oc.dot(axis) * axis;

    let a = d_perp.length_squared();
    if a < 1e-12 {
        // Parallel to the axis
        return None;
    }
    let half_b = d_perp.dot(o_perp);
    let c = o_perp.length_squared() - radius * radius;
    let disc = half_b * half_b - a * c;
    if disc <= 0.0 {
        return None;
    }
    let sqrtd = disc.sqrt();
    Some(((-half_b - sqrtd) / a, (-half_b + sqrtd) / a))
}

fn radial_normal(base: Vec3, axis: Vec3, point: Vec3) -> Vec3 {
    let v = point - base;
    (v - v.dot(axis) * axis).normalize_or_zero()
}

/// An infinitely long cylinder. Unbounded.
#[derive(Debug, Clone)]
pub struct Cylinder {
    base: Vec3,
    axis: Vec3,
    radius: f32,
}

impl Cylinder {
    pub fn new(base: Vec3, axis: Vec3, radius: f32) -> Self {
        Self {
            base,
            axis: axis.normalize_or_zero(),
            radius,
        }
    }
}

impl Primitive for Cylinder {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        if let Some((t1, t2)) = cylinder_roots(self.base, self.axis, self.radius, ray) {
            hit(t1);
            hit(t2);
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        face_forward(radial_normal(self.base, self.axis, point), ray.direction)
    }

    fn kind(&self) -> &'static str {
        "cylinder"
    }
}

/// A cylinder running from `base` to `base + axis`.
#[derive(Debug, Clone)]
pub struct FiniteCylinder {
    base: Vec3,
    axis: Vec3,
    height: f32,
    radius: f32,
    bbox: Aabb,
}

impl FiniteCylinder {
    pub fn new(base: Vec3, axis: Vec3, radius: f32) -> Self {
        let height = axis.length();
        let top = base + axis;
        let r = Vec3::splat(radius);
        let bbox = Aabb::surrounding(
            &Aabb::from_points(base - r, base + r),
            &Aabb::from_points(top - r, top + r),
        );

        Self {
            base,
            axis: axis.normalize_or_zero(),
            height,
            radius,
            bbox,
        }
    }
}

impl Primitive for FiniteCylinder {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        let Some((t1, t2)) = cylinder_roots(self.base, self.axis, self.radius, ray) else {
            return;
        };
        for t in [t1, t2] {
            let h = (ray.at(t) - self.base).dot(self.axis);
            if h >= 0.0 && h <= self.height {
                hit(t);
            }
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        face_forward(radial_normal(self.base, self.axis, point), ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn kind(&self) -> &'static str {
        "finite cylinder"
    }
}
