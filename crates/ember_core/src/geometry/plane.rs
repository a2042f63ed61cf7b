use super::{face_forward, Primitive};
use ember_math::{Ray, Vec3};

/// An infinite plane through `point` with normal `normal`. Always unbounded.
#[derive(Debug, Clone)]
pub struct Plane {
    normal: Vec3,
    d: f32,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }
}

impl Primitive for Plane {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        let denom = self.normal.dot(ray.direction);
        if denom != 0.0 {
            hit(-(self.d + self.normal.dot(ray.origin)) / denom);
        }
    }

    fn normal(&self, _point: Vec3, ray: &Ray) -> Vec3 {
        face_forward(self.normal, ray.direction)
    }

    fn kind(&self) -> &'static str {
        "plane"
    }
}
