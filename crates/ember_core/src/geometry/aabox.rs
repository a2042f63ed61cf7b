use super::{face_forward, Primitive};
use ember_math::{Aabb, Interval, Ray, Vec3};

/// An axis-aligned solid box.
#[derive(Debug, Clone)]
pub struct AxisBox {
    bounds: Aabb,
}

impl AxisBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            bounds: Aabb::from_points(min, max),
        }
    }
}

impl Primitive for AxisBox {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        if let Some(span) = self.bounds.clip(ray, Interval::UNIVERSE) {
            hit(span.min);
            hit(span.max);
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        // Pick the face whose plane the point lies closest to.
        let center = self.bounds.centroid();
        let half = self.bounds.extent() * 0.5;
        let local = (point - center) / half;
        let a = local.abs();

        let n = if a.x >= a.y && a.x >= a.z {
            Vec3::new(local.x.signum(), 0.0, 0.0)
        } else if a.y >= a.z {
            Vec3::new(0.0, local.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, local.z.signum())
        };
        face_forward(n, ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bounds)
    }

    fn kind(&self) -> &'static str {
        "box"
    }
}
