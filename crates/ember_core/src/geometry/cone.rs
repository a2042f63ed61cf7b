use super::{face_forward, Primitive};
use ember_math::{Aabb, Ray, Vec3};

/// An open cone with its tip at `apex`, widening along `axis` to `radius`
/// at `apex + axis`. No base cap; pair it with a [`super::Ring`] for one.
#[derive(Debug, Clone)]
pub struct Cone {
    apex: Vec3,
    axis: Vec3,
    height: f32,
    /// cos² of the half-opening angle
    cos2: f32,
    bbox: Aabb,
}

impl Cone {
    pub fn new(apex: Vec3, axis: Vec3, radius: f32) -> Self {
        let height = axis.length();
        let base = apex + axis;
        let r = Vec3::splat(radius);
        let bbox = Aabb::surrounding(
            &Aabb::from_points(apex, apex),
            &Aabb::from_points(base - r, base + r),
        );
        let slant2 = height * height + radius * radius;
        let cos2 = if slant2 > 0.0 {
            height * height / slant2
        } else {
            1.0
        };

        Self {
            apex,
            axis: axis.normalize_or_zero(),
            height,
            cos2,
            bbox,
        }
    }

    fn on_nappe(&self, ray: &Ray, t: f32) -> bool {
        let h = (ray.at(t) - self.apex).dot(self.axis);
        h >= 0.0 && h <= self.height
    }
}

impl Primitive for Cone {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        let co = ray.origin - self.apex;
        let dv = ray.direction.dot(self.axis);
        let cv = co.dot(self.axis);

        let a = dv * dv - self.cos2 * ray.direction.length_squared();
        let half_b = dv * cv - self.cos2 * ray.direction.dot(co);
        let c = cv * cv - self.cos2 * co.length_squared();

        if a.abs() < 1e-12 {
            // Parallel to the surface: one crossing at most
            if half_b != 0.0 {
                let t = -c / (2.0 * half_b);
                if self.on_nappe(ray, t) {
                    hit(t);
                }
            }
            return;
        }

        let disc = half_b * half_b - a * c;
        if disc < 0.0 {
            return;
        }
        let sqrtd = disc.sqrt();
        for t in [(-half_b - sqrtd) / a, (-half_b + sqrtd) / a] {
            if self.on_nappe(ray, t) {
                hit(t);
            }
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        let w = point - self.apex;
        let h = w.dot(self.axis);
        let n = if h > 0.0 {
            w - self.axis * (w.length_squared() / h)
        } else {
            -self.axis
        };
        face_forward(n.normalize_or_zero(), ray.direction)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn kind(&self) -> &'static str {
        "cone"
    }
}
