use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box, one [`Interval`] per axis.
///
/// Boxes built through [`Aabb::new`] are never thinner than a small epsilon,
/// so flat primitives still occupy grid cells.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Box spanned by two opposite corners, in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self::new(
            Interval::new(a.x.min(b.x), a.x.max(b.x)),
            Interval::new(a.y.min(b.y), a.y.max(b.y)),
            Interval::new(a.z.min(b.z), a.z.max(b.z)),
        )
    }

    /// Union of two boxes.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Slab for axis `n`; anything past 1 is Z.
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.x.size(), self.y.size(), self.z.size())
    }

    /// True when every bound is a finite number.
    pub fn is_finite(&self) -> bool {
        self.min().is_finite() && self.max().is_finite()
    }

    /// Clip a ray against the box using the slab method.
    ///
    /// Returns the parameter range inside the box, narrowed from `ray_t`,
    /// or `None` when the ray misses.
    pub fn clip(&self, r: &Ray, mut ray_t: Interval) -> Option<Interval> {
        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let orig = r.origin[axis];
            let dir = r.direction[axis];

            if dir == 0.0 {
                // Parallel to the slab: inside or never.
                if orig < slab.min || orig > slab.max {
                    return None;
                }
                continue;
            }

            let adinv = 1.0 / dir;
            let mut t0 = (slab.min - orig) * adinv;
            let mut t1 = (slab.max - orig) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max < ray_t.min {
                return None;
            }
        }

        Some(ray_t)
    }

    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 10.0));

        assert_eq!(aabb.min(), Vec3::ZERO);
        assert_eq!(aabb.max(), Vec3::splat(10.0));
        assert_eq!(aabb.extent(), Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_surrounding_empty() {
        let b = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let s = Aabb::surrounding(&Aabb::EMPTY, &b);
        assert_eq!(s, b);
    }

    #[test]
    fn test_aabb_clip() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let span = aabb.clip(&ray, Interval::new(0.0, 100.0)).unwrap();
        assert!((span.min - 4.0).abs() < 1e-6);
        assert!((span.max - 6.0).abs() < 1e-6);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(aabb.clip(&ray, Interval::new(0.0, 100.0)).is_none());

        // Ray parallel to a slab, outside it
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(aabb.clip(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_aabb_clip_from_inside() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let span = aabb.clip(&ray, Interval::new(0.0, f32::INFINITY)).unwrap();
        assert_eq!(span.min, 0.0);
        assert!((span.max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_aabb_flat_is_padded() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!(aabb.z.size() > 0.0);
        assert!(aabb.is_finite());
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(aabb.centroid(), Vec3::splat(5.0));
    }
}
