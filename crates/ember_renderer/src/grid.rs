//! Uniform grid acceleration structure.
//!
//! Bounded objects are binned into a regular 3D grid sized so that each
//! cell holds about one object. Rays walk the cells they pierce front to
//! back (3D DDA) and stop once the closest accepted hit lies inside the
//! current cell. Objects spanning several cells are de-duplicated through
//! the per-thread [`Mailbox`].

use crate::intersect::test_object;
use crate::mailbox::Mailbox;
use crate::ray::TraceRay;
use ember_core::{Object, RenderOptions};
use ember_math::{Aabb, Interval, Vec3};

/// Upper bound on cells along any axis.
pub const MAX_CELLS_PER_AXIS: usize = 64;

/// Cells with member lists in compressed-row form.
#[derive(Debug, Clone)]
pub struct Grid {
    bounds: Aabb,
    res: [usize; 3],
    cell_size: Vec3,
    /// `offsets[c]..offsets[c + 1]` indexes `members` for cell `c`
    offsets: Vec<u32>,
    /// Indices into the bounded object slice
    members: Vec<u32>,
}

impl Grid {
    /// Build a grid over `objects`, or `None` when bounding is disabled or
    /// there are too few objects to be worth it.
    pub fn build(objects: &[Object], options: &RenderOptions) -> Option<Self> {
        if !options.bounding || objects.len() <= options.bound_threshold {
            return None;
        }

        let bounds = objects
            .iter()
            .filter_map(|o| o.bounding_box())
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b));
        if !bounds.is_finite() {
            return None;
        }

        let extent = bounds.extent();
        let volume = (extent.x * extent.y * extent.z).max(f32::MIN_POSITIVE);
        let k = (objects.len() as f32 / volume).cbrt();
        let res = [0, 1, 2].map(|a| ((extent[a] * k).round() as usize).clamp(1, MAX_CELLS_PER_AXIS));
        let cell_size = extent / Vec3::new(res[0] as f32, res[1] as f32, res[2] as f32);

        let mut grid = Self {
            bounds,
            res,
            cell_size,
            offsets: Vec::new(),
            members: Vec::new(),
        };
        grid.bin(objects);

        log::debug!(
            "Built {}x{}x{} grid: {} objects, {} cell references",
            res[0],
            res[1],
            res[2],
            objects.len(),
            grid.members.len()
        );
        Some(grid)
    }

    /// Fill the cell lists in two passes: count, then scatter.
    fn bin(&mut self, objects: &[Object]) {
        let cells = self.cell_count();
        let mut counts = vec![0u32; cells + 1];

        let ranges: Vec<Option<([usize; 3], [usize; 3])>> = objects
            .iter()
            .map(|o| o.bounding_box().map(|b| (self.cell_of(b.min()), self.cell_of(b.max()))))
            .collect();

        for (lo, hi) in ranges.iter().flatten() {
            self.for_cells(*lo, *hi, |c| counts[c + 1] += 1);
        }
        for c in 0..cells {
            counts[c + 1] += counts[c];
        }

        let mut cursor = counts.clone();
        let mut members = vec![0u32; counts[cells] as usize];
        for (i, range) in ranges.iter().enumerate() {
            if let Some((lo, hi)) = range {
                self.for_cells(*lo, *hi, |c| {
                    members[cursor[c] as usize] = i as u32;
                    cursor[c] += 1;
                });
            }
        }

        self.offsets = counts;
        self.members = members;
    }

    fn for_cells(&self, lo: [usize; 3], hi: [usize; 3], mut f: impl FnMut(usize)) {
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    f(self.index([x, y, z]));
                }
            }
        }
    }

    pub fn resolution(&self) -> [usize; 3] {
        self.res
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn cell_count(&self) -> usize {
        self.res[0] * self.res[1] * self.res[2]
    }

    /// Objects binned into the cell at `cell`.
    pub fn cell(&self, cell: [usize; 3]) -> &[u32] {
        let c = self.index(cell);
        &self.members[self.offsets[c] as usize..self.offsets[c + 1] as usize]
    }

    #[inline]
    fn index(&self, cell: [usize; 3]) -> usize {
        (cell[2] * self.res[1] + cell[1]) * self.res[0] + cell[0]
    }

    /// Cell containing `p`, clamped to the grid.
    fn cell_of(&self, p: Vec3) -> [usize; 3] {
        let min = self.bounds.min();
        [0, 1, 2].map(|a| {
            let c = ((p[a] - min[a]) / self.cell_size[a]).floor();
            (c.max(0.0) as usize).min(self.res[a] - 1)
        })
    }

    /// Walk the cells pierced by `ray`, offering every member object once.
    pub fn intersect<'s>(&self, objects: &'s [Object], ray: &mut TraceRay<'s>, mailbox: &mut Mailbox) {
        let Some(span) = self.bounds.clip(&ray.geom, Interval::new(0.0, ray.max_dist)) else {
            return;
        };

        let origin = ray.geom.origin;
        let dir = ray.geom.direction;
        let min = self.bounds.min();
        let mut cell = self.cell_of(ray.geom.at(span.min));

        let mut step = [0isize; 3];
        let mut t_next = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for a in 0..3 {
            if dir[a] > 0.0 {
                step[a] = 1;
                let boundary = min[a] + (cell[a] + 1) as f32 * self.cell_size[a];
                t_next[a] = (boundary - origin[a]) / dir[a];
                t_delta[a] = self.cell_size[a] / dir[a];
            } else if dir[a] < 0.0 {
                step[a] = -1;
                let boundary = min[a] + cell[a] as f32 * self.cell_size[a];
                t_next[a] = (boundary - origin[a]) / dir[a];
                t_delta[a] = -self.cell_size[a] / dir[a];
            }
        }

        loop {
            for &m in self.cell(cell) {
                let object = &objects[m as usize];
                if mailbox.first_visit(object.id()) {
                    test_object(object, ray);
                }
            }
            if ray.finished {
                return;
            }

            let axis = if t_next[0] < t_next[1] {
                if t_next[0] < t_next[2] { 0 } else { 2 }
            } else if t_next[1] < t_next[2] {
                1
            } else {
                2
            };

            // The closest hit so far lies inside this cell
            if ray.max_dist <= t_next[axis] || t_next[axis] > span.max {
                return;
            }

            let next = cell[axis] as isize + step[axis];
            if next < 0 || next >= self.res[axis] as isize {
                return;
            }
            cell[axis] = next as usize;
            t_next[axis] += t_delta[axis];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::RayKind;
    use ember_core::{Material, Scene, Sphere};
    use ember_math::Color;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn sphere_field(n: usize) -> Scene {
        let mut rng = StdRng::seed_from_u64(42);
        let mut scene = Scene::new();
        let m = Arc::new(Material::new(Color::ONE));
        for _ in 0..n {
            let c = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            scene.add_object(Sphere::new(c, rng.gen_range(0.2..1.5)), m.clone());
        }
        scene
    }

    fn brute_force<'s>(objects: &'s [Object], ray: &mut TraceRay<'s>) {
        for o in objects {
            test_object(o, ray);
        }
    }

    #[test]
    fn test_no_grid_below_threshold() {
        let scene = sphere_field(8);
        assert!(Grid::build(scene.bounded(), scene.options()).is_none());

        let scene = sphere_field(100);
        let mut options = scene.options().clone();
        options.bounding = false;
        assert!(Grid::build(scene.bounded(), &options).is_none());
    }

    #[test]
    fn test_every_object_binned() {
        let scene = sphere_field(200);
        let grid = Grid::build(scene.bounded(), scene.options()).unwrap();
        let res = grid.resolution();
        assert!(res.iter().all(|&r| (1..=MAX_CELLS_PER_AXIS).contains(&r)));

        let mut seen = vec![false; scene.bounded().len()];
        for z in 0..res[2] {
            for y in 0..res[1] {
                for x in 0..res[0] {
                    for &m in grid.cell([x, y, z]) {
                        seen[m as usize] = true;
                    }
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let scene = sphere_field(300);
        let objects = scene.bounded();
        let grid = Grid::build(objects, scene.options()).unwrap();
        let mut mailbox = Mailbox::new(scene.object_count());
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
            );
            let dir = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize();

            let mut fast = TraceRay::new(origin, dir, RayKind::Primary, false);
            mailbox.begin_query();
            grid.intersect(objects, &mut fast, &mut mailbox);

            let mut slow = TraceRay::new(origin, dir, RayKind::Primary, false);
            brute_force(objects, &mut slow);

            let fast_hit = fast.isect.closest.map(|(o, t)| (o.id(), t));
            let slow_hit = slow.isect.closest.map(|(o, t)| (o.id(), t));
            match (fast_hit, slow_hit) {
                (Some((a, ta)), Some((b, tb))) => {
                    assert!((ta - tb).abs() < 1e-3, "t mismatch {ta} vs {tb}");
                    if (ta - tb).abs() > 1e-5 {
                        continue;
                    }
                    assert_eq!(a, b);
                }
                (None, None) => {}
                other => panic!("grid and brute force disagree: {other:?}"),
            }
        }
    }

    #[test]
    fn test_axis_aligned_ray() {
        let scene = sphere_field(50);
        let objects = scene.bounded();
        let grid = Grid::build(objects, scene.options()).unwrap();
        let mut mailbox = Mailbox::new(scene.object_count());

        for o in objects {
            let c = o.bounding_box().unwrap().centroid();
            let mut ray = TraceRay::new(Vec3::new(c.x, c.y, -50.0), Vec3::Z, RayKind::Primary, false);
            mailbox.begin_query();
            grid.intersect(objects, &mut ray, &mut mailbox);
            assert!(ray.isect.num > 0);
        }
    }
}
