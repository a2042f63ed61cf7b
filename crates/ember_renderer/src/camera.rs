//! Camera ray generation.
//!
//! [`CameraRig`] is derived from a [`CameraDef`] once per frame. It holds
//! the orthonormal basis and the per-pixel image-plane deltas, so each
//! primary ray is a cheap linear combination.

use crate::intersect::FrameContext;
use crate::sampling::jitter_offset2;
use crate::shade::Scratch;
use ember_core::{CameraDef, Frustum, Projection};
use ember_math::{Color, Ray, Vec2, Vec3};

#[derive(Debug, Clone)]
pub struct CameraRig {
    projection: Projection,
    center: Vec3,
    view: Vec3,
    right: Vec3,
    up: Vec3,
    frustum: Frustum,
    /// Lower-left image-plane corner. A direction from `center` for
    /// perspective, an absolute point for orthographic and DOF.
    lowleft: Vec3,
    /// World-space step of one pixel along the image rows and columns
    plane_right: Vec3,
    plane_up: Vec3,
    /// Fisheye angle per pixel
    angle_step: Vec2,
    width: u32,
    height: u32,
    aa_samples: u32,
    aperture: f32,
}

impl CameraRig {
    pub fn new(def: &CameraDef, width: u32, height: u32) -> Self {
        let view = def.view.normalize_or_zero();
        let right = def.up.cross(def.view).normalize_or_zero();
        let up = def.view.cross(right).normalize_or_zero();

        let (sx, sy) = (width as f32, height as f32);
        let frustum = def.frustum.unwrap_or_else(|| {
            let px = ((sx / sy) / def.aspect) / def.zoom;
            let py = 1.0 / def.zoom;
            Frustum {
                left: -0.5 * px,
                right: 0.5 * px,
                bottom: -0.5 * py,
                top: 0.5 * py,
            }
        });

        let projcent = match def.projection {
            Projection::Orthographic => def.center,
            _ => def.center + def.focal_length * view,
        };
        let corner = projcent + frustum.left * right + frustum.bottom * up;
        let lowleft = match def.projection {
            Projection::Perspective => corner - def.center,
            _ => corner,
        };

        let px = frustum.right - frustum.left;
        let py = frustum.top - frustum.bottom;

        Self {
            projection: def.projection,
            center: def.center,
            view,
            right,
            up,
            frustum,
            lowleft,
            plane_right: px * right / sx,
            plane_up: py * up / sy,
            angle_step: Vec2::new(px / sx, py / sy),
            width,
            height,
            aa_samples: def.aa_samples,
            aperture: def.aperture,
        }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Camera basis `(right, up, view)`.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.right, self.up, self.view)
    }

    /// Image-plane coordinates of a pixel center. Row 0 is the top row.
    pub fn pixel_center(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(x as f32 + 0.5, (self.height - 1 - y) as f32 + 0.5)
    }

    /// Ray through image-plane point `p` with the eye at the lens center.
    pub fn primary(&self, p: Vec2) -> Ray {
        match self.projection {
            Projection::Perspective => {
                let dir = self.lowleft + p.x * self.plane_right + p.y * self.plane_up;
                Ray::new(self.center, dir.normalize_or_zero())
            }
            Projection::Orthographic => {
                let origin = self.lowleft + p.x * self.plane_right + p.y * self.plane_up;
                Ray::new(origin, self.view)
            }
            Projection::Fisheye => {
                let ax = self.frustum.left + p.x * self.angle_step.x;
                let ay = self.frustum.bottom + p.y * self.angle_step.y;
                let dir = ay.cos() * (ax.cos() * self.view + ax.sin() * self.right) + ay.sin() * self.up;
                Ray::new(self.center, dir)
            }
            Projection::PerspectiveDof => self.dof(p, Vec2::ZERO),
        }
    }

    /// Depth-of-field ray with the eye moved by `aperture_jitter` (each
    /// component in [-0.5, 0.5)) across the lens.
    pub fn dof(&self, p: Vec2, aperture_jitter: Vec2) -> Ray {
        let dx = aperture_jitter.x * self.aperture * self.width as f32;
        let dy = aperture_jitter.y * self.aperture * self.height as f32;
        let origin = self.center + dx * self.plane_right + dy * self.plane_up;
        let target = self.lowleft + p.x * self.plane_right + p.y * self.plane_up;
        Ray::new(origin, (target - origin).normalize_or_zero())
    }

    /// Shade pixel `(x, y)`: one centered sample plus `aa_samples`
    /// jittered ones, box filtered.
    pub fn sample_pixel<'s>(
        &self,
        ctx: &FrameContext<'s>,
        x: u32,
        y: u32,
        scratch: &mut Scratch,
    ) -> Color {
        scratch.begin_pixel(x, y);
        let p = self.pixel_center(x, y);
        let mut col = shoot(ctx, self.primary(p), scratch);
        if self.aa_samples == 0 {
            return col;
        }

        for _ in 0..self.aa_samples {
            let ray = if self.projection == Projection::PerspectiveDof {
                let lens = jitter_offset2(&mut scratch.jitter);
                let offset = jitter_offset2(&mut scratch.jitter);
                self.dof(p + offset, lens)
            } else {
                let offset = jitter_offset2(&mut scratch.jitter);
                self.primary(p + offset)
            };
            col += shoot(ctx, ray, scratch);
        }
        col * (1.0 / (self.aa_samples as f32 + 1.0))
    }
}

fn shoot<'s>(ctx: &FrameContext<'s>, ray: Ray, scratch: &mut Scratch) -> Color {
    let mut primary = ctx.primary_ray(ray.origin, ray.direction);
    ctx.trace(&mut primary, scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Background, Scene};

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let def = CameraDef::new().with_position(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), Vec3::Y);
        let rig = CameraRig::new(&def, 32, 32);
        let (r, u, v) = rig.basis();
        for a in [r, u, v] {
            assert!((a.length() - 1.0).abs() < 1e-5);
        }
        assert!(r.dot(u).abs() < 1e-5);
        assert!(r.dot(v).abs() < 1e-5);
        assert!(u.dot(v).abs() < 1e-5);
    }

    #[test]
    fn test_perspective_center_pixel_looks_forward() {
        let def = CameraDef::new().with_position(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::Y);
        let rig = CameraRig::new(&def, 65, 65);
        let ray = rig.primary(rig.pixel_center(32, 32));
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, -5.0));
        assert!(close(ray.direction, Vec3::Z));
    }

    #[test]
    fn test_row_zero_is_top() {
        let rig = CameraRig::new(&CameraDef::new(), 16, 16);
        let top = rig.primary(rig.pixel_center(8, 0));
        let bottom = rig.primary(rig.pixel_center(8, 15));
        assert!(top.direction.y > 0.0);
        assert!(bottom.direction.y < 0.0);

        let left = rig.primary(rig.pixel_center(0, 8));
        assert!(left.direction.x < 0.0);
    }

    #[test]
    fn test_zoom_narrows_view() {
        let wide = CameraRig::new(&CameraDef::new(), 16, 16);
        let narrow = CameraRig::new(&CameraDef::new().with_zoom(4.0, 1.0), 16, 16);
        let a = wide.primary(wide.pixel_center(0, 0)).direction;
        let b = narrow.primary(narrow.pixel_center(0, 0)).direction;
        assert!(b.dot(Vec3::Z) > a.dot(Vec3::Z));
    }

    #[test]
    fn test_explicit_frustum() {
        let def = CameraDef::new().with_frustum(0.0, 1.0, 0.0, 1.0);
        let rig = CameraRig::new(&def, 10, 10);
        // Everything lands in the upper-right quadrant
        for (x, y) in [(0, 0), (9, 9), (0, 9), (9, 0)] {
            let d = rig.primary(rig.pixel_center(x, y)).direction;
            assert!(d.x > 0.0 && d.y > 0.0);
        }
    }

    #[test]
    fn test_orthographic_rays_are_parallel() {
        let def = CameraDef::new()
            .with_projection(Projection::Orthographic)
            .with_position(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::Y);
        let rig = CameraRig::new(&def, 9, 9);
        let a = rig.primary(rig.pixel_center(0, 0));
        let b = rig.primary(rig.pixel_center(8, 8));
        assert_eq!(a.direction, Vec3::Z);
        assert_eq!(b.direction, Vec3::Z);
        assert_ne!(a.origin, b.origin);

        let c = rig.primary(rig.pixel_center(4, 4));
        assert!(close(c.origin, Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn test_fisheye_center_and_edges() {
        let def = CameraDef::new().with_projection(Projection::Fisheye);
        let rig = CameraRig::new(&def, 33, 33);
        let c = rig.primary(rig.pixel_center(16, 16)).direction;
        assert!(close(c, Vec3::Z));

        let edge = rig.primary(rig.pixel_center(32, 16)).direction;
        assert!((edge.length() - 1.0).abs() < 1e-5);
        assert!(edge.x > 0.0);
    }

    #[test]
    fn test_dof_without_aperture_matches_perspective() {
        let base = CameraDef::new().with_position(Vec3::new(1.0, 2.0, -3.0), Vec3::Z, Vec3::Y);
        let persp = CameraRig::new(&base, 20, 20);
        let dof = CameraRig::new(
            &base.clone().with_projection(Projection::PerspectiveDof).with_dof(1.0, 0.0),
            20,
            20,
        );
        for (x, y) in [(0, 0), (5, 13), (19, 19)] {
            let p = persp.primary(persp.pixel_center(x, y));
            let d = dof.dof(dof.pixel_center(x, y), Vec2::new(0.3, -0.2));
            assert!(close(p.origin, d.origin));
            assert!(close(p.direction, d.direction));
        }
    }

    #[test]
    fn test_dof_rays_converge_on_focal_plane() {
        let def = CameraDef::new()
            .with_projection(Projection::PerspectiveDof)
            .with_dof(4.0, 0.01);
        let rig = CameraRig::new(&def, 20, 20);
        let p = rig.pixel_center(10, 10);
        let a = rig.dof(p, Vec2::new(-0.5, 0.0));
        let b = rig.dof(p, Vec2::new(0.4, 0.3));
        assert_ne!(a.origin, b.origin);

        // Both pass through the same point on the plane z = 4
        let ta = (4.0 - a.origin.z) / a.direction.z;
        let tb = (4.0 - b.origin.z) / b.direction.z;
        assert!(close(a.at(ta), b.at(tb)));
    }

    #[test]
    fn test_antialiasing_averages_samples() {
        let mut scene = Scene::new();
        scene.background = Background::Solid(Color::new(0.25, 0.5, 0.75));
        scene.camera = scene.camera.clone().with_antialiasing(4);
        let ctx = FrameContext::new(&scene, None);
        let rig = CameraRig::new(&scene.camera, 8, 8);
        let mut scratch = Scratch::new(0, 42);

        let col = rig.sample_pixel(&ctx, 3, 3, &mut scratch);
        assert!(close(col, Color::new(0.25, 0.5, 0.75)));
    }
}
