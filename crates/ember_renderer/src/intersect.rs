//! Scene queries: find what a ray hits.

use crate::grid::Grid;
use crate::mailbox::Mailbox;
use crate::ray::{RayKind, TraceRay};
use ember_core::{Object, Scene, ShaderMode};
use ember_math::Vec3;

/// Read-only view of one frame's scene and acceleration data.
#[derive(Clone, Copy)]
pub struct FrameContext<'s> {
    pub scene: &'s Scene,
    pub grid: Option<&'s Grid>,
    /// Resolved shading tier, never `Auto`
    pub shader: ShaderMode,
    pub clipping: bool,
    /// Unit camera view direction, for planar fog
    pub view: Vec3,
}

impl<'s> FrameContext<'s> {
    pub fn new(scene: &'s Scene, grid: Option<&'s Grid>) -> Self {
        Self {
            scene,
            grid,
            shader: scene.options().shader.resolve(),
            clipping: scene.has_clipping(),
            view: scene.camera.view.normalize_or_zero(),
        }
    }

    /// A camera ray with the frame's full recursion and transparency budgets.
    pub fn primary_ray(&self, origin: Vec3, direction: Vec3) -> TraceRay<'s> {
        TraceRay::new(origin, direction, RayKind::Primary, self.clipping).with_budget(
            self.scene.camera.max_depth,
            self.scene.options().trans_max_surfaces,
        )
    }

    /// An occlusion ray limited to `max_dist`.
    pub fn shadow_ray(&self, origin: Vec3, direction: Vec3, max_dist: f32) -> TraceRay<'s> {
        TraceRay::new(origin, direction, RayKind::Shadow, self.clipping)
            .with_max_dist(max_dist)
            .with_shadow_filtering(self.scene.options().shadow_filtering)
    }

    /// Run one query: unbounded objects first, then the grid or the
    /// bounded list.
    pub fn intersect_objects(&self, ray: &mut TraceRay<'s>, mailbox: &mut Mailbox) {
        ray.reset();
        ray.serial = mailbox.begin_query();

        for object in self.scene.unbounded() {
            test_object(object, ray);
            if ray.finished {
                return;
            }
        }

        match self.grid {
            Some(grid) => grid.intersect(self.scene.bounded(), ray, mailbox),
            None => {
                for object in self.scene.bounded() {
                    test_object(object, ray);
                    if ray.finished {
                        return;
                    }
                }
            }
        }
    }
}

/// Offer every root of `object` along `ray` to the ray's accept policy.
#[inline]
pub(crate) fn test_object<'s>(object: &'s Object, ray: &mut TraceRay<'s>) {
    // Light geometry never occludes
    if ray.kind == RayKind::Shadow && object.material().is_light() {
        return;
    }
    let geom = ray.geom;
    object
        .primitive()
        .intersect(&geom, &mut |t| ray.accept(object, t));
}
