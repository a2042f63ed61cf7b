//! Shading pipeline.
//!
//! Four quality tiers share one entry point, [`FrameContext::trace`]:
//!
//! - **Lowest**: white where anything is hit, black elsewhere
//! - **Low**: unlit surface color
//! - **Medium**: lighting, highlights, reflection and transmission
//! - **Full**: Medium plus shadow rays and ambient occlusion
//!
//! Shading of a hit may spawn child rays (shadow, reflection,
//! transmission, AO). They all reuse the calling worker's [`Scratch`].

use crate::intersect::FrameContext;
use crate::mailbox::Mailbox;
use crate::ray::{RayKind, TraceRay};
use crate::sampling::jitter_sphere;
use ember_core::{Material, PhongMode, PhongType, ShaderMode};
use ember_math::{reflect, Color, Vec3, EPSILON, FHUGE, MINCONTRIB};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::PI;

/// Seed of the ambient occlusion stream.
const AO_SEED: u64 = 0x5eed_a0;

/// Per-worker mutable state reused across every ray the worker traces.
#[derive(Debug, Clone)]
pub struct Scratch {
    pub mailbox: Mailbox,
    /// Ambient occlusion stream, seeded from the pixel coordinates
    pub rng: StdRng,
    /// Antialiasing and aperture jitter stream
    pub jitter: StdRng,
}

impl Scratch {
    pub fn new(objects: usize, seed: u64) -> Self {
        Self {
            mailbox: Mailbox::new(objects),
            rng: StdRng::seed_from_u64(AO_SEED),
            jitter: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the jitter stream so repeated frames sample identically.
    pub fn reseed(&mut self, seed: u64) {
        self.jitter = StdRng::seed_from_u64(seed);
    }

    /// Seed the AO stream for pixel `(x, y)`. The directions depend only on
    /// the pixel, never on which worker or node shades it.
    pub fn begin_pixel(&mut self, x: u32, y: u32) {
        self.rng = StdRng::seed_from_u64(pixel_seed(x, y));
    }
}

/// SplitMix64 finalizer over the packed pixel coordinates.
fn pixel_seed(x: u32, y: u32) -> u64 {
    let mut z = AO_SEED ^ ((u64::from(y) << 32) | u64::from(x));
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl<'s> FrameContext<'s> {
    /// Color seen along `ray`. A ray with no depth left sees only the background.
    pub fn trace(&self, ray: &mut TraceRay<'s>, scratch: &mut Scratch) -> Color {
        if ray.depth == 0 {
            return self.background(ray);
        }
        self.intersect_objects(ray, &mut scratch.mailbox);
        self.shade(ray, scratch)
    }

    /// Shade a ray whose query has already run.
    fn shade(&self, ray: &mut TraceRay<'s>, scratch: &mut Scratch) -> Color {
        match self.shader {
            ShaderMode::Lowest => {
                if ray.isect.num > 0 {
                    Color::ONE
                } else {
                    Color::ZERO
                }
            }
            ShaderMode::Low => self.shade_unlit(ray),
            ShaderMode::Medium => self.shade_lit(ray, scratch, false),
            ShaderMode::Full | ShaderMode::Auto => self.shade_lit(ray, scratch, true),
        }
    }

    pub fn background(&self, ray: &TraceRay<'s>) -> Color {
        self.scene.background.color(&ray.geom)
    }

    fn shade_unlit(&self, ray: &mut TraceRay<'s>) -> Color {
        match ray.isect.closest {
            Some((object, t)) => {
                ray.optic_dist = FHUGE;
                object.material().color_at(ray.geom.at(t), &ray.geom)
            }
            None => self.background(ray),
        }
    }

    /// Lit shading. `full` enables shadow rays and ambient occlusion.
    fn shade_lit(&self, ray: &mut TraceRay<'s>, scratch: &mut Scratch, full: bool) -> Color {
        let fog = &self.scene.fog;
        let Some((object, t)) = ray.isect.closest else {
            let col = self.background(ray);
            // Radial fog covers the background, planar fog does not
            if fog.is_on() && fog.kind == ember_core::FogType::Radial {
                return fog.apply(col, FHUGE);
            }
            return col;
        };

        let material = object.material();
        let hit = ray.geom.at(t);
        ray.optic_dist += t;
        let normal = object.primitive().normal(hit, &ray.geom);

        // Out of transparent surfaces: pass straight through
        if material.opacity < 1.0 && ray.trans_budget < 1 {
            return self.transmission(ray, hit, 1.0, scratch);
        }

        let mut col = material.color_at(hit, &ray.geom);
        if material.is_light() {
            return col;
        }

        let options = self.scene.options();
        let mut diffuse = Color::ZERO;
        let mut phong = Color::ZERO;
        let mut ambient_occlusion = Color::ZERO;

        if material.diffuse > MINCONTRIB || material.phong > MINCONTRIB {
            for light in self.scene.lights() {
                let sample = light.shade_diffuse(hit, normal);
                let mut inten = options.light_scale * sample.intensity;
                if inten <= MINCONTRIB {
                    continue;
                }

                if full {
                    let mut shadow = self.shadow_ray(hit, sample.direction, sample.distance);
                    self.intersect_objects(&mut shadow, &mut scratch.mailbox);
                    if shadow.is_occluded() {
                        continue;
                    }
                    inten *= shadow.isect.shadow_filter;
                }

                diffuse += light.color() * inten;

                if material.phong > MINCONTRIB {
                    let value = options.light_scale
                        * self.specular(ray.geom.direction, normal, sample.direction, material.phong_exp);
                    let tint = match material.phong_type {
                        PhongType::Metal => col,
                        PhongType::Plastic => light.color(),
                    };
                    phong += tint * (value * material.phong);
                }
            }

            if full && self.scene.ambient_occlusion.samples > 0 {
                ambient_occlusion = self.ambient_occlusion(hit, normal, scratch);
            }
        }

        diffuse += ambient_occlusion;
        diffuse *= diffuse_scale(material, normal, ray.geom.direction);

        col *= diffuse + Color::splat(material.ambient);

        if material.phong > MINCONTRIB {
            col += phong;
        }

        if material.specular > MINCONTRIB {
            col += self.reflection(ray, hit, normal, material.specular, scratch);
        }

        if material.opacity < 1.0 - MINCONTRIB {
            let mut alpha = material.opacity;
            if options.trans_mode.union(material.trans_mode).raster3d {
                alpha = 1.0 + (PI * (1.0 - alpha) * normal.dot(ray.geom.direction)).cos();
                alpha = alpha * alpha * 0.25;
            }
            let transmitted = self.transmission(ray, hit, 1.0 - alpha, scratch);
            if options.trans_mode.vmd {
                col *= alpha;
            }
            col += transmitted;
        }

        if fog.is_on() {
            col = self.fog(ray, col, t);
        }
        col
    }

    /// Monte Carlo ambient occlusion over the hemisphere around `normal`.
    fn ambient_occlusion(&self, hit: Vec3, normal: Vec3, scratch: &mut Scratch) -> Color {
        let ao = &self.scene.ambient_occlusion;
        // Uniform hemisphere sampling integrates cos to 0.5
        let light_scale = 2.0 / ao.samples as f32;
        let origin = hit + normal * EPSILON;

        let mut inten = 0.0;
        for _ in 0..ao.samples {
            let mut dir = jitter_sphere(&mut scratch.rng);
            let mut ndotl = dir.dot(normal);
            if ndotl < 0.0 {
                ndotl = -ndotl;
                dir = -dir;
            }

            let mut probe = self.shadow_ray(origin, dir, FHUGE);
            self.intersect_objects(&mut probe, &mut scratch.mailbox);
            if !probe.is_occluded() {
                inten += ndotl * probe.isect.shadow_filter;
            }
        }
        ao.color * (light_scale * inten)
    }

    fn reflection(
        &self,
        ray: &TraceRay<'s>,
        hit: Vec3,
        normal: Vec3,
        specular: f32,
        scratch: &mut Scratch,
    ) -> Color {
        if ray.depth <= 1 {
            return self.background(ray);
        }
        let dir = reflect(ray.geom.direction, normal);
        let mut child = self.child_ray(ray, hit, dir, ray.trans_budget);
        self.intersect_objects(&mut child, &mut scratch.mailbox);
        self.shade(&mut child, scratch) * specular
    }

    fn transmission(&self, ray: &TraceRay<'s>, hit: Vec3, trans: f32, scratch: &mut Scratch) -> Color {
        if ray.depth <= 1 {
            return self.background(ray);
        }
        let mut child = self.child_ray(ray, hit, ray.geom.direction, ray.trans_budget.saturating_sub(1));
        self.intersect_objects(&mut child, &mut scratch.mailbox);
        self.shade(&mut child, scratch) * trans
    }

    /// Secondary ray one depth level below `parent`, nudged off the surface.
    fn child_ray(&self, parent: &TraceRay<'s>, hit: Vec3, dir: Vec3, trans_budget: u32) -> TraceRay<'s> {
        let mut child = TraceRay::new(hit + dir * EPSILON, dir, RayKind::Regular, self.clipping)
            .with_budget(parent.depth - 1, trans_budget);
        child.optic_dist = parent.optic_dist;
        child
    }

    /// Highlight strength for unit view direction `d`, normal `n` and light direction `l`.
    pub fn specular(&self, d: Vec3, n: Vec3, l: Vec3, exponent: f32) -> f32 {
        match self.scene.options().phong {
            PhongMode::Blinn => {
                let h = l - d;
                let inten = n.dot(h);
                if inten > MINCONTRIB {
                    (inten / h.length()).powf(exponent)
                } else {
                    0.0
                }
            }
            PhongMode::BlinnFast => {
                let h = l - d;
                let inten = n.dot(h);
                if inten > 0.0 {
                    let x = inten / h.length();
                    x / (exponent - exponent * x + x)
                } else {
                    0.0
                }
            }
            PhongMode::Phong => {
                let r = reflect(-l, n).normalize_or_zero();
                let inten = (-d).dot(r);
                if inten > 0.0 {
                    inten.powf(exponent)
                } else {
                    0.0
                }
            }
            PhongMode::Null => 0.0,
        }
    }

    /// Blend toward the fog color. Planar fog measures camera depth for
    /// primary rays and falls back to distance for everything else.
    fn fog(&self, ray: &TraceRay<'s>, col: Color, t: f32) -> Color {
        let fog = &self.scene.fog;
        let coord = match fog.kind {
            ember_core::FogType::Planar if ray.kind == RayKind::Primary => {
                ray.geom.direction.dot(self.view) * t
            }
            _ => t,
        };
        fog.apply(col, coord)
    }
}

/// Diffuse weight, darkened toward silhouettes when the material has an outline.
fn diffuse_scale(material: &Material, normal: Vec3, dir: Vec3) -> f32 {
    if material.outline > 0.0 {
        let edge = normal.dot(dir);
        let edge = 1.0 - edge * edge;
        let edge = 1.0 - edge.powf((1.0 - material.outline_width) * 32.0);
        let outline = (1.0 - material.outline) + edge * material.outline;
        material.diffuse * outline
    } else {
        material.diffuse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{
        AmbientOcclusion, Background, Fog, FogMode, FogType, Plane, PointLight, Scene, Sphere,
    };
    use std::sync::Arc;

    fn scratch(scene: &Scene) -> Scratch {
        Scratch::new(scene.object_count(), 42)
    }

    fn flat(color: Color) -> Arc<Material> {
        Arc::new(Material::new(color).with_ambient(0.0).with_diffuse(1.0))
    }

    #[test]
    fn test_zero_depth_returns_background() {
        let mut scene = Scene::new();
        scene.background = Background::Solid(Color::new(0.1, 0.2, 0.3));
        scene.add_object(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), flat(Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::Z, RayKind::Primary, false);
        assert_eq!(ray.depth, 0);
        let col = ctx.trace(&mut ray, &mut s);

        assert_eq!(col, Color::new(0.1, 0.2, 0.3));
        // No query was run, so no child rays either
        assert_eq!(s.mailbox.generation(), 0);
    }

    #[test]
    fn test_transparent_shadow_filter_is_half() {
        let mut scene = Scene::new();
        scene.add_object(Plane::new(Vec3::ZERO, Vec3::Y), flat(Color::ONE));
        scene.add_object(
            Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5),
            Arc::new(Material::new(Color::ONE).with_opacity(0.5)),
        );
        scene.add_light(PointLight::new(Vec3::new(0.0, 5.0, 0.0), 0.0, Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let mut shadow = ctx.shadow_ray(Vec3::ZERO, Vec3::Y, 5.0);
        ctx.intersect_objects(&mut shadow, &mut s.mailbox);
        assert!(!shadow.is_occluded());
        assert_eq!(shadow.isect.shadow_filter, 0.5);

        // The plane point under the sphere receives half the light
        let from = Vec3::new(3.0, 1.0, 0.0);
        let mut ray = ctx.primary_ray(from, (-from).normalize());
        let col = ctx.trace(&mut ray, &mut s);
        assert!((col - Color::splat(0.5)).abs().max_element() < 1e-3, "{col:?}");
    }

    #[test]
    fn test_opaque_occluder_blocks_light() {
        let mut scene = Scene::new();
        scene.add_object(Plane::new(Vec3::ZERO, Vec3::Y), flat(Color::ONE));
        scene.add_object(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), flat(Color::ONE));
        scene.add_light(PointLight::new(Vec3::new(0.0, 5.0, 0.0), 0.0, Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let from = Vec3::new(3.0, 1.0, 0.0);
        let mut ray = ctx.primary_ray(from, (-from).normalize());
        assert_eq!(ctx.trace(&mut ray, &mut s), Color::ZERO);
    }

    #[test]
    fn test_medium_tier_skips_shadows() {
        let mut scene = Scene::new();
        scene.update_options(|o| o.shader = ShaderMode::Medium);
        scene.add_object(Plane::new(Vec3::ZERO, Vec3::Y), flat(Color::ONE));
        scene.add_object(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), flat(Color::ONE));
        scene.add_light(PointLight::new(Vec3::new(0.0, 5.0, 0.0), 0.0, Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let from = Vec3::new(3.0, 1.0, 0.0);
        let mut ray = ctx.primary_ray(from, (-from).normalize());
        let col = ctx.trace(&mut ray, &mut s);
        assert!((col - Color::ONE).abs().max_element() < 1e-3, "{col:?}");
    }

    #[test]
    fn test_lowest_and_low_tiers() {
        let mut scene = Scene::new();
        scene.background = Background::Solid(Color::new(0.0, 0.0, 0.5));
        scene.add_object(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), flat(Color::new(1.0, 0.0, 0.0)));

        scene.update_options(|o| o.shader = ShaderMode::Lowest);
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);
        let mut hit = ctx.primary_ray(Vec3::ZERO, Vec3::Z);
        let mut miss = ctx.primary_ray(Vec3::ZERO, -Vec3::Z);
        assert_eq!(ctx.trace(&mut hit, &mut s), Color::ONE);
        assert_eq!(ctx.trace(&mut miss, &mut s), Color::ZERO);

        scene.update_options(|o| o.shader = ShaderMode::Low);
        let ctx = FrameContext::new(&scene, None);
        let mut hit = ctx.primary_ray(Vec3::ZERO, Vec3::Z);
        let mut miss = ctx.primary_ray(Vec3::ZERO, -Vec3::Z);
        assert_eq!(ctx.trace(&mut hit, &mut s), Color::new(1.0, 0.0, 0.0));
        assert_eq!(ctx.trace(&mut miss, &mut s), Color::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn test_lights_are_unshaded() {
        let mut scene = Scene::new();
        let color = Color::new(0.9, 0.8, 0.1);
        scene.add_light(PointLight::new(Vec3::new(0.0, 0.0, 5.0), 1.0, color));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let mut ray = ctx.primary_ray(Vec3::ZERO, Vec3::Z);
        assert_eq!(ctx.trace(&mut ray, &mut s), color);
    }

    #[test]
    fn test_exhausted_transparency_budget_passes_through() {
        let mut scene = Scene::new();
        let bg = Color::new(0.2, 0.4, 0.6);
        scene.background = Background::Solid(bg);
        scene.update_options(|o| o.trans_max_surfaces = 0);
        scene.add_object(
            Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0),
            Arc::new(Material::new(Color::new(1.0, 0.0, 0.0)).with_opacity(0.5)),
        );
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let mut ray = ctx.primary_ray(Vec3::ZERO, Vec3::Z);
        assert_eq!(ctx.trace(&mut ray, &mut s), bg);
    }

    #[test]
    fn test_ambient_occlusion_open_sky() {
        let mut scene = Scene::new();
        scene.ambient_occlusion = AmbientOcclusion {
            samples: 2048,
            color: Color::ONE,
        };
        scene.add_object(Plane::new(Vec3::ZERO, Vec3::Y), flat(Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        // Unoccluded hemisphere integrates to about one
        let ao = ctx.ambient_occlusion(Vec3::ZERO, Vec3::Y, &mut s);
        assert!((ao.x - 1.0).abs() < 0.1, "{ao:?}");

        // A roof right above blocks nearly everything
        scene.add_object(Plane::new(Vec3::new(0.0, 0.01, 0.0), -Vec3::Y), flat(Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);
        let ao = ctx.ambient_occlusion(Vec3::ZERO, Vec3::Y, &mut s);
        assert_eq!(ao, Color::ZERO);
    }

    #[test]
    fn test_ambient_occlusion_varies_per_pixel() {
        let mut scene = Scene::new();
        scene.ambient_occlusion = AmbientOcclusion {
            samples: 1,
            color: Color::ONE,
        };
        scene.add_object(Plane::new(Vec3::ZERO, Vec3::Y), flat(Color::ONE));
        // Wall hiding the +x half of the hemisphere
        scene.add_object(Plane::new(Vec3::new(0.01, 0.0, 0.0), -Vec3::X), flat(Color::ONE));
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);

        let mut blocked = 0;
        for x in 0..50 {
            s.begin_pixel(x, 7);
            if ctx.ambient_occlusion(Vec3::ZERO, Vec3::Y, &mut s) == Color::ZERO {
                blocked += 1;
            }
        }
        assert!(blocked > 0 && blocked < 50, "{blocked}");

        // Same pixel, same directions
        s.begin_pixel(3, 4);
        let a = jitter_sphere(&mut s.rng);
        s.begin_pixel(4, 3);
        let b = jitter_sphere(&mut s.rng);
        s.begin_pixel(3, 4);
        assert_eq!(jitter_sphere(&mut s.rng), a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_specular_models() {
        let mut scene = Scene::new();
        let d = -Vec3::Y;
        let n = Vec3::Y;

        for mode in [PhongMode::Blinn, PhongMode::BlinnFast, PhongMode::Phong] {
            scene.update_options(|o| o.phong = mode);
            let ctx = FrameContext::new(&scene, None);
            // Light behind the viewer: peak highlight
            assert!((ctx.specular(d, n, Vec3::Y, 20.0) - 1.0).abs() < 1e-4, "{mode:?}");
            // Light below the surface: none
            assert_eq!(ctx.specular(d, n, -Vec3::Y, 20.0), 0.0);
        }

        scene.update_options(|o| o.phong = PhongMode::Null);
        let ctx = FrameContext::new(&scene, None);
        assert_eq!(ctx.specular(d, n, Vec3::Y, 20.0), 0.0);
    }

    #[test]
    fn test_radial_fog_covers_background_but_planar_does_not() {
        let mut scene = Scene::new();
        scene.background = Background::Solid(Color::ZERO);
        scene.fog = Fog {
            mode: FogMode::Linear,
            kind: FogType::Radial,
            start: 0.0,
            end: 10.0,
            density: 1.0,
            color: Color::ONE,
        };
        let ctx = FrameContext::new(&scene, None);
        let mut s = scratch(&scene);
        let mut ray = ctx.primary_ray(Vec3::ZERO, Vec3::Z);
        assert_eq!(ctx.trace(&mut ray, &mut s), Color::ONE);

        scene.fog.kind = FogType::Planar;
        let ctx = FrameContext::new(&scene, None);
        let mut ray = ctx.primary_ray(Vec3::ZERO, Vec3::Z);
        assert_eq!(ctx.trace(&mut ray, &mut s), Color::ZERO);
    }

    #[test]
    fn test_planar_fog_uses_view_depth() {
        let mut scene = Scene::new();
        scene.fog = Fog {
            mode: FogMode::Linear,
            kind: FogType::Planar,
            start: 0.0,
            end: 10.0,
            density: 1.0,
            color: Color::ONE,
        };
        let ctx = FrameContext::new(&scene, None);
        let oblique = Vec3::new(1.0, 0.0, 1.0).normalize();
        let ray = ctx.primary_ray(Vec3::ZERO, oblique);

        // Distance 5 along a 45 degree ray is depth ~3.54
        let col = ctx.fog(&ray, Color::ZERO, 5.0);
        let depth = 5.0 * oblique.dot(Vec3::Z);
        assert!((col.x - depth / 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_outline_darkens_silhouettes() {
        let m = Material::new(Color::ONE).with_outline(1.0, 0.0);
        // Head-on keeps full diffuse weight
        assert!((diffuse_scale(&m, -Vec3::Z, Vec3::Z) - m.diffuse).abs() < 1e-6);
        // Grazing goes dark
        assert!(diffuse_scale(&m, Vec3::Y, Vec3::Z) < 1e-6);
    }
}
