//! Tracing rays and intersection acceptance.
//!
//! A [`TraceRay`] carries everything one scene query needs: geometry,
//! distance limits, recursion budgets and the intersection record. How a
//! candidate hit is accepted is fixed at construction by [`AcceptPolicy`].

use ember_core::Object;
use ember_math::{Ray, Vec3, EPSILON, FHUGE};

/// What a ray is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayKind {
    /// Fired from the camera
    Primary,
    /// Reflection or transmission
    Regular,
    /// Occlusion test toward a light or for ambient occlusion
    Shadow,
}

/// Rule for accepting candidate hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptPolicy {
    /// Keep the closest hit beyond EPSILON.
    Regular,
    /// As `Regular`, but the hit point must survive the object's clip planes.
    ClippedRegular,
    /// Any opaque hit finishes the ray; transparent hits attenuate it.
    Shadow,
    /// As `Shadow`, after the clip test.
    ClippedShadow,
}

impl AcceptPolicy {
    pub fn select(kind: RayKind, clipping: bool) -> Self {
        match (kind, clipping) {
            (RayKind::Shadow, false) => AcceptPolicy::Shadow,
            (RayKind::Shadow, true) => AcceptPolicy::ClippedShadow,
            (_, false) => AcceptPolicy::Regular,
            (_, true) => AcceptPolicy::ClippedRegular,
        }
    }
}

/// Result of one scene query.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'s> {
    /// Hits kept: 0 or 1
    pub num: u32,
    pub closest: Option<(&'s Object, f32)>,
    /// Product of `(1 - opacity)` over transparent occluders
    pub shadow_filter: f32,
    last_filtered: Option<usize>,
}

impl Default for Intersection<'_> {
    fn default() -> Self {
        Self {
            num: 0,
            closest: None,
            shadow_filter: 1.0,
            last_filtered: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceRay<'s> {
    pub geom: Ray,
    /// Farthest acceptable hit. Only ever decreases during a query.
    pub max_dist: f32,
    /// Distance travelled by this ray's ancestors plus this ray
    pub optic_dist: f32,
    /// Remaining recursion depth
    pub depth: u32,
    /// Remaining transparent surfaces that may be shaded
    pub trans_budget: u32,
    pub kind: RayKind,
    /// Mailbox generation of the last query
    pub serial: u32,
    pub isect: Intersection<'s>,
    /// Set by the shadow policy once an opaque occluder is found
    pub finished: bool,
    policy: AcceptPolicy,
    shadow_filtering: bool,
}

impl<'s> TraceRay<'s> {
    /// A ray with unlimited range and no recursion budget.
    pub fn new(origin: Vec3, direction: Vec3, kind: RayKind, clipping: bool) -> Self {
        Self {
            geom: Ray::new(origin, direction),
            max_dist: FHUGE,
            optic_dist: 0.0,
            depth: 0,
            trans_budget: 0,
            kind,
            serial: 0,
            isect: Intersection::default(),
            finished: false,
            policy: AcceptPolicy::select(kind, clipping),
            shadow_filtering: true,
        }
    }

    pub fn with_budget(mut self, depth: u32, trans_budget: u32) -> Self {
        self.depth = depth;
        self.trans_budget = trans_budget;
        self
    }

    pub fn with_max_dist(mut self, max_dist: f32) -> Self {
        self.max_dist = max_dist;
        self
    }

    /// When off, transparent occluders are ignored by shadow rays.
    pub fn with_shadow_filtering(mut self, enabled: bool) -> Self {
        self.shadow_filtering = enabled;
        self
    }

    pub fn policy(&self) -> AcceptPolicy {
        self.policy
    }

    /// Clear the intersection record before a new query.
    pub fn reset(&mut self) {
        self.isect = Intersection::default();
        self.finished = false;
    }

    /// True when a shadow query found an opaque occluder.
    pub fn is_occluded(&self) -> bool {
        self.isect.num > 0
    }

    /// Offer a candidate hit on `object` at distance `t`.
    pub fn accept(&mut self, object: &'s Object, t: f32) {
        if !(t > EPSILON && t < self.max_dist) {
            return;
        }
        match self.policy {
            AcceptPolicy::Regular => self.record(object, t),
            AcceptPolicy::ClippedRegular => {
                if !self.is_clipped(object, t) {
                    self.record(object, t);
                }
            }
            AcceptPolicy::Shadow => self.shadow_hit(object, t),
            AcceptPolicy::ClippedShadow => {
                if !self.is_clipped(object, t) {
                    self.shadow_hit(object, t);
                }
            }
        }
    }

    fn record(&mut self, object: &'s Object, t: f32) {
        self.max_dist = t;
        self.isect.num = 1;
        self.isect.closest = Some((object, t));
    }

    fn is_clipped(&self, object: &Object, t: f32) -> bool {
        object
            .clip()
            .is_some_and(|clip| clip.clips(self.geom.at(t)))
    }

    fn shadow_hit(&mut self, object: &'s Object, t: f32) {
        let material = object.material();
        if material.casts_shadow() {
            self.record(object, t);
            self.finished = true;
        } else if self.shadow_filtering && self.isect.last_filtered != Some(object.id()) {
            // Entry and exit of one transparent solid attenuate once
            self.isect.shadow_filter *= 1.0 - material.opacity;
            self.isect.last_filtered = Some(object.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{ClipGroup, Material, Plane, Scene, Sphere};
    use ember_math::Color;
    use std::sync::Arc;

    fn scene_with(opacity: f32) -> Scene {
        let mut scene = Scene::new();
        let m = Arc::new(Material::new(Color::ONE).with_opacity(opacity));
        scene.add_object(Sphere::new(Vec3::ZERO, 1.0), m.clone());
        scene.add_object(Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0), m);
        scene
    }

    #[test]
    fn test_policy_selection() {
        assert_eq!(AcceptPolicy::select(RayKind::Primary, false), AcceptPolicy::Regular);
        assert_eq!(AcceptPolicy::select(RayKind::Regular, true), AcceptPolicy::ClippedRegular);
        assert_eq!(AcceptPolicy::select(RayKind::Shadow, false), AcceptPolicy::Shadow);
        assert_eq!(AcceptPolicy::select(RayKind::Shadow, true), AcceptPolicy::ClippedShadow);
    }

    #[test]
    fn test_regular_keeps_closest() {
        let scene = scene_with(1.0);
        let (a, b) = (&scene.bounded()[0], &scene.bounded()[1]);
        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::X, RayKind::Primary, false);

        ray.accept(a, 5.0);
        ray.accept(b, 7.0);
        ray.accept(b, 2.0);
        ray.accept(a, 0.5 * EPSILON);

        let (obj, t) = ray.isect.closest.unwrap();
        assert_eq!(obj.id(), b.id());
        assert_eq!(t, 2.0);
        assert_eq!(ray.max_dist, 2.0);
        assert_eq!(ray.isect.num, 1);
    }

    #[test]
    fn test_max_dist_never_increases() {
        let scene = scene_with(1.0);
        let obj = &scene.bounded()[0];
        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::X, RayKind::Regular, false);

        let mut last = ray.max_dist;
        for t in [9.0, 3.0, 12.0, -1.0, 3.5, 1.0, 100.0, 0.2] {
            ray.accept(obj, t);
            assert!(ray.max_dist <= last);
            last = ray.max_dist;
        }
        assert_eq!(ray.max_dist, 0.2);
    }

    #[test]
    fn test_shadow_opaque_finishes() {
        let scene = scene_with(1.0);
        let obj = &scene.bounded()[0];
        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::X, RayKind::Shadow, false).with_max_dist(10.0);

        ray.accept(obj, 11.0);
        assert!(!ray.is_occluded());

        ray.accept(obj, 4.0);
        assert!(ray.is_occluded());
        assert!(ray.finished);
    }

    #[test]
    fn test_shadow_transparent_attenuates_once_per_object() {
        let scene = scene_with(0.5);
        let (a, b) = (&scene.bounded()[0], &scene.bounded()[1]);
        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::X, RayKind::Shadow, false);

        // Entry and exit of the same sphere
        ray.accept(a, 1.0);
        ray.accept(a, 3.0);
        assert_eq!(ray.isect.shadow_filter, 0.5);

        ray.accept(b, 5.0);
        assert_eq!(ray.isect.shadow_filter, 0.25);
        assert!(!ray.is_occluded());
        assert!(!ray.finished);
    }

    #[test]
    fn test_shadow_filtering_disabled_ignores_transparent() {
        let scene = scene_with(0.5);
        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::X, RayKind::Shadow, false)
            .with_shadow_filtering(false);
        ray.accept(&scene.bounded()[0], 1.0);
        assert_eq!(ray.isect.shadow_filter, 1.0);
        assert!(!ray.is_occluded());
    }

    #[test]
    fn test_clipped_policies() {
        let mut scene = Scene::new();
        // Keep only y <= 0
        let clip = Arc::new(ClipGroup::from_coefficients(&[0.0, 1.0, 0.0, 0.0]));
        scene.add_clipped_object(
            Plane::new(Vec3::ZERO, Vec3::Z),
            Arc::new(Material::new(Color::ONE)),
            clip,
        );
        let obj = &scene.unbounded()[0];

        // Hit point at y = 1 is clipped away
        let mut ray = TraceRay::new(Vec3::new(0.0, 1.0, -1.0), Vec3::Z, RayKind::Primary, true);
        ray.accept(obj, 1.0);
        assert_eq!(ray.isect.num, 0);

        // Hit point at y = -1 survives
        let mut ray = TraceRay::new(Vec3::new(0.0, -1.0, -1.0), Vec3::Z, RayKind::Shadow, true);
        assert_eq!(ray.policy(), AcceptPolicy::ClippedShadow);
        ray.accept(obj, 1.0);
        assert!(ray.is_occluded());
    }

    #[test]
    fn test_reset_clears_record() {
        let scene = scene_with(0.5);
        let mut ray = TraceRay::new(Vec3::ZERO, Vec3::X, RayKind::Shadow, false);
        ray.accept(&scene.bounded()[0], 1.0);
        ray.reset();
        assert_eq!(ray.isect.shadow_filter, 1.0);
        assert!(ray.isect.closest.is_none());
    }
}
