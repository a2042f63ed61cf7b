//! Scene graph: objects, lights, camera and per-frame settings.
//!
//! The scene owns everything it renders. Objects are split at insertion
//! time into a bounded list (finite bounding box, eligible for the
//! acceleration grid) and an unbounded list that every ray tests.

use crate::camera::CameraDef;
use crate::clip::ClipGroup;
use crate::environment::{AmbientOcclusion, Background, Fog};
use crate::geometry::Primitive;
use crate::light::{Light, LightSphere};
use crate::material::Material;
use crate::options::RenderOptions;
use crate::{SceneError, SceneResult};
use ember_math::{Aabb, Vec3};
use std::sync::Arc;

/// A renderable object: geometry plus shading and optional clipping.
pub struct Object {
    id: usize,
    primitive: Box<dyn Primitive>,
    material: Arc<Material>,
    clip: Option<Arc<ClipGroup>>,
    bbox: Option<Aabb>,
}

impl Object {
    /// Unique within its scene; indexes per-thread mailboxes.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn primitive(&self) -> &dyn Primitive {
        self.primitive.as_ref()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn clip(&self) -> Option<&ClipGroup> {
        self.clip.as_deref()
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bbox
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("kind", &self.primitive.kind())
            .field("clipped", &self.clip.is_some())
            .finish()
    }
}

/// Everything needed to render a frame.
pub struct Scene {
    bounded: Vec<Object>,
    unbounded: Vec<Object>,
    lights: Vec<Box<dyn Light>>,
    next_id: usize,
    clipping: bool,
    options: RenderOptions,
    needs_rebuild: bool,

    pub camera: CameraDef,
    pub background: Background,
    pub fog: Fog,
    pub ambient_occlusion: AmbientOcclusion,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            bounded: Vec::new(),
            unbounded: Vec::new(),
            lights: Vec::new(),
            next_id: 0,
            clipping: false,
            options,
            needs_rebuild: true,
            camera: CameraDef::default(),
            background: Background::default(),
            fog: Fog::default(),
            ambient_occlusion: AmbientOcclusion::default(),
        }
    }

    /// Add an object and return its id.
    pub fn add_object(&mut self, primitive: impl Primitive + 'static, material: Arc<Material>) -> usize {
        self.insert(Box::new(primitive), material, None)
    }

    /// Add an object whose hits are culled by `clip`.
    pub fn add_clipped_object(
        &mut self,
        primitive: impl Primitive + 'static,
        material: Arc<Material>,
        clip: Arc<ClipGroup>,
    ) -> usize {
        self.insert(Box::new(primitive), material, Some(clip))
    }

    /// Add a boxed primitive, e.g. the result of a fallible constructor.
    pub fn add_boxed(
        &mut self,
        primitive: Box<dyn Primitive>,
        material: Arc<Material>,
        clip: Option<Arc<ClipGroup>>,
    ) -> usize {
        self.insert(primitive, material, clip)
    }

    fn insert(
        &mut self,
        primitive: Box<dyn Primitive>,
        material: Arc<Material>,
        clip: Option<Arc<ClipGroup>>,
    ) -> usize {
        let id = self.next_id;
        self.next_id += 1;

        if clip.is_some() {
            self.clipping = true;
        }

        let bbox = primitive.bounding_box().filter(|b| b.is_finite());
        let object = Object {
            id,
            primitive,
            material,
            clip,
            bbox,
        };
        if bbox.is_some() {
            self.bounded.push(object);
        } else {
            self.unbounded.push(object);
        }
        self.needs_rebuild = true;
        id
    }

    /// Add a light. Positional lights with a radius also become visible spheres.
    pub fn add_light(&mut self, light: impl Light + 'static) {
        if let Some((center, radius)) = light.visible_sphere() {
            let material = Arc::new(Material::light(light.color()));
            self.insert(Box::new(LightSphere::new(center, radius)), material, None);
        }
        self.lights.push(Box::new(light));
        self.needs_rebuild = true;
    }

    pub fn bounded(&self) -> &[Object] {
        &self.bounded
    }

    pub fn unbounded(&self) -> &[Object] {
        &self.unbounded
    }

    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    /// Number of ids handed out so far; sizes per-thread mailboxes.
    pub fn object_count(&self) -> usize {
        self.next_id
    }

    /// True once any object carries a clip group.
    pub fn has_clipping(&self) -> bool {
        self.clipping
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Edit options; flags a rebuild if resolution, threads, layout or bounding changed.
    pub fn update_options(&mut self, f: impl FnOnce(&mut RenderOptions)) {
        let before = self.options.clone();
        f(&mut self.options);
        if before.requires_rebuild(&self.options) {
            self.needs_rebuild = true;
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> SceneResult<()> {
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidResolution { width, height });
        }
        self.update_options(|o| {
            o.width = width;
            o.height = height;
        });
        Ok(())
    }

    pub fn set_threads(&mut self, threads: Option<usize>) {
        self.update_options(|o| o.threads = threads);
    }

    pub fn set_bounding(&mut self, enabled: bool, threshold: usize) {
        self.update_options(|o| {
            o.bounding = enabled;
            o.bound_threshold = threshold;
        });
    }

    /// Set the camera's eye, view and up vectors.
    pub fn set_camera_position(&mut self, center: Vec3, view: Vec3, up: Vec3) -> SceneResult<()> {
        if view.length_squared() == 0.0 {
            return Err(SceneError::ZeroVector("view"));
        }
        if up.length_squared() == 0.0 {
            return Err(SceneError::ZeroVector("up"));
        }
        self.camera = self.camera.clone().with_position(center, view, up);
        Ok(())
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Called by the renderer once prepared state matches the scene.
    pub fn mark_rebuilt(&mut self) {
        self.needs_rebuild = false;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
