//! Ember core - the in-memory scene a frame is rendered from.
//!
//! This crate provides:
//!
//! - **Geometry**: the [`Primitive`] capability trait and stock shapes
//! - **Appearance**: [`Material`], [`Texture`] evaluators, an [`ImageCache`]
//! - **Lighting**: directional, point and spot [`Light`]s
//! - **Frame settings**: camera, background, fog, AO and [`RenderOptions`]
//! - **Output**: the [`FrameBuffer`] pixel layouts
//!
//! # Example
//!
//! ```ignore
//! use ember_core::{Material, Scene, Sphere, DirectionalLight};
//!
//! let mut scene = Scene::new();
//! scene.add_object(Sphere::new(Vec3::ZERO, 1.0), Arc::new(Material::new(Color::ONE)));
//! scene.add_light(DirectionalLight::new(Vec3::new(-1.0, -1.0, 1.0), Color::ONE));
//! ```

pub mod camera;
pub mod clip;
pub mod environment;
mod error;
pub mod framebuffer;
pub mod geometry;
pub mod light;
pub mod material;
pub mod options;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use camera::{CameraDef, Frustum, Projection};
pub use clip::ClipGroup;
pub use environment::{AmbientOcclusion, Background, Fog, FogMode, FogType, Gradient};
pub use error::{SceneError, SceneResult};
pub use framebuffer::{FrameBuffer, PixelData};
pub use geometry::{
    AxisBox, Cone, Cylinder, FiniteCylinder, Plane, Primitive, Ring, SmoothTriangle, Sphere,
    Triangle,
};
pub use light::{DirectionalLight, Light, LightSample, PointLight, SpotLight};
pub use material::{Material, PhongType, TransMode};
pub use options::{PhongMode, PixelFormat, RenderOptions, ShaderMode};
pub use scene::{Object, Scene};
pub use texture::{
    CheckerTexture, ConstantTexture, Image, ImageCache, ImageError, ImageTexture, Mapping, Texture,
};
