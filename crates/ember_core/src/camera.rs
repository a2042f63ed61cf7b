//! Camera definition.
//!
//! This is only the user-facing description. The renderer derives the
//! orthonormal basis and image-plane deltas from it at the start of
//! every frame.

use ember_math::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
    Fisheye,
    /// Perspective with a finite aperture (depth of field)
    PerspectiveDof,
}

/// Explicit image-plane bounds, replacing zoom/aspect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

/// Camera placement, lens and sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDef {
    pub projection: Projection,
    /// Eye position
    pub center: Vec3,
    /// Viewing direction
    pub view: Vec3,
    pub up: Vec3,
    pub zoom: f32,
    pub aspect: f32,
    pub frustum: Option<Frustum>,
    /// Extra jittered samples per pixel (0 disables antialiasing)
    pub aa_samples: u32,
    /// Maximum recursion depth for primary rays
    pub max_depth: u32,
    /// Distance to the image plane / plane of focus
    pub focal_length: f32,
    pub aperture: f32,
}

impl Default for CameraDef {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            center: Vec3::ZERO,
            view: Vec3::Z,
            up: Vec3::Y,
            zoom: 1.0,
            aspect: 1.0,
            frustum: None,
            aa_samples: 0,
            max_depth: 6,
            focal_length: 1.0,
            aperture: 0.0,
        }
    }
}

impl CameraDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set eye position, viewing direction and up vector.
    pub fn with_position(mut self, center: Vec3, view: Vec3, up: Vec3) -> Self {
        self.center = center;
        self.view = view;
        self.up = up;
        self
    }

    /// Place the eye at `from` looking toward `at`.
    pub fn looking_at(self, from: Vec3, at: Vec3, up: Vec3) -> Self {
        self.with_position(from, at - from, up)
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_zoom(mut self, zoom: f32, aspect: f32) -> Self {
        self.zoom = zoom;
        self.aspect = aspect;
        self.frustum = None;
        self
    }

    pub fn with_frustum(mut self, left: f32, right: f32, bottom: f32, top: f32) -> Self {
        self.frustum = Some(Frustum {
            left,
            right,
            bottom,
            top,
        });
        self
    }

    pub fn with_antialiasing(mut self, samples: u32) -> Self {
        self.aa_samples = samples;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Depth of field; only used by [`Projection::PerspectiveDof`].
    pub fn with_dof(mut self, focal_length: f32, aperture: f32) -> Self {
        self.focal_length = focal_length;
        self.aperture = aperture;
        self
    }
}
