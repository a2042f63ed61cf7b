//! Surface shading parameters.

use crate::texture::{ConstantTexture, Texture};
use ember_math::{Color, Ray, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opacity at or above which a surface blocks shadow rays outright.
pub const SHADOW_CAST_OPACITY: f32 = 0.99999;

/// How specular highlights are tinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhongType {
    /// Highlights take the light's color.
    #[default]
    Plastic,
    /// Highlights take the surface color.
    Metal,
}

/// Transparency rendering modes. Combinable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransMode {
    /// Scale the surface color by its alpha before adding transmitted light.
    pub vmd: bool,
    /// Angle-dependent opacity in the style of Raster3D.
    pub raster3d: bool,
}

impl TransMode {
    pub const ORIG: TransMode = TransMode {
        vmd: false,
        raster3d: false,
    };
    pub const VMD: TransMode = TransMode {
        vmd: true,
        raster3d: false,
    };
    pub const RASTER3D: TransMode = TransMode {
        vmd: false,
        raster3d: true,
    };

    pub fn union(self, other: TransMode) -> TransMode {
        TransMode {
            vmd: self.vmd || other.vmd,
            raster3d: self.raster3d || other.raster3d,
        }
    }
}

/// Lighting coefficients plus the texture that supplies base color.
#[derive(Clone)]
pub struct Material {
    pub ambient: f32,
    pub diffuse: f32,
    /// Mirror reflection strength
    pub specular: f32,
    pub opacity: f32,
    /// Highlight strength
    pub phong: f32,
    pub phong_exp: f32,
    pub phong_type: PhongType,
    /// Silhouette darkening strength in [0, 1]
    pub outline: f32,
    pub outline_width: f32,
    pub trans_mode: TransMode,
    pub texture: Arc<dyn Texture>,
    is_light: bool,
}

impl Material {
    /// A plain diffuse material of a constant color.
    pub fn new(color: Color) -> Self {
        Self::textured(Arc::new(ConstantTexture(color)))
    }

    pub fn textured(texture: Arc<dyn Texture>) -> Self {
        Self {
            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.0,
            opacity: 1.0,
            phong: 0.0,
            phong_exp: 20.0,
            phong_type: PhongType::Plastic,
            outline: 0.0,
            outline_width: 0.0,
            trans_mode: TransMode::ORIG,
            texture,
            is_light: false,
        }
    }

    /// Material for the visible surface of a light source.
    pub fn light(color: Color) -> Self {
        Self {
            ambient: 0.0,
            diffuse: 0.0,
            specular: 0.0,
            opacity: 1.0,
            is_light: true,
            ..Self::new(color)
        }
    }

    pub fn with_ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_diffuse(mut self, diffuse: f32) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn with_specular(mut self, specular: f32) -> Self {
        self.specular = specular;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_phong(mut self, phong: f32, exponent: f32, kind: PhongType) -> Self {
        self.phong = phong;
        self.phong_exp = exponent;
        self.phong_type = kind;
        self
    }

    pub fn with_outline(mut self, outline: f32, width: f32) -> Self {
        self.outline = outline;
        self.outline_width = width;
        self
    }

    pub fn with_trans_mode(mut self, mode: TransMode) -> Self {
        self.trans_mode = mode;
        self
    }

    /// Whether shadow rays stop at this surface.
    pub fn casts_shadow(&self) -> bool {
        self.is_light || self.opacity >= SHADOW_CAST_OPACITY
    }

    pub fn is_light(&self) -> bool {
        self.is_light
    }

    /// Base color at a hit point.
    #[inline]
    pub fn color_at(&self, hit: Vec3, ray: &Ray) -> Color {
        self.texture.color(hit, ray)
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("ambient", &self.ambient)
            .field("diffuse", &self.diffuse)
            .field("specular", &self.specular)
            .field("opacity", &self.opacity)
            .field("phong", &self.phong)
            .field("is_light", &self.is_light)
            .finish_non_exhaustive()
    }
}
