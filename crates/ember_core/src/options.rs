//! Render options.
//!
//! Everything here is plain data so it can be loaded from a JSON file.

use crate::material::TransMode;
use serde::{Deserialize, Serialize};

/// Default number of bounded objects above which a grid is built.
pub const DEFAULT_BOUND_THRESHOLD: usize = 16;

/// Shading quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShaderMode {
    /// Resolved to [`ShaderMode::Full`] when a frame is prepared.
    #[default]
    Auto,
    /// White on hit, black on miss
    Lowest,
    /// Unlit texture color
    Low,
    /// Lighting, reflection and transmission without shadows or AO
    Medium,
    Full,
}

impl ShaderMode {
    pub fn resolve(self) -> ShaderMode {
        match self {
            ShaderMode::Auto => ShaderMode::Full,
            other => other,
        }
    }
}

/// Specular highlight model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhongMode {
    #[default]
    Blinn,
    /// Blinn with a rational approximation in place of `powf`
    BlinnFast,
    Phong,
    /// No highlights
    Null,
}

/// Output pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8 bits per channel, interleaved RGB
    Rgb24,
    /// 32-bit float per channel, interleaved RGB
    #[default]
    Rgb96F,
}

/// Frame-level rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Worker threads; `None` uses every available core
    pub threads: Option<usize>,
    pub shader: ShaderMode,
    pub phong: PhongMode,
    pub trans_mode: TransMode,
    /// Transparent surfaces a ray may shade before it only transmits
    pub trans_max_surfaces: u32,
    /// Let partially transparent occluders tint shadows
    pub shadow_filtering: bool,
    pub light_scale: f32,
    /// Use the acceleration grid
    pub bounding: bool,
    pub bound_threshold: usize,
    pub format: PixelFormat,
    /// Gamma applied to float output after rendering
    pub gamma: f32,
    /// Rescale float output so the brightest channel is 1
    pub normalize: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            threads: None,
            shader: ShaderMode::Auto,
            phong: PhongMode::Blinn,
            trans_mode: TransMode::ORIG,
            trans_max_surfaces: u32::MAX,
            shadow_filtering: true,
            light_scale: 1.0,
            bounding: true,
            bound_threshold: DEFAULT_BOUND_THRESHOLD,
            format: PixelFormat::Rgb96F,
            gamma: 2.2,
            normalize: false,
        }
    }
}

impl RenderOptions {
    /// Whether switching from `self` to `other` invalidates prepared state.
    pub fn requires_rebuild(&self, other: &RenderOptions) -> bool {
        self.width != other.width
            || self.height != other.height
            || self.threads != other.threads
            || self.bounding != other.bounding
            || self.bound_threshold != other.bound_threshold
            || self.format != other.format
    }
}
