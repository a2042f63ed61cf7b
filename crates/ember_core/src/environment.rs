//! Background, fog and ambient occlusion settings.

use ember_math::{Color, Ray, Vec3};
use serde::{Deserialize, Serialize};

/// Linear blend between two colors along a direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub up: Vec3,
    /// Projection value that maps fully to `top_color`
    pub top_value: f32,
    /// Projection value that maps fully to `bottom_color`
    pub bottom_value: f32,
    pub top_color: Color,
    pub bottom_color: Color,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            up: Vec3::Y,
            top_value: 0.3,
            bottom_value: 0.0,
            top_color: Color::ZERO,
            bottom_color: Color::new(0.0, 0.0, 0.5),
        }
    }
}

impl Gradient {
    fn blend(&self, value: f32) -> Color {
        let t = ((value - self.bottom_value) / (self.top_value - self.bottom_value)).clamp(0.0, 1.0);
        self.top_color * t + self.bottom_color * (1.0 - t)
    }
}

/// What a ray sees when it leaves the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Background {
    Solid(Color),
    /// Gradient over ray direction
    SkySphere(Gradient),
    /// Gradient over ray origin; suits orthographic cameras
    SkyOrthoPlane(Gradient),
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid(Color::ZERO)
    }
}

impl Background {
    pub fn color(&self, ray: &Ray) -> Color {
        match self {
            Background::Solid(c) => *c,
            Background::SkySphere(g) => g.blend(ray.direction.dot(g.up)),
            Background::SkyOrthoPlane(g) => g.blend(ray.origin.dot(g.up)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FogMode {
    #[default]
    Off,
    Linear,
    Exp,
    Exp2,
}

/// How the fog coordinate is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FogType {
    /// Distance along each ray; also fogs the background.
    #[default]
    Radial,
    /// Depth along the view direction for primary rays (OpenGL style).
    Planar,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fog {
    pub mode: FogMode,
    pub kind: FogType,
    pub start: f32,
    pub end: f32,
    pub density: f32,
    pub color: Color,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            mode: FogMode::Off,
            kind: FogType::Radial,
            start: 0.0,
            end: 1.0,
            density: 1.0,
            color: Color::ZERO,
        }
    }
}

impl Fog {
    pub fn is_on(&self) -> bool {
        self.mode != FogMode::Off
    }

    /// Blend `col` toward the fog color at fog coordinate `r`.
    pub fn apply(&self, col: Color, r: f32) -> Color {
        let f = match self.mode {
            FogMode::Off => return col,
            FogMode::Linear => (self.end - r) / (self.end - self.start),
            FogMode::Exp => (-(self.density * (r - self.start))).exp(),
            FogMode::Exp2 => {
                let v = self.density * (r - self.start);
                (-(v * v)).exp()
            }
        };
        let f = f.clamp(0.0, 1.0);
        col * f + self.color * (1.0 - f)
    }
}

/// Monte Carlo ambient occlusion settings. Zero samples disables it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusion {
    pub samples: u32,
    pub color: Color,
}

impl Default for AmbientOcclusion {
    fn default() -> Self {
        Self {
            samples: 0,
            color: Color::ONE,
        }
    }
}
