//! Light sources.
//!
//! Positional lights are also visible: adding one to a [`crate::Scene`]
//! inserts a [`LightSphere`] object that shading returns unlit. Light
//! spheres are invisible to shadow rays.

use crate::geometry::{face_forward, sphere_roots, Primitive};
use ember_math::{Color, Ray, Vec3, EPSILON, FHUGE};

/// Result of evaluating a light at a surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit vector from the surface toward the light
    pub direction: Vec3,
    /// Distance to the light; shadow rays stop here
    pub distance: f32,
    /// N·L with attenuation and falloff applied. May be negative.
    pub intensity: f32,
}

pub trait Light: Send + Sync {
    /// Diffuse term for a point with unit normal `normal`.
    fn shade_diffuse(&self, hit: Vec3, normal: Vec3) -> LightSample;

    fn color(&self) -> Color;

    /// Center and radius of the light's visible sphere, if it has one.
    fn visible_sphere(&self) -> Option<(Vec3, f32)> {
        None
    }
}

/// Light arriving from a fixed direction at infinite distance.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Negated travel direction, i.e. toward the light.
    to_light: Vec3,
    color: Color,
}

impl DirectionalLight {
    /// `direction` is the direction the light travels in.
    pub fn new(direction: Vec3, color: Color) -> Self {
        Self {
            to_light: -direction.normalize_or_zero(),
            color,
        }
    }
}

impl Light for DirectionalLight {
    fn shade_diffuse(&self, _hit: Vec3, normal: Vec3) -> LightSample {
        LightSample {
            direction: self.to_light,
            distance: FHUGE,
            intensity: normal.dot(self.to_light),
        }
    }

    fn color(&self) -> Color {
        self.color
    }
}

/// Distance attenuation `1 / (kc + (kl + kq * d) * d)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + (self.linear + self.quadratic * distance) * distance)
    }
}

/// An omnidirectional positional light.
#[derive(Debug, Clone)]
pub struct PointLight {
    center: Vec3,
    radius: f32,
    color: Color,
    attenuation: Option<Attenuation>,
}

impl PointLight {
    pub fn new(center: Vec3, radius: f32, color: Color) -> Self {
        Self {
            center,
            radius,
            color,
            attenuation: None,
        }
    }

    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.attenuation = Some(Attenuation {
            constant,
            linear,
            quadratic,
        });
        self
    }

    /// Unattenuated sample toward the light center.
    fn base_sample(&self, hit: Vec3, normal: Vec3) -> LightSample {
        let l = self.center - hit;
        let len = l.length() + EPSILON;
        let direction = l / len;
        let mut intensity = normal.dot(direction);
        if let Some(att) = &self.attenuation {
            intensity *= att.factor(len);
        }
        LightSample {
            direction,
            distance: len,
            intensity,
        }
    }
}

impl Light for PointLight {
    fn shade_diffuse(&self, hit: Vec3, normal: Vec3) -> LightSample {
        self.base_sample(hit, normal)
    }

    fn color(&self) -> Color {
        self.color
    }

    fn visible_sphere(&self) -> Option<(Vec3, f32)> {
        (self.radius > 0.0).then_some((self.center, self.radius))
    }
}

/// A positional light restricted to a cone, with linear angular falloff.
#[derive(Debug, Clone)]
pub struct SpotLight {
    point: PointLight,
    direction: Vec3,
    /// Angle in radians where falloff begins
    fall_start: f32,
    /// Angle in radians where the light reaches zero
    fall_end: f32,
}

impl SpotLight {
    pub fn new(point: PointLight, direction: Vec3, fall_start: f32, fall_end: f32) -> Self {
        Self {
            point,
            direction: direction.normalize_or_zero(),
            fall_start,
            fall_end,
        }
    }

    fn falloff(&self, to_light: Vec3) -> f32 {
        let ang = (-self.direction.dot(to_light)).clamp(-1.0, 1.0).acos();
        if ang > self.fall_end {
            0.0
        } else if ang > self.fall_start {
            1.0 - (ang - self.fall_start) / (self.fall_end - self.fall_start)
        } else {
            1.0
        }
    }
}

impl Light for SpotLight {
    fn shade_diffuse(&self, hit: Vec3, normal: Vec3) -> LightSample {
        let mut sample = self.point.base_sample(hit, normal);
        sample.intensity *= self.falloff(sample.direction);
        sample
    }

    fn color(&self) -> Color {
        self.point.color
    }

    fn visible_sphere(&self) -> Option<(Vec3, f32)> {
        self.point.visible_sphere()
    }
}

/// Visible geometry of a positional light. Unbounded so it is always tested.
#[derive(Debug, Clone)]
pub struct LightSphere {
    center: Vec3,
    radius: f32,
}

impl LightSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Primitive for LightSphere {
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32)) {
        if let Some((t1, t2)) = sphere_roots(self.center, self.radius, ray) {
            hit(t1);
            hit(t2);
        }
    }

    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3 {
        face_forward((point - self.center).normalize_or_zero(), ray.direction)
    }

    fn kind(&self) -> &'static str {
        "light"
    }
}
