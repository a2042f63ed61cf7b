//! Ember math - vectors, intervals, bounding boxes and rays.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Minimum accepted hit distance; also the offset applied to spawned rays.
pub const EPSILON: f32 = 1e-4;

/// "Infinite" distance for unbounded rays.
pub const FHUGE: f32 = 1e18;

/// Contributions below this are treated as invisible.
pub const MINCONTRIB: f32 = 0.001959;

/// RGB color in linear space.
pub type Color = Vec3;

/// Reflect `d` about the unit normal `n`.
#[inline]
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}
