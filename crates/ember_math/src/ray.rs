use crate::Vec3;

/// A geometric ray: a line starting at `origin` and traveling in `direction`.
///
/// Primitives intersect against this. Tracing state (depth, distance
/// limits, the accept policy) lives on the renderer's ray type.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
