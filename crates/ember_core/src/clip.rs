//! Half-space clip planes.

use ember_math::{Vec3, Vec4};

/// A set of planes shared by any number of objects.
///
/// Each plane `(a, b, c, d)` removes every point with
/// `a*x + b*y + c*z > d`; hits survive only inside all half-spaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipGroup {
    planes: Vec<Vec4>,
}

impl ClipGroup {
    pub fn new(planes: Vec<Vec4>) -> Self {
        Self { planes }
    }

    /// Build from a flat coefficient list, four values per plane.
    /// Trailing values that do not form a whole plane are ignored.
    pub fn from_coefficients(coeffs: &[f32]) -> Self {
        Self::new(coeffs.chunks_exact(4).map(Vec4::from_slice).collect())
    }

    pub fn planes(&self) -> &[Vec4] {
        &self.planes
    }

    /// True when `point` lies outside at least one plane.
    pub fn clips(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .any(|p| p.x * point.x + p.y * point.y + p.z * point.z > p.w)
    }
}
