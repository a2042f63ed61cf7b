//! Geometric primitives.
//!
//! Every object in a scene wraps one of these behind the [`Primitive`]
//! trait. The intersection engine only ever talks to that trait, so adding
//! a new shape never touches the renderer.

mod aabox;
mod cone;
mod cylinder;
mod plane;
mod ring;
mod sphere;
mod triangle;

pub use aabox::AxisBox;
pub use cone::Cone;
pub use cylinder::{Cylinder, FiniteCylinder};
pub use plane::Plane;
pub use ring::Ring;
pub use sphere::Sphere;
pub use triangle::{SmoothTriangle, Triangle};

pub(crate) use sphere::sphere_roots;

use ember_math::{Aabb, Ray, Vec3};

/// Capability interface shared by all scene geometry.
pub trait Primitive: Send + Sync {
    /// Report every intersection distance of `ray` with the surface.
    ///
    /// Distances may be negative or beyond any limit; filtering is the
    /// caller's job.
    fn intersect(&self, ray: &Ray, hit: &mut dyn FnMut(f32));

    /// Unit surface normal at `point`, oriented against the incoming ray.
    fn normal(&self, point: Vec3, ray: &Ray) -> Vec3;

    /// Finite bounds, or `None` for unbounded geometry (planes, infinite
    /// cylinders, light spheres).
    fn bounding_box(&self) -> Option<Aabb> {
        None
    }

    /// Short name used in log output.
    fn kind(&self) -> &'static str;
}

/// Flip `n` so it faces against `incident`.
#[inline]
pub(crate) fn face_forward(n: Vec3, incident: Vec3) -> Vec3 {
    if n.dot(incident) > 0.0 {
        -n
    } else {
        n
    }
}
