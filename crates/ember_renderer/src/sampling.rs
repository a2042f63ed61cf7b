//! Random sampling helpers for antialiasing, depth of field and ambient occlusion.

use ember_math::{Vec2, Vec3};
use rand::Rng;

/// Per-worker base seeds. Mixed with the node index so no two workers in a
/// cluster share a stream.
const WORKER_SEEDS: [u64; 11] = [
    12345678, 3498711, 19872134, 1004141, 1275987, 23904273, 2091097, 19872727, 31337, 20872837,
    1020733,
];

/// Seed for worker `tid` on node `node`.
pub fn seed_for_worker(tid: usize, node: usize) -> u64 {
    WORKER_SEEDS[tid % WORKER_SEEDS.len()] + node as u64 * 31337
}

/// Sub-pixel offset with both components in [-0.5, 0.5).
#[inline]
pub fn jitter_offset2(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5)
}

/// Uniformly distributed unit vector, by rejection from the cube.
pub fn jitter_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
        );
        let len2 = p.length_squared();
        if len2 <= 0.25 && len2 > 0.0 {
            return p / len2.sqrt();
        }
    }
}
