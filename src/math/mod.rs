//! Mathematical utilities and data structures

pub mod aabb;
pub mod frustum;

pub use aabb::{Aabb, BOUNDS_OFFSETS};
pub use frustum::{Plane, Frustum};

/// Integer hash of a 2D lattice point to [0, 1].
pub fn hash_2d(ix: i32, iy: i32, seed: u32) -> f32 {
    let mut h = (ix as u32).wrapping_mul(374761393)
        .wrapping_add((iy as u32).wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1274126177));
    h = (h ^ (h >> 13)).wrapping_mul(1103515245);
    h = h ^ (h >> 16);
    (h & 0x7FFFFFFF) as f32 / 0x7FFFFFFF_u32 as f32
}
