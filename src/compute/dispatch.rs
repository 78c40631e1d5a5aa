//! Dispatch helpers mapping a kernel over a grid or an index range.

use rayon::prelude::*;

use crate::core::types::UVec2;

/// Thread-group edge length used when sizing grids. Simulation resolutions
/// must be a multiple of this.
pub const GROUP_SIZE: u32 = 8;

/// Run `kernel` once per cell of a grid `width` cells wide, storing each
/// result in the cell's slot of `out` (row-major, `x + y * width`).
pub fn dispatch_2d<T, F>(width: u32, out: &mut [T], kernel: F)
where
    T: Send,
    F: Fn(UVec2) -> T + Sync,
{
    debug_assert!(width > 0);
    out.par_iter_mut().enumerate().for_each(|(i, slot)| {
        let i = i as u32;
        *slot = kernel(UVec2::new(i % width, i / width));
    });
}

/// Run `kernel` once per index in `0..count`. Kernels communicate results
/// through shared buffers such as [`super::AppendBuffer`].
pub fn dispatch_1d<F>(count: u32, kernel: F)
where
    F: Fn(u32) + Sync + Send,
{
    (0..count).into_par_iter().for_each(kernel);
}
