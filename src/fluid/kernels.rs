//! Per-cell solver kernels.
//!
//! Each function computes the output of one cell from read-only inputs and is
//! mapped over the grid with [`crate::compute::dispatch_2d`]. Positions are in
//! cell-index space: cell `(x, y)` sits at `(x, y)`, neighbours are fetched
//! with clamping at the border.

use crate::compute::Cell;
use crate::compute::texture::{bilinear_clamped, fetch_clamped};
use crate::core::types::{UVec2, Vec2, Vec4};

#[inline]
fn index(id: UVec2, res: u32) -> usize {
    (id.x + id.y * res) as usize
}

/// Left, right, bottom and top neighbours of `id`
#[inline]
fn neighbours<T: Copy>(id: UVec2, res: u32, field: &[T]) -> [T; 4] {
    let (x, y) = (id.x as i32, id.y as i32);
    [
        fetch_clamped(field, res, res, x - 1, y),
        fetch_clamped(field, res, res, x + 1, y),
        fetch_clamped(field, res, res, x, y - 1),
        fetch_clamped(field, res, res, x, y + 1),
    ]
}

/// Semi-Lagrangian advection: trace the cell back along `velocity` and
/// sample `source` there.
pub fn advect<T: Cell>(
    id: UVec2,
    res: u32,
    velocity: &[Vec2],
    source: &[T],
    dt: f32,
    dissipation: f32,
) -> T {
    let back = id.as_vec2() - velocity[index(id, res)] * dt;
    bilinear_clamped(source, res, res, back) * dissipation
}

/// Impulse weight at `id`: `(1 - (r/R)^2)^2` inside the radius, 0 outside.
pub fn splat(id: UVec2, center: Vec2, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let r = id.as_vec2().distance(center) / radius;
    if r >= 1.0 {
        return 0.0;
    }
    let k = 1.0 - r * r;
    k * k
}

/// One Jacobi iteration `(xL + xR + xB + xT + alpha * b) * rbeta`.
pub fn jacobi<T: Cell>(id: UVec2, res: u32, x: &[T], b: &[T], alpha: f32, rbeta: f32) -> T {
    let [l, r, bottom, top] = neighbours(id, res, x);
    (l + r + bottom + top + b[index(id, res)] * alpha) * rbeta
}

/// Central-difference divergence of the velocity field
pub fn divergence(id: UVec2, res: u32, velocity: &[Vec2]) -> f32 {
    let [l, r, b, t] = neighbours(id, res, velocity);
    0.5 * ((r.x - l.x) + (t.y - b.y))
}

/// Velocity minus the pressure gradient
pub fn subtract_gradient(id: UVec2, res: u32, pressure: &[f32], velocity: &[Vec2]) -> Vec2 {
    let [l, r, b, t] = neighbours(id, res, pressure);
    velocity[index(id, res)] - 0.5 * Vec2::new(r - l, t - b)
}

/// Composite fluid-map texel `(u, v, density, pressure)` for a map texel,
/// resampling the grid when the map size differs from the grid size.
pub fn composite(
    id: UVec2,
    map_res: u32,
    res: u32,
    velocity: &[Vec2],
    density: &[f32],
    pressure: &[f32],
) -> Vec4 {
    let pos = (id.as_vec2() + 0.5) * (res as f32 / map_res as f32) - 0.5;
    let v = bilinear_clamped(velocity, res, res, pos);
    let d = bilinear_clamped(density, res, res, pos);
    let p = bilinear_clamped(pressure, res, res, pos);
    Vec4::new(v.x, v.y, d, p)
}
