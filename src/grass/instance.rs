//! GPU-layout records produced and consumed by the grass passes.

use bytemuck::{Pod, Zeroable};

use crate::core::types::{Mat3, Vec2, Vec3};

/// One blade ready for the vertex stage (84 bytes, 21 floats).
///
/// The vertex stage places a mesh UV `(u, v)` at
/// `position + rotation * (curve(v).x * height * forward + (u - 0.5) * width * right
/// + curve(v).y * height * up)`, where `curve` is the quadratic Bezier from the
/// root through `bezier_mid` to `bezier_end`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GrassInstance {
    pub position: [f32; 3],
    /// Columns: right, up, forward
    pub rotation: [[f32; 3]; 3],
    pub bezier_mid: [f32; 2],
    pub bezier_end: [f32; 2],
    /// Blade wind `xy` and flutter in `z`
    pub wind_factor: [f32; 3],
    pub width: f32,
    pub height: f32,
}

impl GrassInstance {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn basis(&self) -> Mat3 {
        Mat3::from_cols_array_2d(&self.rotation)
    }

    /// Point on the blade's centre line at parameter `t` in `[0, 1]`
    pub fn curve_point(&self, t: f32) -> Vec3 {
        let mid = Vec2::from_array(self.bezier_mid);
        let end = Vec2::from_array(self.bezier_end);
        let s = 1.0 - t;
        let c = mid * (2.0 * s * t) + end * (t * t);
        let basis = self.basis();
        self.position() + (basis.z_axis * c.x + basis.y_axis * c.y) * self.height
    }
}

/// Per-blade state carried between frames, indexed by stable blade id.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BladeFrameState {
    /// Integrated wind in the XZ plane
    pub wind: [f32; 2],
    pub view_rotation: f32,
    pub view_tilt: f32,
}

/// A visible chunk: world centre and its index in the tile grid (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuGrassChunk {
    pub center: [f32; 3],
    pub index: u32,
}
