//! Per-frame inputs shared by every grass renderer.

use crate::core::camera::Camera;
use crate::terrain::TerrainBuffer;
use crate::wind::WindSignals;
use super::depth::DepthBuffer;

/// Everything a frame's grass work reads from the host and the wind system.
/// Optional inputs that are missing make consumers skip the frame.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    /// Seconds since start
    pub time: f32,
    /// Seconds since the previous frame
    pub delta_time: f32,
    pub camera: &'a Camera,
    pub depth: Option<&'a DepthBuffer>,
    pub wind: Option<WindSignals<'a>>,
    pub terrain: Option<&'a TerrainBuffer>,
}

impl<'a> FrameContext<'a> {
    pub fn new(camera: &'a Camera, time: f32, delta_time: f32) -> Self {
        Self {
            time,
            delta_time,
            camera,
            depth: None,
            wind: None,
            terrain: None,
        }
    }

    pub fn with_depth(mut self, depth: &'a DepthBuffer) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_wind(mut self, wind: WindSignals<'a>) -> Self {
        self.wind = Some(wind);
        self
    }

    pub fn with_terrain(mut self, terrain: &'a TerrainBuffer) -> Self {
        self.terrain = Some(terrain);
        self
    }
}
