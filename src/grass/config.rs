//! Grass configuration: tile layout and per-renderer blade tunables.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};

/// Placement of one square grass tile and its chunk grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassTileConfig {
    /// World-space tile centre; its `y` is the ground height when no terrain is bound
    pub center: [f32; 3],
    /// Edge length of the tile
    pub tile_size: f32,
    /// Requested chunk edge length, rounded so chunks tile exactly
    pub chunk_size: f32,
    /// Blades per chunk edge
    pub per_chunk: u32,
}

impl Default for GrassTileConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            tile_size: 10.0,
            chunk_size: 1.0,
            per_chunk: 16,
        }
    }
}

impl GrassTileConfig {
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    /// Chunks along one tile edge
    pub fn chunks_per_tile(&self) -> u32 {
        ((self.tile_size / self.chunk_size).round() as u32).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tile_size > 0.0) || !self.tile_size.is_finite() {
            return Err(Error::config(format!("grass tile size must be positive, got {}", self.tile_size)));
        }
        if !(self.chunk_size > 0.0) || self.chunk_size > self.tile_size * 2.0 {
            return Err(Error::config(format!(
                "grass chunk size {} does not fit tile size {}",
                self.chunk_size, self.tile_size
            )));
        }
        if self.per_chunk == 0 {
            return Err(Error::config("grass tile needs at least one blade per chunk"));
        }
        // Chunk indices and blade ids are 32-bit
        let chunks_per_tile = self.chunks_per_tile();
        let blades = chunks_per_tile
            .checked_mul(chunks_per_tile)
            .and_then(|chunks| chunks.checked_mul(self.per_chunk))
            .and_then(|blades| blades.checked_mul(self.per_chunk));
        if blades.is_none() {
            return Err(Error::config(format!(
                "grass tile of {}x{} chunks with {}x{} blades each exceeds the 32-bit blade range",
                chunks_per_tile, chunks_per_tile, self.per_chunk, self.per_chunk
            )));
        }
        Ok(())
    }
}

/// Blade shape, wind response and view-offset tunables of one renderer.
/// Read once per frame; ranges are `[min, max]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassRendererData {
    /// Maximum random offset from the blade's grid point
    pub offset_strength: f32,
    pub width_range: [f32; 2],
    pub height_range: [f32; 2],
    /// Facing as a fraction of a full turn
    pub default_angle: f32,
    /// 0 = every blade faces `default_angle`, 1 = fully random facing
    pub facing_randomness: f32,
    /// Depth slack for the chunk occlusion test
    pub occlusion_offset: f32,

    pub tilt: f32,
    pub bend: f32,
    /// Position of the curve's middle control point along the blade, `[0, 1]`
    pub bend_pos: f32,
    /// Fraction of last frame's blade wind kept each frame
    pub wind_dissipation: f32,
    /// Fraction of the sampled wind added each frame
    pub wind_effect: f32,
    /// Flutter cycles per second
    pub flutter: f32,
    pub stiffness: f32,

    pub apply_view_offset: bool,
    /// Per-frame blend toward the target view offset
    pub offset_frame_smoothing: f32,
    /// Alignment window over which blades seen edge-on turn toward the camera
    pub side_view_range: [f32; 2],
    pub side_view_rot_offset: f32,
    /// Alignment window over which blades seen from above tilt away
    pub top_view_range: [f32; 2],
    pub top_view_rot_offset: f32,

    pub seed: u32,
}

impl Default for GrassRendererData {
    fn default() -> Self {
        Self {
            offset_strength: 0.1,
            width_range: [1.0, 1.0],
            height_range: [1.0, 1.0],
            default_angle: 0.0,
            facing_randomness: 0.0,
            occlusion_offset: 0.1,
            tilt: 0.1,
            bend: 0.1,
            bend_pos: 0.5,
            wind_dissipation: 0.99,
            wind_effect: 0.01,
            flutter: 1.0,
            stiffness: 0.0,
            apply_view_offset: false,
            offset_frame_smoothing: 0.1,
            side_view_range: [0.98, 1.0],
            side_view_rot_offset: 0.1,
            top_view_range: [0.98, 1.0],
            top_view_rot_offset: 0.1,
            seed: 0,
        }
    }
}

impl GrassRendererData {
    pub fn width_range(&self) -> Vec2 {
        Vec2::from_array(self.width_range)
    }

    pub fn height_range(&self) -> Vec2 {
        Vec2::from_array(self.height_range)
    }

    /// Tallest blade this renderer can produce
    pub fn max_height(&self) -> f32 {
        self.height_range[0].max(self.height_range[1])
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.offset_strength >= 0.0) {
            return Err(Error::config(format!(
                "offset strength must be non-negative, got {}",
                self.offset_strength
            )));
        }
        for (name, range) in [
            ("width", self.width_range),
            ("height", self.height_range),
            ("side view", self.side_view_range),
            ("top view", self.top_view_range),
        ] {
            if !(range[0] <= range[1]) {
                return Err(Error::config(format!("{} range {:?} is inverted", name, range)));
            }
        }
        if self.width_range[0] < 0.0 || self.height_range[0] < 0.0 {
            return Err(Error::config("blade width and height must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.bend_pos) {
            return Err(Error::config(format!("bend position must be in [0, 1], got {}", self.bend_pos)));
        }
        if !(0.0..=1.0).contains(&self.wind_dissipation) {
            return Err(Error::config(format!(
                "wind dissipation must be in [0, 1], got {}",
                self.wind_dissipation
            )));
        }
        if !(0.0..=1.0).contains(&self.offset_frame_smoothing) {
            return Err(Error::config(format!(
                "offset frame smoothing must be in [0, 1], got {}",
                self.offset_frame_smoothing
            )));
        }
        if self.stiffness < 0.0 {
            return Err(Error::config(format!("stiffness must be non-negative, got {}", self.stiffness)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GrassTileConfig::default().validate().is_ok());
        assert!(GrassRendererData::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_tile() {
        let tile = GrassTileConfig { per_chunk: 0, ..Default::default() };
        assert!(tile.validate().is_err());
        let tile = GrassTileConfig { chunk_size: 0.0, ..Default::default() };
        assert!(tile.validate().is_err());
        let tile = GrassTileConfig { tile_size: -1.0, ..Default::default() };
        assert!(tile.validate().is_err());
        let tile = GrassTileConfig { tile_size: f32::INFINITY, ..Default::default() };
        assert!(tile.validate().is_err());
    }

    #[test]
    fn test_tile_blade_count_fits_u32() {
        let tile = GrassTileConfig { tile_size: 100000.0, chunk_size: 1.0, per_chunk: 1, ..Default::default() };
        assert!(matches!(tile.validate(), Err(Error::InvalidConfig(_))));

        // 256x256 chunks: 256 blades per edge reach 2^32, 255 stay below it
        let tile = GrassTileConfig { tile_size: 256.0, chunk_size: 1.0, per_chunk: 256, ..Default::default() };
        assert_eq!(tile.chunks_per_tile(), 256);
        assert!(tile.validate().is_err());
        let tile = GrassTileConfig { per_chunk: 255, ..tile };
        assert!(tile.validate().is_ok());
    }

    #[test]
    fn test_invalid_renderer_data() {
        let data = GrassRendererData { height_range: [2.0, 1.0], ..Default::default() };
        assert!(data.validate().is_err());
        let data = GrassRendererData { bend_pos: 1.5, ..Default::default() };
        assert!(data.validate().is_err());
        let data = GrassRendererData { wind_dissipation: 1.1, ..Default::default() };
        assert!(data.validate().is_err());
        let data = GrassRendererData { stiffness: -1.0, ..Default::default() };
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let data: GrassRendererData =
            serde_json::from_str(r#"{ "height_range": [0.5, 2.0], "apply_view_offset": true }"#).unwrap();
        assert_eq!(data.max_height(), 2.0);
        assert!(data.apply_view_offset);
        assert_eq!(data.bend_pos, 0.5);
    }
}
