//! Noise-based heightmap generation

use bytemuck::{Pod, Zeroable};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::compute::{dispatch_2d, Texture2D};
use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3, Vec4};
use super::buffer::TerrainBuffer;

/// Parameters controlling terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u32,
    /// Texels per side of the generated buffer
    pub buffer_width: u32,
    /// World-space edge length covered by the buffer
    pub size: f32,
    /// Lowest possible height
    pub floor: f32,
    /// Height range above the floor
    pub height: f32,
    /// Finite-difference step for normals, in world units
    pub normal_step: f32,
    /// Noise frequency per world unit
    pub noise_scale: f32,
    pub octaves: u32,     // FBM octaves (detail levels)
    pub persistence: f32, // FBM persistence (0.5 typical)
    pub lacunarity: f32,  // FBM lacunarity (2.0 typical)
    /// World position of the buffer centre
    pub center: [f32; 3],
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            buffer_width: 128,
            size: 100.0,
            floor: 0.1,
            height: 5.0,
            normal_step: 0.1,
            noise_scale: 0.01,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            center: [0.0; 3],
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_width < 2 {
            return Err(Error::config(format!(
                "terrain buffer width must be at least 2, got {}",
                self.buffer_width
            )));
        }
        if !(self.size > 0.0) || !(self.normal_step > 0.0) {
            return Err(Error::config("terrain size and normal step must be positive"));
        }
        if self.height < 0.0 {
            return Err(Error::config("terrain height must not be negative"));
        }
        Ok(())
    }
}

/// One terrain buffer element (16 bytes): height, then the surface normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainTexel {
    pub height: f32,
    pub normal: [f32; 3],
}

/// Procedural terrain generator using fractal Brownian motion (FBM)
pub struct TerrainGenerator {
    config: TerrainConfig,
    noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    /// Create a new terrain generator with the given parameters
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;
        let noise = Fbm::<Perlin>::new(config.seed)
            .set_octaves(config.octaves as usize)
            .set_persistence(config.persistence as f64)
            .set_lacunarity(config.lacunarity as f64);

        Ok(Self { config, noise })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Terrain height at world position (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x * self.config.noise_scale) as f64;
        let nz = (z * self.config.noise_scale) as f64;

        // Noise in [-1, 1] mapped to [floor, floor + height]
        let n = self.noise.get([nx, nz]).clamp(-1.0, 1.0);
        let normalized = ((n + 1.0) * 0.5) as f32;
        self.config.floor + normalized * self.config.height
    }

    /// Surface normal at world position (x, z) by central differences
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let e = self.config.normal_step;
        let dx = self.height_at(x - e, z) - self.height_at(x + e, z);
        let dz = self.height_at(x, z - e) - self.height_at(x, z + e);
        Vec3::new(dx, 2.0 * e, dz).normalize()
    }

    /// Fill a heightmap buffer covering `size` x `size` around the centre.
    pub fn generate(&self) -> Result<TerrainBuffer> {
        let width = self.config.buffer_width;
        let size = self.config.size;
        let center = Vec3::from_array(self.config.center);
        let mut map = Texture2D::<Vec4>::new(width, width)?;

        dispatch_2d(width, map.data_mut(), |id| {
            let local = ((id.as_vec2() + 0.5) / width as f32 - 0.5) * size;
            let world = Vec2::new(center.x, center.z) + local;
            let height = self.height_at(world.x, world.y);
            let normal = self.normal_at(world.x, world.y);
            Vec4::new(height, normal.x, normal.y, normal.z)
        });

        let buffer = TerrainBuffer::new(center, size, map);
        let (min_h, max_h) = buffer.height_range();
        log::info!(
            "Terrain: {}x{} texels over {:.0}m, heights {:.2}..{:.2}",
            width,
            width,
            size,
            min_h,
            max_h
        );
        Ok(buffer)
    }
}
