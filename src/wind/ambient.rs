//! Procedural ambient wind map.
//!
//! A tileable value-noise texture scrolled along the wind direction. The
//! texture is regenerated every frame by a full-map dispatch, and sampled by
//! consumers with repeat addressing.

use crate::compute::{dispatch_2d, Texture2D};
use crate::core::types::{Result, Vec2};
use crate::math::hash_2d;
use super::config::AmbientWindConfig;

/// Smooth value noise in [0, 1] that repeats every `period` lattice cells.
pub fn tileable_value_noise(p: Vec2, period: i32, seed: u32) -> f32 {
    let base = p.floor();
    let f = p - base;
    // Smoothstep for C1 continuity
    let f = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let ix = (base.x as i32).rem_euclid(period);
    let iy = (base.y as i32).rem_euclid(period);
    let jx = (ix + 1) % period;
    let jy = (iy + 1) % period;

    let h00 = hash_2d(ix, iy, seed);
    let h10 = hash_2d(jx, iy, seed);
    let h01 = hash_2d(ix, jy, seed);
    let h11 = hash_2d(jx, jy, seed);

    let a = h00 + (h10 - h00) * f.x;
    let b = h01 + (h11 - h01) * f.x;
    a + (b - a) * f.y
}

/// Ambient wind field: direction, strength range and the scrolled noise map.
pub struct AmbientWind {
    config: AmbientWindConfig,
    direction: Vec2,
    period: i32,
    map: Texture2D<f32>,
}

impl AmbientWind {
    pub fn new(config: AmbientWindConfig) -> Result<Self> {
        config.validate()?;
        let map = Texture2D::new(config.map_size, config.map_size)?;
        let period = config.frequency.round().max(1.0) as i32;
        log::info!(
            "Ambient wind: {}x{} map, {} noise cells per {:.1}m tile",
            config.map_size,
            config.map_size,
            period,
            config.size
        );
        let mut ambient = Self {
            direction: config.direction(),
            config,
            period,
            map,
        };
        ambient.update(0.0);
        Ok(ambient)
    }

    /// Recompute the direction and regenerate the map for absolute `time`
    /// in seconds.
    pub fn update(&mut self, time: f32) {
        self.direction = self.config.direction();

        let size = self.config.map_size;
        let scroll = self.direction * self.config.speed * time / self.config.size;
        let period = self.period;
        let seed = self.config.seed;
        dispatch_2d(size, self.map.data_mut(), |id| {
            let uv = (id.as_vec2() + 0.5) / size as f32;
            tileable_value_noise((uv - scroll) * period as f32, period, seed)
        });
    }

    /// Change the direction angle (turns). Takes effect on the next update.
    pub fn set_angle(&mut self, angle: f32) {
        self.config.angle = angle;
    }

    pub fn config(&self) -> &AmbientWindConfig {
        &self.config
    }

    /// Current unit direction
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Noise map, values in [0, 1]
    pub fn map(&self) -> &Texture2D<f32> {
        &self.map
    }
}
