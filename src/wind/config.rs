//! Wind configuration.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Vec2};
use crate::fluid::FluidConfig;

/// Procedural ambient wind settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientWindConfig {
    /// World-space edge length of one tile of the ambient map
    pub size: f32,
    /// Scroll speed in world units per second
    pub speed: f32,
    /// Strength range `[min, max]` on a 0-100 scale
    pub strength: [f32; 2],
    /// Noise lattice cells per map tile
    pub frequency: f32,
    /// Direction as a fraction of a full turn, `[0, 1]`
    pub angle: f32,
    /// Multiplier on the fluid-map velocity
    pub fluid_strength: f32,
    /// Texels per side of the ambient map
    pub map_size: u32,
    pub seed: u32,
}

impl Default for AmbientWindConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            speed: 10.0,
            strength: [0.0, 2.0],
            frequency: 10.0,
            angle: 0.25,
            fluid_strength: 1.0,
            map_size: 256,
            seed: 7,
        }
    }
}

impl AmbientWindConfig {
    /// Unit wind direction for the configured angle
    pub fn direction(&self) -> Vec2 {
        direction_from_angle(self.angle)
    }

    /// Strength range scaled to `[0, 1]` units
    pub fn strength_range(&self) -> Vec2 {
        Vec2::from_array(self.strength) / 100.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.map_size == 0 {
            return Err(Error::config("ambient wind map size must be non-zero"));
        }
        if !(self.size > 0.0) {
            return Err(Error::config(format!("ambient wind size must be positive, got {}", self.size)));
        }
        if !(self.frequency >= 1.0) {
            return Err(Error::config(format!(
                "ambient wind frequency must be at least 1, got {}",
                self.frequency
            )));
        }
        if self.strength[0] > self.strength[1] {
            return Err(Error::config(format!(
                "ambient wind strength range {:?} is inverted",
                self.strength
            )));
        }
        Ok(())
    }
}

/// Unit direction for `angle` given in turns: `normalize(cos 2πa, sin 2πa)`.
pub fn direction_from_angle(angle: f32) -> Vec2 {
    let radians = angle * std::f32::consts::TAU;
    Vec2::new(radians.cos(), radians.sin()).normalize()
}

/// Complete wind system settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    /// World position of the wind volume's centre; the fluid grid and the
    /// ambient map are both centred here
    pub center: [f32; 3],
    pub ambient: AmbientWindConfig,
    pub fluid: FluidConfig,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            ambient: AmbientWindConfig::default(),
            fluid: FluidConfig::default(),
        }
    }
}

impl WindConfig {
    pub fn validate(&self) -> Result<()> {
        self.ambient.validate()?;
        self.fluid.validate()
    }
}
