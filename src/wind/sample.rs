//! Wind lookups at world positions.

use crate::compute::Texture2D;
use crate::core::types::{Vec2, Vec3, Vec4};

/// Wind at one world position, split by source.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindSample {
    /// Procedural component
    pub ambient: Vec2,
    /// Simulated component
    pub fluid: Vec2,
}

impl WindSample {
    /// Total wind in the XZ plane
    pub fn combined(&self) -> Vec2 {
        self.ambient + self.fluid
    }
}

/// Current-frame wind state published by the wind system for consumers.
#[derive(Clone, Copy)]
pub struct WindSignals<'a> {
    /// Shared centre of the ambient map and the fluid grid
    pub center: Vec3,
    /// World size of one ambient map tile
    pub ambient_size: f32,
    pub direction: Vec2,
    /// Ambient strength `[min, max]`, already divided by 100
    pub strength: Vec2,
    pub fluid_strength: f32,
    /// World size covered by the fluid map
    pub fluid_size: f32,
    pub ambient_map: &'a Texture2D<f32>,
    pub fluid_map: &'a Texture2D<Vec4>,
}

impl WindSignals<'_> {
    /// Sample both wind sources at a world position. The ambient map repeats
    /// in every direction; the fluid map contributes nothing outside its
    /// footprint.
    pub fn sample(&self, position: Vec3) -> WindSample {
        let offset = Vec2::new(position.x - self.center.x, position.z - self.center.z);

        let ambient_uv = offset / self.ambient_size + 0.5;
        let noise = self.ambient_map.sample_wrapped(ambient_uv);
        let strength = self.strength.x + (self.strength.y - self.strength.x) * noise;
        let ambient = self.direction * strength;

        let fluid_uv = offset / self.fluid_size + 0.5;
        let fluid = if fluid_uv.cmpge(Vec2::ZERO).all() && fluid_uv.cmple(Vec2::ONE).all() {
            let texel = self.fluid_map.sample_clamped(fluid_uv);
            Vec2::new(texel.x, texel.y) * self.fluid_strength
        } else {
            Vec2::ZERO
        };

        WindSample { ambient, fluid }
    }
}
