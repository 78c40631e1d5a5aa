//! Global wind: procedural ambient map plus the simulated fluid map.

pub mod ambient;
pub mod config;
pub mod sample;

pub use ambient::AmbientWind;
pub use config::{direction_from_angle, AmbientWindConfig, WindConfig};
pub use sample::{WindSample, WindSignals};

use crate::core::types::{Result, Vec3};
use crate::fluid::{FluidSimulation, Impulse};

/// World-space emitter pushing the fluid (e.g. a moving character).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpulseSource {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Owns the ambient wind and the fluid simulation and publishes their
/// combined state each frame.
pub struct WindSystem {
    center: Vec3,
    ambient: AmbientWind,
    fluid: FluidSimulation,
    impulse_source: Option<ImpulseSource>,
}

impl WindSystem {
    pub fn new(config: WindConfig) -> Result<Self> {
        config.validate()?;
        let ambient = AmbientWind::new(config.ambient)?;
        let fluid = FluidSimulation::new(config.fluid)?;
        Ok(Self {
            center: Vec3::from_array(config.center),
            ambient,
            fluid,
            impulse_source: None,
        })
    }

    /// Set or clear the fluid impulse emitter
    pub fn set_impulse_source(&mut self, source: Option<ImpulseSource>) {
        self.impulse_source = source;
    }

    /// Regenerate the ambient map for `time` and advance the fluid by `dt`.
    pub fn update(&mut self, dt: f32, time: f32) {
        self.ambient.update(time);

        let size = self.fluid.config().simulation_size;
        let impulse = self
            .impulse_source
            .map(|source| Impulse::from_world(source.position, source.forward, self.center, size));
        self.fluid.step(dt, impulse.as_ref());
    }

    /// Current-frame wind state for consumers
    pub fn signals(&self) -> WindSignals<'_> {
        let config = self.ambient.config();
        WindSignals {
            center: self.center,
            ambient_size: config.size,
            direction: self.ambient.direction(),
            strength: config.strength_range(),
            fluid_strength: config.fluid_strength,
            fluid_size: self.fluid.config().simulation_size,
            ambient_map: self.ambient.map(),
            fluid_map: self.fluid.fluid_map(),
        }
    }

    pub fn ambient(&self) -> &AmbientWind {
        &self.ambient
    }

    pub fn fluid(&self) -> &FluidSimulation {
        &self.fluid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::fluid::{FluidConfig, SimStage};

    fn small_config() -> WindConfig {
        WindConfig {
            center: [5.0, 0.0, 5.0],
            ambient: AmbientWindConfig {
                map_size: 16,
                ..Default::default()
            },
            fluid: FluidConfig {
                resolution: 32,
                map_resolution: 32,
                simulation_size: 8.0,
                impulse_radius: 4.0,
                stages: vec![SimStage::ApplyImpulse],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_impulse_source_drives_fluid_wind() {
        let mut wind = WindSystem::new(small_config()).unwrap();
        wind.set_impulse_source(Some(ImpulseSource {
            position: Vec3::new(5.0, 1.0, 5.0),
            forward: Vec3::Z,
        }));
        wind.update(0.1, 0.0);

        let sample = wind.signals().sample(Vec3::new(5.0, 0.0, 5.0));
        assert!(sample.fluid.y > 0.0);
        assert!(sample.fluid.x.abs() < 1e-6);

        // Far from the emitter the fluid is still
        let far = wind.signals().sample(Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(far.fluid, Vec2::ZERO);
    }

    #[test]
    fn test_without_source_fluid_stays_still() {
        let mut wind = WindSystem::new(small_config()).unwrap();
        wind.update(0.1, 0.0);
        assert!(wind.fluid().velocity().iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn test_signals_publish_ambient_state() {
        let wind = WindSystem::new(small_config()).unwrap();
        let signals = wind.signals();
        assert_eq!(signals.center, Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(signals.ambient_size, 10.0);
        assert_eq!(signals.fluid_size, 8.0);
        assert!((signals.direction - Vec2::Y).length() < 1e-6);
        let sample = signals.sample(Vec3::new(-40.0, 0.0, 12.0));
        assert!(sample.ambient.length() <= 0.02 + 1e-6);
    }
}
