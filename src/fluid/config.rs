//! Fluid solver configuration.

use serde::{Deserialize, Serialize};

use crate::compute::GROUP_SIZE;
use crate::core::error::Error;
use crate::core::types::Result;

/// One pass of the per-frame solver. Stages run in list order; a stage not
/// in the list is skipped and leaves its buffers untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimStage {
    AdvectDensity,
    AdvectVelocity,
    ApplyImpulse,
    DiffuseDensity,
    DiffuseVelocity,
    SolvePressure,
}

impl SimStage {
    /// Canonical stage order
    pub const ALL: [SimStage; 6] = [
        SimStage::AdvectDensity,
        SimStage::AdvectVelocity,
        SimStage::ApplyImpulse,
        SimStage::DiffuseDensity,
        SimStage::DiffuseVelocity,
        SimStage::SolvePressure,
    ];
}

/// What the preview map shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    /// Composite `(u, v, density, pressure)`
    #[default]
    Fluid,
    Density,
    Velocity,
    Pressure,
}

/// Configuration of a [`super::FluidSimulation`]. Fixed for the lifetime of
/// the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    /// Cells per side; a multiple of 8 (16..=2048 in practice)
    pub resolution: u32,
    /// World-space edge length covered by the grid
    pub simulation_size: f32,
    /// Texels per side of the fluid and preview maps
    pub map_resolution: u32,

    /// Impulse radius in cells
    pub impulse_radius: f32,
    pub impulse_speed: f32,
    pub impulse_density: f32,

    pub density_dissipation: f32,
    pub velocity_dissipation: f32,

    pub density_viscosity: f32,
    pub velocity_viscosity: f32,

    pub density_diffusion_steps: u32,
    pub velocity_diffusion_steps: u32,
    pub pressure_steps: u32,

    /// Enabled stages in execution order
    pub stages: Vec<SimStage>,
    pub preview: PreviewKind,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            simulation_size: 5.0,
            map_resolution: 128,
            impulse_radius: 20.0,
            impulse_speed: 100.0,
            impulse_density: 1.0,
            density_dissipation: 0.99,
            velocity_dissipation: 0.99,
            density_viscosity: 0.01,
            velocity_viscosity: 0.01,
            density_diffusion_steps: 3,
            velocity_diffusion_steps: 3,
            pressure_steps: 10,
            stages: SimStage::ALL.to_vec(),
            preview: PreviewKind::Fluid,
        }
    }
}

impl FluidConfig {
    /// World units per cell
    pub fn cell_size(&self) -> f32 {
        self.simulation_size / self.resolution as f32
    }

    /// Whether `stage` is enabled
    pub fn runs(&self, stage: SimStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Check every construction precondition.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 || self.resolution % GROUP_SIZE != 0 {
            return Err(Error::config(format!(
                "fluid resolution {} must be a non-zero multiple of {}",
                self.resolution, GROUP_SIZE
            )));
        }
        if self.map_resolution == 0 || self.map_resolution % GROUP_SIZE != 0 {
            return Err(Error::config(format!(
                "fluid map resolution {} must be a non-zero multiple of {}",
                self.map_resolution, GROUP_SIZE
            )));
        }
        if !(self.simulation_size > 0.0) {
            return Err(Error::config(format!(
                "simulation size must be positive, got {}",
                self.simulation_size
            )));
        }
        for (name, value) in [
            ("density_dissipation", self.density_dissipation),
            ("velocity_dissipation", self.velocity_dissipation),
        ] {
            if !(0.8..=1.0).contains(&value) {
                return Err(Error::config(format!("{} {} outside [0.8, 1.0]", name, value)));
            }
        }
        if self.runs(SimStage::DiffuseDensity) && !(self.density_viscosity > 0.0) {
            return Err(Error::config("density diffusion needs a positive viscosity"));
        }
        if self.runs(SimStage::DiffuseVelocity) && !(self.velocity_viscosity > 0.0) {
            return Err(Error::config("velocity diffusion needs a positive viscosity"));
        }
        if self.impulse_radius < 0.0 {
            return Err(Error::config("impulse radius must not be negative"));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].contains(stage) {
                return Err(Error::config(format!("stage {:?} listed twice", stage)));
            }
        }
        Ok(())
    }
}
