//! Grid-based stable-fluids solver.
//!
//! One [`FluidSimulation::step`] runs the configured stages (advection,
//! impulse, diffusion, pressure projection) over double-buffered grids and
//! then renders the result into the fluid map sampled by the wind system.

pub mod config;
pub mod kernels;

pub use config::{FluidConfig, PreviewKind, SimStage};

use crate::compute::{dispatch_2d, Cell, SimGrid, Texture2D};
use crate::core::types::{Result, UVec2, Vec2, Vec3, Vec4};

/// External forcing for one step, in normalized grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impulse {
    /// Point of application, `[0, 1]` on both axes
    pub uv: Vec2,
    /// Unit push direction in the grid plane
    pub direction: Vec2,
}

impl Impulse {
    /// Project a world-space emitter onto a grid of edge `simulation_size`
    /// centred on `center` (grid x/y = world x/z). Positions off the grid are
    /// clamped to its edge.
    pub fn from_world(position: Vec3, forward: Vec3, center: Vec3, simulation_size: f32) -> Self {
        let local = (position - center) / simulation_size;
        Self {
            uv: Vec2::new(local.x + 0.5, local.z + 0.5).clamp(Vec2::ZERO, Vec2::ONE),
            direction: Vec2::new(forward.x, forward.z).normalize_or_zero(),
        }
    }
}

/// Stable-fluids simulation over a square grid.
pub struct FluidSimulation {
    config: FluidConfig,
    density: SimGrid<f32>,
    velocity: SimGrid<Vec2>,
    pressure: SimGrid<f32>,
    divergence: SimGrid<f32>,
    /// Right-hand sides of the diffusion solves, captured before iterating
    density_rhs: Vec<f32>,
    velocity_rhs: Vec<Vec2>,
    fluid_map: Texture2D<Vec4>,
    preview_map: Texture2D<Vec4>,
    step_count: u64,
}

impl FluidSimulation {
    /// Allocate all grids and maps. Fails on an invalid configuration.
    pub fn new(config: FluidConfig) -> Result<Self> {
        config.validate()?;
        let res = config.resolution;
        let cells = (res as usize) * (res as usize);

        let mut density = SimGrid::new(res)?;
        let mut velocity = SimGrid::new(res)?;
        let mut pressure = SimGrid::new(res)?;
        let mut divergence = SimGrid::new(res)?;
        density.initialize(0.0);
        velocity.initialize(Vec2::ZERO);
        pressure.initialize(0.0);
        divergence.initialize(0.0);

        let fluid_map = Texture2D::new(config.map_resolution, config.map_resolution)?;
        let preview_map = Texture2D::new(config.map_resolution, config.map_resolution)?;

        log::info!(
            "Fluid simulation: {}x{} grid over {:.1}m ({:.3}m cells), {}x{} map, stages {:?}",
            res,
            res,
            config.simulation_size,
            config.cell_size(),
            config.map_resolution,
            config.map_resolution,
            config.stages
        );

        Ok(Self {
            config,
            density,
            velocity,
            pressure,
            divergence,
            density_rhs: vec![0.0; cells],
            velocity_rhs: vec![Vec2::ZERO; cells],
            fluid_map,
            preview_map,
            step_count: 0,
        })
    }

    /// Advance the simulation by `dt` seconds. A non-positive `dt` is skipped.
    pub fn step(&mut self, dt: f32, impulse: Option<&Impulse>) {
        if !(dt > 0.0) {
            log::trace!("Fluid step skipped (dt = {})", dt);
            return;
        }

        for i in 0..self.config.stages.len() {
            match self.config.stages[i] {
                SimStage::AdvectDensity => self.advect_density(dt),
                SimStage::AdvectVelocity => self.advect_velocity(dt),
                SimStage::ApplyImpulse => {
                    if let Some(impulse) = impulse {
                        self.apply_impulse(impulse, dt);
                    }
                }
                SimStage::DiffuseDensity => {
                    let (alpha, rbeta) = self.diffusion_coefficients(self.config.density_viscosity, dt);
                    diffuse(
                        &mut self.density,
                        &mut self.density_rhs,
                        self.config.density_diffusion_steps,
                        alpha,
                        rbeta,
                    );
                }
                SimStage::DiffuseVelocity => {
                    let (alpha, rbeta) = self.diffusion_coefficients(self.config.velocity_viscosity, dt);
                    diffuse(
                        &mut self.velocity,
                        &mut self.velocity_rhs,
                        self.config.velocity_diffusion_steps,
                        alpha,
                        rbeta,
                    );
                }
                SimStage::SolvePressure => self.project(),
            }
        }

        self.render_maps();
        self.step_count += 1;
        log::trace!("Fluid step {} (dt = {:.4})", self.step_count, dt);
    }

    fn advect_density(&mut self, dt: f32) {
        let res = self.resolution();
        let dissipation = self.config.density_dissipation;
        let velocity = self.velocity.read();
        let (source, out) = self.density.read_write();
        dispatch_2d(res, out, |id| kernels::advect(id, res, velocity, source, dt, dissipation));
        self.density.swap();
    }

    fn advect_velocity(&mut self, dt: f32) {
        let res = self.resolution();
        let dissipation = self.config.velocity_dissipation;
        let (velocity, out) = self.velocity.read_write();
        dispatch_2d(res, out, |id| kernels::advect(id, res, velocity, velocity, dt, dissipation));
        self.velocity.swap();
    }

    fn apply_impulse(&mut self, impulse: &Impulse, dt: f32) {
        let res = self.resolution();
        let center = impulse.uv * res as f32;
        let radius = self.config.impulse_radius;
        let push = impulse.direction * self.config.impulse_speed * dt;
        let amount = self.config.impulse_density * dt;

        let (velocity, out) = self.velocity.read_write();
        dispatch_2d(res, out, |id| {
            velocity[(id.x + id.y * res) as usize] + push * kernels::splat(id, center, radius)
        });
        let (density, out) = self.density.read_write();
        dispatch_2d(res, out, |id| {
            density[(id.x + id.y * res) as usize] + amount * kernels::splat(id, center, radius)
        });

        self.velocity.swap();
        self.density.swap();
    }

    fn diffusion_coefficients(&self, viscosity: f32, dt: f32) -> (f32, f32) {
        let grid_scale = self.resolution() as f32;
        let alpha = 1.0 / (grid_scale * grid_scale * viscosity * dt);
        (alpha, 1.0 / (alpha + 4.0))
    }

    /// Divergence, pressure solve, gradient subtraction.
    fn project(&mut self) {
        let res = self.resolution();

        let velocity = self.velocity.read();
        dispatch_2d(res, self.divergence.write(), |id| kernels::divergence(id, res, velocity));
        self.divergence.swap();

        // Warm start from the previous frame's pressure
        let divergence = self.divergence.read();
        for _ in 0..self.config.pressure_steps {
            let (pressure, out) = self.pressure.read_write();
            dispatch_2d(res, out, |id| kernels::jacobi(id, res, pressure, divergence, -1.0, 0.25));
            self.pressure.swap();
        }

        let pressure = self.pressure.read();
        let (velocity, out) = self.velocity.read_write();
        dispatch_2d(res, out, |id| kernels::subtract_gradient(id, res, pressure, velocity));
        self.velocity.swap();
    }

    /// Add a velocity texture into the velocity grid, resampled to the grid.
    pub fn add_velocity_field(&mut self, field: &Texture2D<Vec2>) {
        let res = self.resolution();
        let (velocity, out) = self.velocity.read_write();
        dispatch_2d(res, out, |id| {
            let uv = (id.as_vec2() + 0.5) / res as f32;
            velocity[(id.x + id.y * res) as usize] + field.sample_clamped(uv)
        });
        self.velocity.swap();
        self.render_maps();
    }

    fn render_maps(&mut self) {
        let res = self.resolution();
        let map_res = self.fluid_map.width();
        let velocity = self.velocity.read();
        let density = self.density.read();
        let pressure = self.pressure.read();
        dispatch_2d(map_res, self.fluid_map.data_mut(), |id| {
            kernels::composite(id, map_res, res, velocity, density, pressure)
        });

        let fluid = self.fluid_map.data();
        let kind = self.config.preview;
        dispatch_2d(map_res, self.preview_map.data_mut(), |id| {
            let texel = fluid[(id.x + id.y * map_res) as usize];
            match kind {
                PreviewKind::Fluid => texel,
                PreviewKind::Density => Vec4::new(texel.z, texel.z, texel.z, 1.0),
                PreviewKind::Velocity => Vec4::new(texel.x, texel.y, 0.0, 1.0),
                PreviewKind::Pressure => Vec4::new(texel.w, texel.w, texel.w, 1.0),
            }
        });
    }

    /// Seed the density grid (both buffers).
    pub fn initialize_density(&mut self, values: &[f32]) -> Result<()> {
        self.density.initialize_from(values)?;
        self.render_maps();
        Ok(())
    }

    /// Seed the velocity grid (both buffers).
    pub fn initialize_velocity(&mut self, values: &[Vec2]) -> Result<()> {
        self.velocity.initialize_from(values)?;
        self.render_maps();
        Ok(())
    }

    /// Largest absolute divergence of the current velocity field.
    pub fn max_divergence(&self) -> f32 {
        let res = self.resolution();
        let velocity = self.velocity.read();
        (0..res * res)
            .map(|i| kernels::divergence(UVec2::new(i % res, i / res), res, velocity).abs())
            .fold(0.0, f32::max)
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    /// Cells per side
    pub fn resolution(&self) -> u32 {
        self.config.resolution
    }

    pub fn density(&self) -> &[f32] {
        self.density.read()
    }

    pub fn velocity(&self) -> &[Vec2] {
        self.velocity.read()
    }

    pub fn pressure(&self) -> &[f32] {
        self.pressure.read()
    }

    pub fn divergence(&self) -> &[f32] {
        self.divergence.read()
    }

    /// Composite `(u, v, density, pressure)` map, rewritten every step
    pub fn fluid_map(&self) -> &Texture2D<Vec4> {
        &self.fluid_map
    }

    /// Map selected by [`FluidConfig::preview`]
    pub fn preview_map(&self) -> &Texture2D<Vec4> {
        &self.preview_map
    }

    /// Completed steps
    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}

/// Jacobi diffusion of `grid` against its own value before the first
/// iteration.
fn diffuse<T: Cell>(grid: &mut SimGrid<T>, rhs: &mut [T], steps: u32, alpha: f32, rbeta: f32) {
    let res = grid.resolution();
    rhs.copy_from_slice(grid.read());
    let b: &[T] = rhs;
    for _ in 0..steps {
        let (x, out) = grid.read_write();
        dispatch_2d(res, out, |id| kernels::jacobi(id, res, x, b, alpha, rbeta));
        grid.swap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(resolution: u32, stages: &[SimStage]) -> FluidConfig {
        FluidConfig {
            resolution,
            map_resolution: resolution,
            stages: stages.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(FluidSimulation::new(config(0, &[])).is_err());
        assert!(FluidSimulation::new(config(60, &[])).is_err());
        let mut bad = config(32, &[]);
        bad.simulation_size = 0.0;
        assert!(FluidSimulation::new(bad).is_err());
    }

    #[test]
    fn test_identity_advection_without_dissipation() {
        let mut c = config(16, &[SimStage::AdvectDensity, SimStage::AdvectVelocity]);
        c.density_dissipation = 1.0;
        c.velocity_dissipation = 1.0;
        let mut sim = FluidSimulation::new(c).unwrap();
        let seed: Vec<f32> = (0..256).map(|i| ((i * 37) % 11) as f32 * 0.1).collect();
        sim.initialize_density(&seed).unwrap();

        for _ in 0..10 {
            sim.step(0.016, None);
        }
        assert_eq!(sim.density(), seed.as_slice());
        assert!(sim.velocity().iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn test_uniform_velocity_carries_density_and_itself() {
        let res = 16;
        let mut c = config(res, &[SimStage::AdvectDensity, SimStage::AdvectVelocity]);
        c.density_dissipation = 1.0;
        c.velocity_dissipation = 1.0;
        let mut sim = FluidSimulation::new(c).unwrap();

        // Two cells per second along +x: each 0.5 s step shifts by one cell
        let wind = Vec2::new(2.0, 0.0);
        sim.initialize_velocity(&vec![wind; (res * res) as usize]).unwrap();
        let ramp: Vec<f32> = (0..res * res).map(|i| (i % res) as f32).collect();
        sim.initialize_density(&ramp).unwrap();

        for step in 1..=5u32 {
            sim.step(0.5, None);
            assert!(sim.velocity().iter().all(|v| *v == wind), "velocity changed at step {}", step);
            for (i, &d) in sim.density().iter().enumerate() {
                let x = i as u32 % res;
                assert_eq!(d, x.saturating_sub(step) as f32, "density at x = {} after {} steps", x, step);
            }
        }
    }

    #[test]
    fn test_impulse_scenario_at_grid_center() {
        let mut c = config(
            64,
            &[SimStage::AdvectDensity, SimStage::AdvectVelocity, SimStage::ApplyImpulse],
        );
        c.impulse_speed = 10.0;
        c.impulse_radius = 5.0;
        let mut sim = FluidSimulation::new(c).unwrap();
        let impulse = Impulse {
            uv: Vec2::splat(0.5),
            direction: Vec2::X,
        };
        sim.step(0.1, Some(&impulse));

        let res = sim.resolution();
        let speed_at = |x: u32, y: u32| sim.velocity()[(x + y * res) as usize].length();
        assert!(speed_at(32, 32) > 0.0);

        // Decays monotonically along each axis inside the radius
        let mut previous = speed_at(32, 32);
        for x in 33..37 {
            let s = speed_at(x, 32);
            assert!(s < previous, "speed not decreasing at x = {}", x);
            previous = s;
        }

        // Exactly zero on and beyond the radius
        for y in 0..res {
            for x in 0..res {
                let r = Vec2::new(x as f32 - 32.0, y as f32 - 32.0).length();
                if r >= 5.0 {
                    assert_eq!(speed_at(x, y), 0.0, "non-zero velocity at ({}, {})", x, y);
                    assert_eq!(sim.density()[(x + y * res) as usize], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_projection_reduces_divergence() {
        let res = 32;
        let mut sim = FluidSimulation::new(config(res, &[SimStage::SolvePressure])).unwrap();
        let center = Vec2::splat(16.0);
        let blob: Vec<Vec2> = (0..res * res)
            .map(|i| {
                let p = Vec2::new((i % res) as f32, (i / res) as f32) - center;
                if p.length() < 4.0 { p } else { Vec2::ZERO }
            })
            .collect();
        sim.initialize_velocity(&blob).unwrap();

        let before = sim.max_divergence();
        sim.step(0.016, None);
        let after = sim.max_divergence();
        assert!(before > 0.0);
        assert!(after < before, "divergence {} -> {}", before, after);
    }

    #[test]
    fn test_skipped_stages_leave_grids_untouched() {
        let mut sim = FluidSimulation::new(config(16, &[SimStage::ApplyImpulse])).unwrap();
        let velocity: Vec<Vec2> = (0..256).map(|i| Vec2::new(i as f32, 1.0)).collect();
        sim.initialize_velocity(&velocity).unwrap();

        // No impulse supplied: nothing runs
        sim.step(0.016, None);
        assert_eq!(sim.velocity(), velocity.as_slice());
        assert!(sim.pressure().iter().all(|p| *p == 0.0));
        assert_eq!(sim.step_count(), 1);
    }

    #[test]
    fn test_non_positive_dt_skips_step() {
        let mut sim = FluidSimulation::new(config(16, &SimStage::ALL)).unwrap();
        let impulse = Impulse {
            uv: Vec2::splat(0.5),
            direction: Vec2::Y,
        };
        sim.step(0.0, Some(&impulse));
        sim.step(-1.0, Some(&impulse));
        assert_eq!(sim.step_count(), 0);
        assert!(sim.density().iter().all(|d| *d == 0.0));
    }

    #[test]
    fn test_diffusion_spreads_density() {
        let mut sim = FluidSimulation::new(config(16, &[SimStage::DiffuseDensity])).unwrap();
        let mut seed = vec![0.0f32; 256];
        seed[8 + 8 * 16] = 1.0;
        sim.initialize_density(&seed).unwrap();
        sim.step(0.016, None);
        let density = sim.density();
        assert!(density[8 + 8 * 16] < 1.0);
        assert!(density[9 + 8 * 16] > 0.0);
    }

    #[test]
    fn test_fluid_map_composite_and_preview() {
        let mut c = config(16, &[SimStage::ApplyImpulse]);
        c.preview = PreviewKind::Density;
        c.impulse_radius = 4.0;
        let mut sim = FluidSimulation::new(c).unwrap();
        let impulse = Impulse {
            uv: Vec2::splat(0.5),
            direction: Vec2::X,
        };
        sim.step(0.1, Some(&impulse));

        let texel = sim.fluid_map().texel(8, 8);
        assert!(texel.x > 0.0);
        assert_eq!(texel.y, 0.0);
        assert!(texel.z > 0.0);
        let preview = sim.preview_map().texel(8, 8);
        assert_eq!(preview, Vec4::new(texel.z, texel.z, texel.z, 1.0));
    }

    #[test]
    fn test_add_velocity_field() {
        let mut sim = FluidSimulation::new(config(16, &[])).unwrap();
        let field = Texture2D::filled(4, 4, Vec2::new(0.5, -0.25)).unwrap();
        sim.add_velocity_field(&field);
        sim.add_velocity_field(&field);
        assert!(sim.velocity().iter().all(|v| (*v - Vec2::new(1.0, -0.5)).length() < 1e-6));
    }

    #[test]
    fn test_impulse_from_world() {
        let impulse = Impulse::from_world(
            Vec3::new(1.0, 3.0, -1.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::ZERO,
            4.0,
        );
        assert!((impulse.uv - Vec2::new(0.75, 0.25)).length() < 1e-6);
        assert_eq!(impulse.direction, Vec2::Y);

        let off_grid = Impulse::from_world(Vec3::new(100.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, 4.0);
        assert_eq!(off_grid.uv, Vec2::new(1.0, 0.5));
    }
}
