//! Scene assembly: wind, terrain and grass driven by one frame clock.

pub mod config;

pub use config::{CameraConfig, GrassLayerConfig, SceneConfig};

use crate::core::camera::Camera;
use crate::core::time::FrameTimer;
use crate::core::types::{Result, Vec3};
use crate::grass::{GrassPass, GrassPassStats, GrassRenderer};
use crate::render::{DepthBuffer, FrameContext, GrassMesh};
use crate::terrain::{TerrainBuffer, TerrainGenerator};
use crate::wind::{ImpulseSource, WindSystem};

/// A running scene. The host owns the camera and the depth buffer; a scene
/// built from config starts with an empty (far-plane) depth buffer.
pub struct Scene {
    wind: WindSystem,
    terrain: Option<TerrainBuffer>,
    grass: GrassPass,
    camera: Camera,
    depth: DepthBuffer,
    timer: FrameTimer,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Result<Self> {
        config.validate()?;

        let mut wind = WindSystem::new(config.wind.clone())?;
        wind.set_impulse_source(config.impulse.map(|[position, forward]| ImpulseSource {
            position: Vec3::from_array(position),
            forward: Vec3::from_array(forward),
        }));

        let terrain = match &config.terrain {
            Some(terrain) => Some(TerrainGenerator::new(terrain.clone())?.generate()?),
            None => None,
        };

        let mut grass = GrassPass::new();
        for layer in &config.grass {
            let mesh = GrassMesh::blade(layer.blade_segments)?;
            grass.add(GrassRenderer::new(&layer.tile, layer.data.clone(), mesh)?);
        }

        let camera = config.camera.build();
        let [width, height] = config.camera.viewport;
        let depth = DepthBuffer::cleared(width, height, camera.far)?;

        log::info!(
            "Scene: {} grass layers, terrain {}",
            grass.len(),
            if terrain.is_some() { "generated" } else { "flat" }
        );

        Ok(Self {
            wind,
            terrain,
            grass,
            camera,
            depth,
            timer: FrameTimer::new(),
        })
    }

    /// Advance by `dt` seconds: update the wind, then run the grass pass.
    pub fn step(&mut self, dt: f32) -> GrassPassStats {
        self.timer.advance(dt);
        let time = self.timer.elapsed_secs();
        self.wind.update(dt, time);

        let mut frame = FrameContext::new(&self.camera, time, dt)
            .with_depth(&self.depth)
            .with_wind(self.wind.signals());
        if let Some(terrain) = &self.terrain {
            frame = frame.with_terrain(terrain);
        }
        self.grass.render(&frame)
    }

    pub fn wind(&self) -> &WindSystem {
        &self.wind
    }

    pub fn wind_mut(&mut self) -> &mut WindSystem {
        &mut self.wind
    }

    pub fn terrain(&self) -> Option<&TerrainBuffer> {
        self.terrain.as_ref()
    }

    pub fn grass(&self) -> &GrassPass {
        &self.grass
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Replace the host depth buffer
    pub fn set_depth(&mut self, depth: DepthBuffer) {
        self.depth = depth;
    }

    /// Seconds simulated so far
    pub fn time(&self) -> f32 {
        self.timer.elapsed_secs()
    }

    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }
}
