//! Scene configuration: everything needed to drive a headless frame loop.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::camera::Camera;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::grass::{GrassRendererData, GrassTileConfig};
use crate::terrain::TerrainConfig;
use crate::wind::WindConfig;

/// Host camera placement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Depth buffer size; the aspect ratio follows it
    pub viewport: [u32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 8.0, 12.0],
            target: [0.0, 0.0, 0.0],
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 500.0,
            viewport: [320, 180],
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> Camera {
        let mut camera = Camera::look_at(
            Vec3::from_array(self.position),
            Vec3::from_array(self.target),
            Vec3::Y,
        );
        camera.fov_y = self.fov_y_degrees.to_radians();
        camera.near = self.near;
        camera.far = self.far;
        camera.set_aspect(self.viewport[0] as f32, self.viewport[1] as f32);
        camera
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport[0] == 0 || self.viewport[1] == 0 {
            return Err(Error::config(format!("viewport {:?} has a zero dimension", self.viewport)));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(Error::config(format!(
                "camera clip range {}..{} is invalid",
                self.near, self.far
            )));
        }
        if Vec3::from_array(self.position) == Vec3::from_array(self.target) {
            return Err(Error::config("camera position and target coincide"));
        }
        Ok(())
    }
}

/// One grass tile and its renderer tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassLayerConfig {
    pub tile: GrassTileConfig,
    pub data: GrassRendererData,
    /// Segments of the default blade mesh
    pub blade_segments: u32,
}

impl Default for GrassLayerConfig {
    fn default() -> Self {
        Self {
            tile: GrassTileConfig::default(),
            data: GrassRendererData::default(),
            blade_segments: 4,
        }
    }
}

/// Configuration for a scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub wind: WindConfig,
    /// Heightmap under the grass; flat tiles when absent
    pub terrain: Option<TerrainConfig>,
    pub grass: Vec<GrassLayerConfig>,
    pub camera: CameraConfig,
    /// Optional moving emitter pushing the fluid: position and forward
    pub impulse: Option<[[f32; 3]; 2]>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            wind: WindConfig::default(),
            terrain: Some(TerrainConfig {
                size: 20.0,
                ..Default::default()
            }),
            grass: vec![GrassLayerConfig::default()],
            camera: CameraConfig::default(),
            impulse: Some([[-2.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        self.wind.validate()?;
        if let Some(terrain) = &self.terrain {
            terrain.validate()?;
        }
        for layer in &self.grass {
            layer.tile.validate()?;
            layer.data.validate()?;
        }
        self.camera.validate()
    }

    /// Save as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
