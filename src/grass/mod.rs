//! Procedural grass: chunk culling, blade generation and the indirect draw.
//!
//! Each [`GrassRenderer`] covers one square tile. Per frame it culls the
//! tile's chunks against the camera frustum and depth buffer, expands the
//! visible chunks into blade instances and hands them to the draw emitter.

pub mod config;
pub mod culling;
pub mod generator;
pub mod instance;
pub mod pass;

pub use config::{GrassRendererData, GrassTileConfig};
pub use culling::{ChunkCuller, ChunkLayout};
pub use generator::{BladeInputs, InstanceGenerator};
pub use instance::{BladeFrameState, GpuGrassChunk, GrassInstance};
pub use pass::{GrassPass, GrassPassStats};

use wgpu::util::DrawIndirectArgs;

use crate::core::types::Result;
use crate::render::{FrameContext, GrassMesh, IndirectDrawEmitter};

/// Result of one renderer's frame.
#[derive(Clone, Copy, Debug)]
pub struct GrassFrame {
    pub visible_chunks: u32,
    pub instance_count: u32,
    pub args: DrawIndirectArgs,
}

/// Culls, generates and emits the grass of one tile.
pub struct GrassRenderer {
    data: GrassRendererData,
    culler: ChunkCuller,
    generator: InstanceGenerator,
    emitter: IndirectDrawEmitter,
}

impl GrassRenderer {
    pub fn new(tile: &GrassTileConfig, data: GrassRendererData, mesh: GrassMesh) -> Result<Self> {
        data.validate()?;
        let layout = ChunkLayout::new(tile)?;
        Ok(Self {
            data,
            culler: ChunkCuller::new(layout)?,
            generator: InstanceGenerator::new(layout)?,
            emitter: IndirectDrawEmitter::new(mesh),
        })
    }

    /// Run the frame's grass work. Returns `None` (and emits an empty draw)
    /// when the frame lacks a depth buffer or wind signals.
    pub fn render(&mut self, frame: &FrameContext<'_>) -> Option<GrassFrame> {
        let Some(depth) = frame.depth else {
            log::debug!("Grass frame skipped: no depth buffer");
            self.emitter.clear();
            return None;
        };
        let Some(wind) = frame.wind else {
            log::debug!("Grass frame skipped: no wind signals");
            self.emitter.clear();
            return None;
        };

        let visible_chunks = self.culler.cull(frame.camera, depth, &self.data, frame.terrain);
        let inputs = BladeInputs {
            time: frame.time,
            camera_position: frame.camera.position,
            wind,
            terrain: frame.terrain,
        };
        let instance_count = self.generator.generate(self.culler.visible(), &self.data, &inputs);
        let args = self.emitter.emit(self.generator.instances());

        log::debug!(
            "Grass: {} visible chunks, {} instances",
            visible_chunks,
            instance_count
        );
        Some(GrassFrame {
            visible_chunks,
            instance_count,
            args,
        })
    }

    pub fn data(&self) -> &GrassRendererData {
        &self.data
    }

    /// Replace the tunables; takes effect next frame.
    pub fn set_data(&mut self, data: GrassRendererData) -> Result<()> {
        data.validate()?;
        self.data = data;
        Ok(())
    }

    pub fn layout(&self) -> &ChunkLayout {
        self.culler.layout()
    }

    pub fn culler(&self) -> &ChunkCuller {
        &self.culler
    }

    pub fn generator(&self) -> &InstanceGenerator {
        &self.generator
    }

    pub fn emitter(&self) -> &IndirectDrawEmitter {
        &self.emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Texture2D;
    use crate::core::camera::Camera;
    use crate::core::types::{Vec2, Vec3, Vec4};
    use crate::render::DepthBuffer;
    use crate::wind::WindSignals;

    fn renderer() -> GrassRenderer {
        let tile = GrassTileConfig {
            center: [0.0; 3],
            tile_size: 4.0,
            chunk_size: 1.0,
            per_chunk: 2,
        };
        GrassRenderer::new(&tile, GrassRendererData::default(), GrassMesh::blade(3).unwrap()).unwrap()
    }

    fn camera() -> Camera {
        let mut camera = Camera::look_at(Vec3::new(0.0, 20.0, 0.01), Vec3::ZERO, Vec3::Y);
        camera.aspect = 1.0;
        camera
    }

    #[test]
    fn test_invalid_data_rejected() {
        let data = GrassRendererData { width_range: [2.0, 1.0], ..Default::default() };
        let result = GrassRenderer::new(&GrassTileConfig::default(), data, GrassMesh::blade(1).unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_inputs_skip_frame() {
        let mut renderer = renderer();
        let camera = camera();
        let depth = DepthBuffer::cleared(8, 8, 1000.0).unwrap();

        let frame = FrameContext::new(&camera, 0.0, 0.016);
        assert!(renderer.render(&frame).is_none());

        let frame = FrameContext::new(&camera, 0.0, 0.016).with_depth(&depth);
        assert!(renderer.render(&frame).is_none());
        assert_eq!(renderer.emitter().args().instance_count, 0);
    }

    #[test]
    fn test_full_frame() {
        let mut renderer = renderer();
        let camera = camera();
        let depth = DepthBuffer::cleared(8, 8, 1000.0).unwrap();
        let ambient = Texture2D::filled(4, 4, 0.5f32).unwrap();
        let fluid = Texture2D::filled(4, 4, Vec4::ZERO).unwrap();
        let wind = WindSignals {
            center: Vec3::ZERO,
            ambient_size: 10.0,
            direction: Vec2::X,
            strength: Vec2::new(0.0, 0.02),
            fluid_strength: 1.0,
            fluid_size: 10.0,
            ambient_map: &ambient,
            fluid_map: &fluid,
        };
        let frame = FrameContext::new(&camera, 1.0, 0.016)
            .with_depth(&depth)
            .with_wind(wind);

        let result = renderer.render(&frame).unwrap();
        assert_eq!(result.visible_chunks, 16);
        assert_eq!(result.instance_count, 64);
        assert_eq!(result.args.instance_count, 64);
        assert_eq!(result.args.vertex_count, renderer.emitter().mesh().index_count());
        assert_eq!(renderer.emitter().instances().len(), 64);
    }
}
