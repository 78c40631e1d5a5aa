//! Frame pass over every registered grass renderer.

use super::{GrassFrame, GrassRenderer};
use crate::render::FrameContext;

/// Totals of the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrassPassStats {
    /// Renderers that produced a draw
    pub rendered: u32,
    /// Renderers skipped for missing frame inputs
    pub skipped: u32,
    pub visible_chunks: u32,
    pub instances: u32,
}

/// Owns the grass renderers and runs them in registration order.
#[derive(Default)]
pub struct GrassPass {
    renderers: Vec<GrassRenderer>,
    frames: Vec<Option<GrassFrame>>,
    stats: GrassPassStats,
}

impl GrassPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer; returns its index.
    pub fn add(&mut self, renderer: GrassRenderer) -> usize {
        self.renderers.push(renderer);
        self.frames.push(None);
        self.renderers.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<GrassRenderer> {
        if index >= self.renderers.len() {
            return None;
        }
        self.frames.remove(index);
        Some(self.renderers.remove(index))
    }

    /// Cull, generate and emit for every renderer.
    pub fn render(&mut self, frame: &FrameContext<'_>) -> GrassPassStats {
        let mut stats = GrassPassStats::default();
        for (renderer, slot) in self.renderers.iter_mut().zip(self.frames.iter_mut()) {
            *slot = renderer.render(frame);
            match slot {
                Some(result) => {
                    stats.rendered += 1;
                    stats.visible_chunks += result.visible_chunks;
                    stats.instances += result.instance_count;
                }
                None => stats.skipped += 1,
            }
        }
        self.stats = stats;
        stats
    }

    pub fn renderers(&self) -> &[GrassRenderer] {
        &self.renderers
    }

    pub fn renderer_mut(&mut self, index: usize) -> Option<&mut GrassRenderer> {
        self.renderers.get_mut(index)
    }

    /// Per-renderer result of the last frame
    pub fn frame(&self, index: usize) -> Option<&GrassFrame> {
        self.frames.get(index).and_then(Option::as_ref)
    }

    pub fn stats(&self) -> GrassPassStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Texture2D;
    use crate::core::camera::Camera;
    use crate::core::types::{Vec2, Vec3, Vec4};
    use crate::grass::{GrassRendererData, GrassTileConfig};
    use crate::render::{DepthBuffer, GrassMesh};
    use crate::wind::WindSignals;

    fn renderer(center: [f32; 3]) -> GrassRenderer {
        let tile = GrassTileConfig {
            center,
            tile_size: 2.0,
            chunk_size: 1.0,
            per_chunk: 2,
        };
        GrassRenderer::new(&tile, GrassRendererData::default(), GrassMesh::blade(2).unwrap()).unwrap()
    }

    #[test]
    fn test_pass_totals() {
        let mut pass = GrassPass::new();
        assert!(pass.is_empty());
        pass.add(renderer([0.0; 3]));
        // Behind the camera
        pass.add(renderer([0.0, 0.0, 200.0]));

        let mut camera = Camera::look_at(Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.aspect = 1.0;
        let depth = DepthBuffer::cleared(16, 16, 1000.0).unwrap();
        let ambient = Texture2D::filled(2, 2, 0.0f32).unwrap();
        let fluid = Texture2D::filled(2, 2, Vec4::ZERO).unwrap();
        let wind = WindSignals {
            center: Vec3::ZERO,
            ambient_size: 10.0,
            direction: Vec2::X,
            strength: Vec2::ZERO,
            fluid_strength: 1.0,
            fluid_size: 10.0,
            ambient_map: &ambient,
            fluid_map: &fluid,
        };
        let frame = FrameContext::new(&camera, 0.0, 0.016).with_depth(&depth).with_wind(wind);

        let stats = pass.render(&frame);
        assert_eq!(stats.rendered, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.visible_chunks, 4);
        assert_eq!(stats.instances, 16);
        assert_eq!(pass.frame(1).map(|f| f.instance_count), Some(0));

        let stats = pass.render(&FrameContext::new(&camera, 0.0, 0.016));
        assert_eq!(stats.skipped, 2);
        assert!(pass.frame(0).is_none());

        assert!(pass.remove(1).is_some());
        assert!(pass.remove(5).is_none());
        assert_eq!(pass.len(), 1);
    }
}
