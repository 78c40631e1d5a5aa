//! Chunk layout of a grass tile and the per-frame visible-chunk pass.

use crate::compute::{dispatch_1d, AppendBuffer};
use crate::core::camera::Camera;
use crate::core::types::{Result, Vec2, Vec3};
use crate::math::{Aabb, Frustum};
use crate::render::DepthBuffer;
use crate::terrain::TerrainBuffer;
use super::config::{GrassRendererData, GrassTileConfig};
use super::instance::GpuGrassChunk;

/// Square grid of equally sized chunks covering one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkLayout {
    pub tile_center: Vec3,
    pub tile_size: f32,
    pub chunks_per_tile: u32,
    /// Actual chunk edge, `tile_size / chunks_per_tile`
    pub chunk_size: f32,
    pub per_chunk: u32,
}

impl ChunkLayout {
    pub fn new(tile: &GrassTileConfig) -> Result<Self> {
        tile.validate()?;
        let chunks_per_tile = tile.chunks_per_tile();
        Ok(Self {
            tile_center: tile.center(),
            tile_size: tile.tile_size,
            chunks_per_tile,
            chunk_size: tile.tile_size / chunks_per_tile as f32,
            per_chunk: tile.per_chunk,
        })
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunks_per_tile * self.chunks_per_tile
    }

    pub fn blades_per_chunk(&self) -> u32 {
        self.per_chunk * self.per_chunk
    }

    /// Upper bound on blades generated in one frame
    pub fn blade_capacity(&self) -> usize {
        self.chunk_count() as usize * self.blades_per_chunk() as usize
    }

    /// Grid coordinate of chunk `index` (row-major along x then z)
    pub fn chunk_coord(&self, index: u32) -> (u32, u32) {
        (index % self.chunks_per_tile, index / self.chunks_per_tile)
    }

    /// World-space centre of chunk `index` at the tile's height
    pub fn chunk_center(&self, index: u32) -> Vec3 {
        let (cx, cz) = self.chunk_coord(index);
        let start = -0.5 * self.tile_size;
        self.tile_center
            + Vec3::new(
                start + (cx as f32 + 0.5) * self.chunk_size,
                0.0,
                start + (cz as f32 + 0.5) * self.chunk_size,
            )
    }

    /// Stable id of blade `(gx, gy)` in chunk `index`
    pub fn blade_id(&self, index: u32, gx: u32, gy: u32) -> u32 {
        index * self.blades_per_chunk() + gy * self.per_chunk + gx
    }
}

/// Appends the chunks of a tile that pass the frustum and depth tests.
pub struct ChunkCuller {
    layout: ChunkLayout,
    visible: AppendBuffer<GpuGrassChunk>,
}

impl ChunkCuller {
    pub fn new(layout: ChunkLayout) -> Result<Self> {
        let visible = AppendBuffer::with_capacity(layout.chunk_count() as usize)?;
        Ok(Self { layout, visible })
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Conservative bounds of chunk `index`: centre and half extents. The
    /// footprint widens by the blade offset plus a unit margin on each side;
    /// the vertical range spans the ground under the footprint up to the
    /// tallest blade.
    pub fn chunk_bounds(
        &self,
        index: u32,
        data: &GrassRendererData,
        terrain: Option<&TerrainBuffer>,
    ) -> (Vec3, Vec3) {
        let center = self.layout.chunk_center(index);
        let width = self.layout.chunk_size + 2.0 * data.offset_strength + 2.0;
        let half = 0.5 * width;

        let (ground_min, ground_max) = match terrain {
            Some(terrain) => terrain.height_bounds(
                Vec2::new(center.x - half, center.z - half),
                Vec2::new(center.x + half, center.z + half),
            ),
            None => (center.y, center.y),
        };
        let top = ground_max + data.max_height();

        (
            Vec3::new(center.x, 0.5 * (ground_min + top), center.z),
            Vec3::new(half, 0.5 * (top - ground_min), half),
        )
    }

    /// Rebuild the visible list for this frame and return its count.
    pub fn cull(
        &mut self,
        camera: &Camera,
        depth: &DepthBuffer,
        data: &GrassRendererData,
        terrain: Option<&TerrainBuffer>,
    ) -> u32 {
        self.visible.reset();
        let frustum = Frustum::from_camera(camera);

        let this = &*self;
        dispatch_1d(this.layout.chunk_count(), |index| {
            let (center, extents) = this.chunk_bounds(index, data, terrain);
            if !frustum.intersects_box(center, extents) {
                return;
            }
            let corners = Aabb::from_center_half_extent(center, extents).corners();
            if !depth.any_visible(camera, &corners, data.occlusion_offset) {
                return;
            }
            this.visible.append(GpuGrassChunk {
                center: this.layout.chunk_center(index).to_array(),
                index,
            });
        });

        let count = self.visible.copy_count();
        if self.visible.dropped() > 0 {
            log::warn!(
                "Chunk list overflow: {} chunks dropped (capacity {})",
                self.visible.dropped(),
                self.visible.capacity()
            );
        }
        log::trace!("Chunk cull: {}/{} visible", count, self.layout.chunk_count());
        count
    }

    /// Chunks appended by the last cull
    pub fn visible(&self) -> &AppendBuffer<GpuGrassChunk> {
        &self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ChunkLayout {
        ChunkLayout::new(&GrassTileConfig {
            center: [0.0, 0.0, 0.0],
            tile_size: 10.0,
            chunk_size: 3.0,
            per_chunk: 4,
        })
        .unwrap()
    }

    fn overhead_camera() -> Camera {
        let mut camera = Camera::look_at(Vec3::new(0.0, 30.0, 0.01), Vec3::ZERO, Vec3::Y);
        camera.near = 0.1;
        camera.far = 100.0;
        camera.aspect = 1.0;
        camera
    }

    #[test]
    fn test_layout_rounds_chunks() {
        let layout = layout();
        assert_eq!(layout.chunks_per_tile, 3);
        assert!((layout.chunk_size - 10.0 / 3.0).abs() < 1e-6);
        assert_eq!(layout.chunk_count(), 9);
        assert_eq!(layout.blade_capacity(), 9 * 16);
    }

    #[test]
    fn test_layout_rejects_oversized_tile() {
        let tile = GrassTileConfig {
            center: [0.0; 3],
            tile_size: 100000.0,
            chunk_size: 1.0,
            per_chunk: 1,
        };
        assert!(ChunkLayout::new(&tile).is_err());
    }

    #[test]
    fn test_chunk_centers_cover_tile() {
        let layout = layout();
        let first = layout.chunk_center(0);
        let last = layout.chunk_center(8);
        let half_chunk = layout.chunk_size * 0.5;
        assert!((first.x - (-5.0 + half_chunk)).abs() < 1e-5);
        assert!((first.z - (-5.0 + half_chunk)).abs() < 1e-5);
        assert!((last.x - (5.0 - half_chunk)).abs() < 1e-5);
        assert!((layout.chunk_center(4)).length() < 1e-5);
    }

    #[test]
    fn test_blade_ids_are_unique() {
        let layout = layout();
        let mut ids: Vec<u32> = (0..layout.chunk_count())
            .flat_map(|c| (0..4).flat_map(move |y| (0..4).map(move |x| (c, x, y))))
            .map(|(c, x, y)| layout.blade_id(c, x, y))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), layout.blade_capacity());
        assert_eq!(*ids.last().unwrap() as usize, layout.blade_capacity() - 1);
    }

    #[test]
    fn test_bounds_follow_terrain_and_blade_height() {
        let culler = ChunkCuller::new(layout()).unwrap();
        let data = GrassRendererData {
            offset_strength: 0.5,
            height_range: [0.5, 2.0],
            ..Default::default()
        };
        let terrain = TerrainBuffer::flat(Vec3::ZERO, 40.0, 16, 3.0).unwrap();

        let (center, extents) = culler.chunk_bounds(4, &data, Some(&terrain));
        assert!((extents.x - 0.5 * (10.0 / 3.0 + 3.0)).abs() < 1e-5);
        assert!((center.y - extents.y - 3.0).abs() < 1e-4);
        assert!((center.y + extents.y - 5.0).abs() < 1e-4);

        let (center, extents) = culler.chunk_bounds(4, &data, None);
        assert!((center.y - extents.y).abs() < 1e-5);
        assert!((center.y + extents.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_cull_keeps_chunks_in_view() {
        let mut culler = ChunkCuller::new(layout()).unwrap();
        let depth = DepthBuffer::cleared(64, 64, 1000.0).unwrap();
        let count = culler.cull(&overhead_camera(), &depth, &GrassRendererData::default(), None);
        assert_eq!(count, 9);

        let mut indices: Vec<u32> = culler.visible().iter().map(|c| c.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_cull_straight_down_camera() {
        let layout = ChunkLayout::new(&GrassTileConfig {
            center: [0.0; 3],
            tile_size: 10.0,
            chunk_size: 1.0,
            per_chunk: 2,
        })
        .unwrap();
        let mut culler = ChunkCuller::new(layout).unwrap();
        let mut camera = Camera::look_at(Vec3::new(0.0, 30.0, 0.0), Vec3::ZERO, Vec3::Y);
        camera.far = 100.0;
        camera.aspect = 1.0;
        assert!(camera.forward().is_finite());

        let depth = DepthBuffer::cleared(64, 64, 1000.0).unwrap();
        let count = culler.cull(&camera, &depth, &GrassRendererData::default(), None);
        assert_eq!(count, 100);
    }

    #[test]
    fn test_cull_rejects_chunks_behind_camera() {
        let mut culler = ChunkCuller::new(layout()).unwrap();
        let depth = DepthBuffer::cleared(64, 64, 1000.0).unwrap();
        let camera = Camera::look_at(Vec3::new(0.0, 30.0, 0.01), Vec3::new(0.0, 60.0, 0.0), Vec3::Z);
        let count = culler.cull(&camera, &depth, &GrassRendererData::default(), None);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cull_rejects_occluded_chunks() {
        let mut culler = ChunkCuller::new(layout()).unwrap();
        // An occluder 5 units in front of the camera hides the whole tile
        let depth = DepthBuffer::cleared(64, 64, 5.0).unwrap();
        let count = culler.cull(&overhead_camera(), &depth, &GrassRendererData::default(), None);
        assert_eq!(count, 0);

        // Repeated culls do not accumulate
        let depth = DepthBuffer::cleared(64, 64, 1000.0).unwrap();
        assert_eq!(culler.cull(&overhead_camera(), &depth, &GrassRendererData::default(), None), 9);
        assert_eq!(culler.cull(&overhead_camera(), &depth, &GrassRendererData::default(), None), 9);
    }
}
