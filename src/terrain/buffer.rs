//! Generated heightmap with world-space sampling.

use crate::compute::Texture2D;
use crate::core::types::{Vec2, Vec3, Vec4};
use super::generator::TerrainTexel;

/// Square heightmap centred on `center`, covering `size` world units.
/// Each texel stores `(height, normal.x, normal.y, normal.z)`.
#[derive(Clone, Debug)]
pub struct TerrainBuffer {
    center: Vec3,
    size: f32,
    map: Texture2D<Vec4>,
    min_height: f32,
    max_height: f32,
}

impl TerrainBuffer {
    pub fn new(center: Vec3, size: f32, map: Texture2D<Vec4>) -> Self {
        let (min_height, max_height) = map
            .data()
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), t| (lo.min(t.x), hi.max(t.x)));
        Self {
            center,
            size,
            map,
            min_height,
            max_height,
        }
    }

    /// Flat terrain at `height`
    pub fn flat(center: Vec3, size: f32, width: u32, height: f32) -> crate::core::types::Result<Self> {
        let map = Texture2D::filled(width, width, Vec4::new(height, 0.0, 1.0, 0.0))?;
        Ok(Self::new(center, size, map))
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Texels per side
    pub fn width(&self) -> u32 {
        self.map.width()
    }

    fn uv(&self, x: f32, z: f32) -> Vec2 {
        Vec2::new(x - self.center.x, z - self.center.z) / self.size + 0.5
    }

    /// Whether world (x, z) lies over the terrain
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let half = self.size * 0.5;
        (x - self.center.x).abs() <= half && (z - self.center.z).abs() <= half
    }

    /// Bilinear height at world (x, z), clamped at the edge
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.map.sample_clamped(self.uv(x, z)).x
    }

    /// Interpolated unit normal at world (x, z)
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let t = self.map.sample_clamped(self.uv(x, z));
        Vec3::new(t.y, t.z, t.w).normalize_or(Vec3::Y)
    }

    /// Lowest and highest texel heights
    pub fn height_range(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    /// Conservative height range over the world rectangle `min..max` (XZ).
    /// Covers every texel that bilinear sampling inside the rectangle reads.
    pub fn height_bounds(&self, min: Vec2, max: Vec2) -> (f32, f32) {
        let w = self.map.width() as f32;
        let lo = self.uv(min.x, min.y) * w - 0.5;
        let hi = self.uv(max.x, max.y) * w - 0.5;
        let last = self.map.width() as i32 - 1;

        let x0 = (lo.x.floor() as i32).clamp(0, last);
        let x1 = (hi.x.ceil() as i32).clamp(0, last);
        let y0 = (lo.y.floor() as i32).clamp(0, last);
        let y1 = (hi.y.ceil() as i32).clamp(0, last);

        let mut bounds = (f32::INFINITY, f32::NEG_INFINITY);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let h = self.map.texel(x, y).x;
                bounds = (bounds.0.min(h), bounds.1.max(h));
            }
        }
        bounds
    }

    /// Texels in GPU layout, row-major
    pub fn to_gpu(&self) -> Vec<TerrainTexel> {
        self.map
            .data()
            .iter()
            .map(|t| TerrainTexel {
                height: t.x,
                normal: [t.y, t.z, t.w],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope() -> TerrainBuffer {
        // Height rises one unit per texel along x; 8 texels over 8m
        let data = (0..64)
            .map(|i| Vec4::new((i % 8) as f32, 0.0, 1.0, 0.0))
            .collect();
        TerrainBuffer::new(Vec3::ZERO, 8.0, Texture2D::from_data(8, 8, data).unwrap())
    }

    #[test]
    fn test_height_range() {
        assert_eq!(slope().height_range(), (0.0, 7.0));
    }

    #[test]
    fn test_contains() {
        let terrain = slope();
        assert!(terrain.contains(0.0, 0.0));
        assert!(terrain.contains(4.0, -4.0));
        assert!(!terrain.contains(4.1, 0.0));
    }

    #[test]
    fn test_height_interpolates() {
        let terrain = slope();
        // World x = -4 + 3.5 is the centre of texel 3
        assert!((terrain.height_at(-0.5, 0.0) - 3.0).abs() < 1e-5);
        assert!((terrain.height_at(0.0, 0.0) - 3.5).abs() < 1e-5);
        // Clamped beyond the edge
        assert_eq!(terrain.height_at(-100.0, 0.0), 0.0);
    }

    #[test]
    fn test_height_bounds_cover_samples() {
        let terrain = slope();
        let (lo, hi) = terrain.height_bounds(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        for x in [-1.0, -0.3, 0.0, 0.6, 1.0] {
            let h = terrain.height_at(x, 0.5);
            assert!(h >= lo && h <= hi);
        }
        assert!(hi - lo < 4.0);
    }

    #[test]
    fn test_flat_normal() {
        let terrain = TerrainBuffer::flat(Vec3::ZERO, 10.0, 4, 2.0).unwrap();
        assert_eq!(terrain.normal_at(1.0, 1.0), Vec3::Y);
        assert_eq!(terrain.height_at(3.0, -2.0), 2.0);
        assert_eq!(terrain.to_gpu()[0].normal, [0.0, 1.0, 0.0]);
    }
}
