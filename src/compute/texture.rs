//! 2D textures with point and bilinear sampling.

use crate::core::error::Error;
use crate::core::types::{Result, Vec2};
use super::Cell;

/// Fetch texel `(x, y)` with coordinates clamped to the edge.
pub fn fetch_clamped<T: Copy>(data: &[T], width: u32, height: u32, x: i32, y: i32) -> T {
    let x = x.clamp(0, width as i32 - 1) as u32;
    let y = y.clamp(0, height as i32 - 1) as u32;
    data[(x + y * width) as usize]
}

/// Bilinear sample at a position in texel-index space (integer coordinates
/// land exactly on a texel), clamping outside the grid.
pub fn bilinear_clamped<T: Cell>(data: &[T], width: u32, height: u32, pos: Vec2) -> T {
    let max = Vec2::new((width - 1) as f32, (height - 1) as f32);
    let pos = pos.clamp(Vec2::ZERO, max);
    let base = pos.floor();
    let f = pos - base;
    let (x0, y0) = (base.x as i32, base.y as i32);

    let a = fetch_clamped(data, width, height, x0, y0);
    let b = fetch_clamped(data, width, height, x0 + 1, y0);
    let c = fetch_clamped(data, width, height, x0, y0 + 1);
    let d = fetch_clamped(data, width, height, x0 + 1, y0 + 1);

    let top = a + (b - a) * f.x;
    let bottom = c + (d - c) * f.x;
    top + (bottom - top) * f.y
}

/// Bilinear sample in texel-index space with the grid repeating in both axes.
pub fn bilinear_wrapped<T: Cell>(data: &[T], width: u32, height: u32, pos: Vec2) -> T {
    let base = pos.floor();
    let f = pos - base;
    let (w, h) = (width as i64, height as i64);
    let x0 = (base.x as i64).rem_euclid(w);
    let y0 = (base.y as i64).rem_euclid(h);
    let x1 = (x0 + 1) % w;
    let y1 = (y0 + 1) % h;
    let at = |x: i64, y: i64| data[(x + y * w) as usize];

    let top = at(x0, y0) + (at(x1, y0) - at(x0, y0)) * f.x;
    let bottom = at(x0, y1) + (at(x1, y1) - at(x0, y1)) * f.x;
    top + (bottom - top) * f.y
}

/// Row-major 2D texture.
#[derive(Clone, Debug)]
pub struct Texture2D<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Cell> Texture2D<T> {
    /// Allocate a texture filled with `T::default()`
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, T::default())
    }

    /// Allocate a texture filled with `value`
    pub fn filled(width: u32, height: u32, value: T) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::config(format!("texture size {}x{} is empty", width, height)));
        }
        Ok(Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        })
    }

    /// Wrap existing texel data
    pub fn from_data(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != (width as usize) * (height as usize) {
            return Err(Error::config(format!(
                "texture data of {} texels does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Texel at `(x, y)`, clamped to the edge
    pub fn texel(&self, x: i32, y: i32) -> T {
        fetch_clamped(&self.data, self.width, self.height, x, y)
    }

    /// Texel containing normalized coordinate `uv`, clamped
    pub fn load(&self, uv: Vec2) -> T {
        let x = (uv.x * self.width as f32).floor() as i32;
        let y = (uv.y * self.height as f32).floor() as i32;
        self.texel(x, y)
    }

    /// Bilinear sample at normalized `uv` (texel centres at `(i + 0.5) / size`), clamp addressing
    pub fn sample_clamped(&self, uv: Vec2) -> T {
        bilinear_clamped(&self.data, self.width, self.height, self.texel_space(uv))
    }

    /// Bilinear sample at normalized `uv`, repeat addressing
    pub fn sample_wrapped(&self, uv: Vec2) -> T {
        bilinear_wrapped(&self.data, self.width, self.height, self.texel_space(uv))
    }

    fn texel_space(&self, uv: Vec2) -> Vec2 {
        uv * Vec2::new(self.width as f32, self.height as f32) - Vec2::splat(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Texture2D<f32> {
        // 4x1 texture: 0, 1, 2, 3
        Texture2D::from_data(4, 1, vec![0.0, 1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn test_bilinear_integer_positions_exact() {
        let data = [1.5f32, -2.0, 7.25, 4.0];
        for (i, &expected) in data.iter().enumerate() {
            let pos = Vec2::new((i % 2) as f32, (i / 2) as f32);
            assert_eq!(bilinear_clamped(&data, 2, 2, pos), expected);
        }
    }

    #[test]
    fn test_sample_clamped_midpoint() {
        let tex = ramp();
        // Halfway between texel centres 1 and 2
        let v = tex.sample_clamped(Vec2::new(0.5, 0.5));
        assert!((v - 1.5).abs() < 1e-6);
        // Clamped past the edge
        assert_eq!(tex.sample_clamped(Vec2::new(2.0, 0.5)), 3.0);
    }

    #[test]
    fn test_sample_wrapped_tiles() {
        let tex = ramp();
        let a = tex.sample_wrapped(Vec2::new(0.3, 0.5));
        let b = tex.sample_wrapped(Vec2::new(1.3, 0.5));
        let c = tex.sample_wrapped(Vec2::new(-0.7, 0.5));
        assert!((a - b).abs() < 1e-5);
        assert!((a - c).abs() < 1e-5);
        // Across the seam: halfway between texel 3 and texel 0
        let seam = tex.sample_wrapped(Vec2::new(1.0, 0.5));
        assert!((seam - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_size_validation() {
        assert!(Texture2D::<f32>::new(0, 4).is_err());
        assert!(Texture2D::from_data(2, 2, vec![0.0f32; 3]).is_err());
    }

    #[test]
    fn test_load_point_sample() {
        let tex = ramp();
        assert_eq!(tex.load(Vec2::new(0.6, 0.0)), 2.0);
    }
}
