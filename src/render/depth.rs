//! Scene depth supplied by the host renderer.

use crate::compute::Texture2D;
use crate::core::camera::Camera;
use crate::core::types::{Result, Vec2, Vec3};

/// Linear eye-space depth per pixel, `v = 0` at the top of the screen.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    depth: Texture2D<f32>,
}

impl DepthBuffer {
    /// Depth buffer with every pixel at `depth` (e.g. the far plane)
    pub fn cleared(width: u32, height: u32, depth: f32) -> Result<Self> {
        Ok(Self {
            depth: Texture2D::filled(width, height, depth)?,
        })
    }

    /// Wrap linear eye depths
    pub fn from_eye_depth(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        Ok(Self {
            depth: Texture2D::from_data(width, height, data)?,
        })
    }

    /// Convert a hardware depth buffer (`[0, 1]`, right-handed perspective)
    /// to linear eye depth.
    pub fn from_ndc_depth(width: u32, height: u32, data: &[f32], near: f32, far: f32) -> Result<Self> {
        let linear = data
            .iter()
            .map(|&z| near * far / (far + z * (near - far)))
            .collect();
        Self::from_eye_depth(width, height, linear)
    }

    pub fn width(&self) -> u32 {
        self.depth.width()
    }

    pub fn height(&self) -> u32 {
        self.depth.height()
    }

    /// Write linear depth at pixel `(x, y)`
    pub fn set(&mut self, x: u32, y: u32, depth: f32) {
        let width = self.depth.width();
        if let Some(d) = self.depth.data_mut().get_mut((x + y * width) as usize) {
            *d = depth;
        }
    }

    /// Whether the volume spanned by `points` could be visible. Points
    /// behind the near plane or off screen cannot be tested and make the
    /// volume count as visible. Otherwise the projected points bound a pixel
    /// rect, and the volume is visible when any pixel in it lies no closer
    /// than the nearest point minus `offset`.
    pub fn any_visible(&self, camera: &Camera, points: &[Vec3], offset: f32) -> bool {
        let view_projection = camera.view_projection();
        let mut uv_min = Vec2::splat(f32::MAX);
        let mut uv_max = Vec2::splat(f32::MIN);
        let mut nearest = f32::MAX;

        for &p in points {
            let clip = view_projection * p.extend(1.0);
            if clip.w <= camera.near {
                return true;
            }
            let ndc = clip.truncate() / clip.w;
            if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
                return true;
            }
            let uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
            uv_min = uv_min.min(uv);
            uv_max = uv_max.max(uv);
            nearest = nearest.min(clip.w);
        }
        if points.is_empty() {
            return false;
        }

        let (width, height) = (self.width(), self.height());
        let pixel = |uv: Vec2| {
            (
                ((uv.x * width as f32) as u32).min(width - 1),
                ((uv.y * height as f32) as u32).min(height - 1),
            )
        };
        let (x0, y0) = pixel(uv_min);
        let (x1, y1) = pixel(uv_max);
        let data = self.depth.data();
        (y0..=y1).any(|y| {
            let row = &data[(y * width) as usize..][..width as usize];
            row[x0 as usize..=x1 as usize]
                .iter()
                .any(|&scene| nearest <= scene + offset)
        })
    }
}
