//! Software raster surface for headless rendering.
//!
//! Paints into an `image::RgbaImage` with source-over blending so offline
//! renders match what the browser canvas composites, minus anti-aliasing.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use image::{Rgba as Pixel, RgbaImage};

use crate::surface::{DrawSurface, RadialGradient, Rgba};

/// RGBA pixel surface backed by an owned image buffer.
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    /// Create a transparent surface. Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Raster surface needs a non-zero size, got {}x{}",
            width,
            height
        );
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Pixel([0, 0, 0, 0])),
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Write the current contents as a PNG.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("Failed to write frame to {:?}", path))
    }

    /// Pixel index range covering the box [min, max], or None when fully off-surface.
    fn pixel_span(&self, min: Vec2, max: Vec2) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let x0 = min.x.floor().max(0.0);
        let y0 = min.y.floor().max(0.0);
        let x1 = max.x.ceil().min(w);
        let y1 = max.y.ceil().min(h);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    /// Source-over composite of `color` onto pixel (x, y).
    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        let alpha = color.a.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x, y);
        let dst_a = dst.0[3] as f32 / 255.0;
        let out_a = alpha + dst_a * (1.0 - alpha);

        let channel = |src: u8, dst: u8| -> u8 {
            if out_a <= 0.0 {
                return 0;
            }
            let src = src as f32 / 255.0;
            let dst = dst as f32 / 255.0;
            let value = (src * alpha + dst * dst_a * (1.0 - alpha)) / out_a;
            (value * 255.0).round().clamp(0.0, 255.0) as u8
        };

        *dst = Pixel([
            channel(color.r, dst.0[0]),
            channel(color.g, dst.0[1]),
            channel(color.b, dst.0[2]),
            (out_a * 255.0).round() as u8,
        ]);
    }

    /// Visit every pixel centre within `radius` of `center`.
    fn for_each_in_circle(&mut self, center: Vec2, radius: f32, mut shade: impl FnMut(Vec2) -> Rgba) {
        let reach = Vec2::splat(radius);
        let Some((x0, y0, x1, y1)) = self.pixel_span(center - reach, center + reach) else {
            return;
        };
        let r2 = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if p.distance_squared(center) <= r2 {
                    let color = shade(p);
                    self.blend(x, y, color);
                }
            }
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl DrawSurface for RasterSurface {
    fn width(&self) -> f32 {
        self.image.width() as f32
    }

    fn height(&self) -> f32 {
        self.image.height() as f32
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Pixel([0, 0, 0, 0]);
        }
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(origin, origin + size) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        let half = (width * 0.5).max(0.5);
        let pad = Vec2::splat(half);
        let Some((x0, y0, x1, y1)) = self.pixel_span(from.min(to) - pad, from.max(to) + pad) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(p, from, to) <= half {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.for_each_in_circle(center, radius, |_| color);
    }

    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient) {
        self.for_each_in_circle(center, radius, |p| gradient.color_at(p.distance(gradient.center)));
    }
}
