use std::path::Path;

use super::color::Rgba;
use super::stroke::{Point, StrokeSink};
use crate::error::SpiroResult;

/// CPU RGBA8 canvas with a white background and round-capped strokes.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        };
        canvas.clear([255, 255, 255]);
        canvas
    }

    pub fn clear(&mut self, rgb: [u8; 3]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[..3].copy_from_slice(&rgb);
            px[3] = 255;
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        let idx = ((y * self.width + x) * 4) as usize;
        let a = color.a.clamp(0.0, 1.0);
        let inv_a = 1.0 - a;
        let src = [color.r, color.g, color.b];
        for (c, &s) in src.iter().enumerate() {
            let dst = self.pixels[idx + c] as f32;
            self.pixels[idx + c] = (s as f32 * a + dst * inv_a).round() as u8;
        }
        self.pixels[idx + 3] = 255;
    }

    /// Encode as PNG.
    pub fn save_png(&self, path: &Path) -> SpiroResult<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )?;
        log::info!("Wrote {}x{} PNG: {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    (p.x - cx).powi(2) + (p.y - cy).powi(2)
}

impl StrokeSink for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Covers every pixel whose center lies within `width / 2` of the segment.
    fn stroke(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let half = (width / 2.0).max(0.5);
        let half_sq = half * half;

        let min_x = (from.x.min(to.x) - half).floor().max(0.0);
        let min_y = (from.y.min(to.y) - half).floor().max(0.0);
        let max_x = (from.x.max(to.x) + half).ceil().min((self.width - 1) as f64);
        let max_y = (from.y.max(to.y) + half).ceil().min((self.height - 1) as f64);
        if !(min_x <= max_x && min_y <= max_y) {
            return;
        }

        for py in min_y as u32..=max_y as u32 {
            for px in min_x as u32..=max_x as u32 {
                let center = Point::new(px as f64 + 0.5, py as f64 + 0.5);
                if distance_sq_to_segment(center, from, to) <= half_sq {
                    self.blend(px, py, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba { r: 255, g: 0, b: 0, a: 1.0 };

    #[test]
    fn test_new_canvas_is_white() {
        let canvas = Canvas::new(4, 3);
        assert_eq!(canvas.pixels().len(), 4 * 3 * 4);
        assert!(canvas.pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_stroke_touches_only_nearby_pixels() {
        let mut canvas = Canvas::new(20, 20);
        canvas.stroke(Point::new(2.0, 10.0), Point::new(18.0, 10.0), RED, 2.0);
        assert_eq!(canvas.pixel(10, 9), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(10, 10), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(10, 2), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(0, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn test_translucent_stroke_blends_with_background() {
        let mut canvas = Canvas::new(10, 10);
        let color = Rgba { r: 0, g: 0, b: 0, a: 0.85 };
        canvas.stroke(Point::new(5.0, 5.0), Point::new(5.0, 5.0), color, 4.0);
        // 255 * 0.15
        assert_eq!(canvas.pixel(5, 5), [38, 38, 38, 255]);
    }

    #[test]
    fn test_offscreen_stroke_is_clipped() {
        let mut canvas = Canvas::new(10, 10);
        canvas.stroke(Point::new(-50.0, -50.0), Point::new(-40.0, -40.0), RED, 3.0);
        assert!(canvas.pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spiro.png");
        let mut canvas = Canvas::new(16, 16);
        canvas.stroke(Point::new(0.0, 0.0), Point::new(16.0, 16.0), RED, 3.0);
        canvas.save_png(&path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(decoded.as_raw().as_slice(), canvas.pixels());
    }
}
