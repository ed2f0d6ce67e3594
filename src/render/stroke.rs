use super::color::Rgba;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A drawing surface that can stroke straight segments.
pub trait StrokeSink {
    /// Surface size in pixels (width, height).
    fn size(&self) -> (u32, u32);

    fn stroke(&mut self, from: Point, to: Point, color: Rgba, width: f64);
}

/// Maps model coordinates (origin at the center, y up) onto a surface (origin top-left, y down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Viewport {
    /// Fit a curve of radius `base_radius` into 45% of the shorter side.
    pub fn fit(width: u32, height: u32, base_radius: f64) -> Self {
        let (width, height) = (width as f64, height as f64);
        Self {
            width,
            height,
            scale: 0.45 * width.min(height) / base_radius.max(1e-6),
        }
    }

    pub fn project(&self, p: Point) -> Point {
        Point {
            x: self.width / 2.0 + p.x * self.scale,
            y: self.height / 2.0 - p.y * self.scale,
        }
    }
}

/// Records stroke commands instead of drawing them.
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    pub width: u32,
    pub height: u32,
    pub strokes: Vec<(Point, Point, Rgba, f64)>,
}

impl StrokeRecorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            strokes: Vec::new(),
        }
    }
}

impl StrokeSink for StrokeRecorder {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn stroke(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        self.strokes.push((from, to, color, width));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_viewport_centers_origin_and_flips_y() {
        let vp = Viewport::fit(540, 540, 380.0);
        assert_eq!(vp.project(Point::new(0.0, 0.0)), Point::new(270.0, 270.0));
        let top = vp.project(Point::new(0.0, 380.0));
        assert!((top.y - (270.0 - 0.45 * 540.0)).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_uses_shorter_side() {
        let vp = Viewport::fit(800, 400, 100.0);
        assert!((vp.scale - 0.45 * 400.0 / 100.0).abs() < 1e-12);
    }
}
