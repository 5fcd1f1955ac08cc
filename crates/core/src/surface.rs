//! Immediate-mode 2D drawing surface.
//!
//! Engines draw through the [`Surface`] trait so the same frame code runs
//! against a browser 2D canvas and against [`PixelSurface`], a CPU RGBA
//! buffer used for snapshots and tests. Trails rely on [`Surface::fade`]
//! with a translucent overlay instead of a full clear: older strokes decay
//! by compositing rather than by stored history.

use glam::DVec2;

use crate::color::Rgba;
use crate::error::EngineError;

/// Drawing operations an engine may issue during a frame.
pub trait Surface {
    /// Surface width in pixels.
    fn width(&self) -> f64;

    /// Surface height in pixels.
    fn height(&self) -> f64;

    /// Composites `overlay` over the whole surface.
    fn fade(&mut self, overlay: Rgba);

    /// Fills an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba);

    /// Fills a disc.
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba);

    /// Strokes a single segment.
    fn stroke_line(&mut self, from: DVec2, to: DVec2, color: Rgba, width: f64);

    /// Strokes a connected polyline as one path.
    fn stroke_polyline(&mut self, points: &[DVec2], color: Rgba, width: f64) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], color, width);
        }
    }
}

/// CPU RGBA8 surface. Pixels are always opaque; drawing composites
/// straight-alpha colors source-over.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl PixelSurface {
    /// Creates a surface filled with `background` (its alpha is ignored).
    ///
    /// Returns `EngineError::InvalidDimensions` for a zero or overflowing size.
    pub fn new(width: usize, height: usize, background: Rgba) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(EngineError::InvalidDimensions)?;
        let mut pixels = vec![0u8; len];
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[background.r, background.g, background.b, 255]);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn pixel_width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn pixel_height(&self) -> usize {
        self.height
    }

    /// Raw row-major RGBA bytes.
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Counts pixels whose RGB differs from `rgb`.
    pub fn count_differing(&self, rgb: [u8; 3]) -> usize {
        self.pixels
            .chunks_exact(4)
            .filter(|px| px[..3] != rgb)
            .count()
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let out = color.blend_over([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]);
        self.pixels[i..i + 3].copy_from_slice(&out);
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn height(&self) -> f64 {
        self.height as f64
    }

    fn fade(&mut self, overlay: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            let out = overlay.blend_over([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        if !(x.is_finite() && y.is_finite() && w > 0.0 && h > 0.0) {
            return;
        }
        let x0 = x.floor().max(0.0) as i64;
        let y0 = y.floor().max(0.0) as i64;
        let x1 = (x + w).ceil().min(self.width as f64) as i64;
        let y1 = (y + h).ceil().min(self.height as f64) as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        if !(center.is_finite() && radius > 0.0) {
            return;
        }
        let r2 = radius * radius;
        let x0 = (center.x - radius).floor() as i64;
        let x1 = (center.x + radius).ceil() as i64;
        let y0 = (center.y - radius).floor() as i64;
        let y1 = (center.y + radius).ceil() as i64;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let d = DVec2::new(px as f64 + 0.5, py as f64 + 0.5) - center;
                if d.length_squared() <= r2 {
                    self.blend(px, py, color);
                }
            }
        }
    }

    /// One-pixel DDA line; `width` is not rasterised on the CPU path.
    fn stroke_line(&mut self, from: DVec2, to: DVec2, color: Rgba, _width: f64) {
        if !(from.is_finite() && to.is_finite()) {
            return;
        }
        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0);
        // Lines far off-surface would make this loop unbounded in practice.
        if steps > 4.0 * (self.width + self.height) as f64 {
            return;
        }
        let step = delta / steps;
        let mut p = from;
        let mut last = (i64::MIN, i64::MIN);
        for _ in 0..=(steps as usize) {
            let cell = (p.x.floor() as i64, p.y.floor() as i64);
            if cell != last {
                self.blend(cell.0, cell.1, color);
                last = cell;
            }
            p += step;
        }
    }
}
