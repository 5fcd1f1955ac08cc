//! Flow field grid: one noise-derived angle per cell.

use std::f64::consts::PI;

use ambient_core::{EngineError, SimplexNoise, Viewport};
use glam::DVec2;

/// Default cell edge in pixels.
pub const DEFAULT_CELL_SIZE: f64 = 25.0;
/// Time offset advance per frame at `speed_mod == 1`.
const Z_STEP: f64 = 0.003;

/// Angles over a `cols` × `rows` grid covering the viewport.
///
/// The grid is sized `floor(extent / cell) + 1` on each axis so the right
/// and bottom edges always have a cell. Angles are recomputed every frame by
/// [`update`](FlowField::update) from the noise sampled at a slowly
/// advancing time offset.
#[derive(Debug, Clone)]
pub struct FlowField {
    cell_size: f64,
    cols: usize,
    rows: usize,
    angles: Vec<f64>,
    z_offset: f64,
}

impl FlowField {
    /// Returns `EngineError::InvalidConfig` unless `cell_size` is positive
    /// and finite.
    pub fn new(cell_size: f64) -> Result<Self, EngineError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "cell size must be positive and finite, got {cell_size}"
            )));
        }
        Ok(Self {
            cell_size,
            cols: 0,
            rows: 0,
            angles: Vec::new(),
            z_offset: 0.0,
        })
    }

    /// Reallocates the grid for a new viewport. Angles reset to zero until
    /// the next update.
    pub fn resize(&mut self, viewport: Viewport) {
        self.cols = cells_along(viewport.width, self.cell_size);
        self.rows = cells_along(viewport.height, self.cell_size);
        self.angles.clear();
        self.angles.resize(self.cols * self.rows, 0.0);
    }

    /// Resamples every cell at `(col · zoom, row · zoom + z)` and advances
    /// the time offset by `0.003 · speed_mod`.
    pub fn update(&mut self, noise: &SimplexNoise, zoom: f64, speed_mod: f64) {
        let z = self.z_offset;
        for row in 0..self.rows {
            let y_off = row as f64 * zoom + z;
            let line = &mut self.angles[row * self.cols..(row + 1) * self.cols];
            for (col, angle) in line.iter_mut().enumerate() {
                *angle = noise.noise2d(col as f64 * zoom, y_off) * PI * 4.0;
            }
        }
        self.z_offset += Z_STEP * speed_mod;
    }

    /// Angle of the cell containing `pos`, clamped to the grid. Zero before
    /// the first resize.
    pub fn angle_at(&self, pos: DVec2) -> f64 {
        if self.angles.is_empty() {
            return 0.0;
        }
        let col = ((pos.x / self.cell_size).floor() as usize).min(self.cols - 1);
        let row = ((pos.y / self.cell_size).floor() as usize).min(self.rows - 1);
        self.angles[row * self.cols + col]
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn z_offset(&self) -> f64 {
        self.z_offset
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }
}

fn cells_along(extent: f64, cell: f64) -> usize {
    if extent.is_finite() && extent > 0.0 {
        (extent / cell).floor() as usize + 1
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_cell_size() {
        assert!(FlowField::new(0.0).is_err());
        assert!(FlowField::new(f64::NAN).is_err());
        assert!(FlowField::new(DEFAULT_CELL_SIZE).is_ok());
    }

    #[test]
    fn grid_covers_viewport_edges() {
        let mut field = FlowField::new(25.0).unwrap();
        field.resize(Viewport::new(100.0, 60.0));
        assert_eq!(field.dimensions(), (5, 3));
        assert_eq!(field.angles().len(), 15);
    }

    #[test]
    fn update_fills_angles_within_four_pi() {
        let noise = SimplexNoise::new(7);
        let mut field = FlowField::new(25.0).unwrap();
        field.resize(Viewport::new(400.0, 300.0));
        field.update(&noise, 0.05, 1.0);
        assert!(field.angles().iter().any(|a| *a != 0.0));
        assert!(field.angles().iter().all(|a| a.abs() <= 4.0 * PI));
    }

    #[test]
    fn z_offset_advances_with_speed() {
        let noise = SimplexNoise::new(1);
        let mut field = FlowField::new(25.0).unwrap();
        field.resize(Viewport::new(50.0, 50.0));
        field.update(&noise, 0.05, 2.0);
        assert!((field.z_offset() - 0.006).abs() < 1e-12);
    }

    #[test]
    fn field_changes_over_time() {
        let noise = SimplexNoise::new(3);
        let mut field = FlowField::new(25.0).unwrap();
        field.resize(Viewport::new(200.0, 200.0));
        field.update(&noise, 0.05, 1.0);
        let before = field.angles().to_vec();
        for _ in 0..50 {
            field.update(&noise, 0.05, 1.0);
        }
        assert_ne!(before, field.angles());
    }

    #[test]
    fn lookup_clamps_out_of_grid_positions() {
        let noise = SimplexNoise::new(9);
        let mut field = FlowField::new(25.0).unwrap();
        field.resize(Viewport::new(100.0, 100.0));
        field.update(&noise, 0.05, 1.0);
        let corner = field.angles()[field.angles().len() - 1];
        assert_eq!(field.angle_at(DVec2::new(10_000.0, 10_000.0)), corner);
        assert_eq!(field.angle_at(DVec2::new(-5.0, -5.0)), field.angles()[0]);
    }

    #[test]
    fn lookup_before_resize_is_zero() {
        let field = FlowField::new(25.0).unwrap();
        assert_eq!(field.angle_at(DVec2::new(3.0, 3.0)), 0.0);
    }
}
