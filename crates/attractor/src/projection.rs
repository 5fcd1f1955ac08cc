//! Rotation about the vertical axis and screen projection.

use std::f64::consts::PI;

use ambient_core::{Pointer, Viewport};
use glam::{DVec2, DVec3};

/// Radians of spin per millisecond of host time.
const SPIN_PER_MS: f64 = 0.0002;
/// Depth contribution to screen y.
const DEPTH_TILT: f64 = 0.5;

/// Maps Lorenz space to viewport pixels for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    center: DVec2,
    scale: f64,
    cos: f64,
    sin: f64,
}

impl Projection {
    /// Builds the frame's projection.
    ///
    /// The rotation is `(pointer.x / width) · 4π + t · 0.0002`; with an
    /// inactive pointer only the time term applies.
    pub fn new(viewport: Viewport, pointer: Pointer, time_ms: f64, scale: f64) -> Self {
        let pointer_turn = if pointer.active && viewport.width > 0.0 {
            pointer.position.x / viewport.width * PI * 4.0
        } else {
            0.0
        };
        let angle = pointer_turn + time_ms * SPIN_PER_MS;
        let (sin, cos) = angle.sin_cos();
        Self {
            center: viewport.center(),
            scale,
            cos,
            sin,
        }
    }

    pub fn project(&self, p: DVec3) -> DVec2 {
        let rx = p.x * self.cos - p.z * self.sin;
        let rz = p.x * self.sin + p.z * self.cos;
        DVec2::new(
            self.center.x + rx * self.scale,
            self.center.y - p.y * self.scale + rz * DEPTH_TILT,
        )
    }
}
