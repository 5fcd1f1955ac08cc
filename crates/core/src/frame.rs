//! Per-frame inputs handed to engines.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::profile::RenderProfile;

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// `true` when there is nothing to draw into.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Last known pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub position: DVec2,
    pub active: bool,
}

impl Pointer {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            active: true,
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }
}

/// Everything an engine reads during one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub profile: &'a RenderProfile,
    pub viewport: Viewport,
    pub pointer: Pointer,
    /// Host timestamp in milliseconds.
    pub time_ms: f64,
    /// Multiplier on the speed clamp; 1.0 when no boost is active.
    pub speed_boost: f64,
    /// Hue override in degrees from an external hint.
    pub hue: Option<f64>,
}

impl<'a> FrameInput<'a> {
    /// Input with no boost, no hue override and an inactive pointer.
    pub fn new(profile: &'a RenderProfile, viewport: Viewport, time_ms: f64) -> Self {
        Self {
            profile,
            viewport,
            pointer: Pointer::inactive(),
            time_ms,
            speed_boost: 1.0,
            hue: None,
        }
    }

    pub fn with_pointer(mut self, pointer: Pointer) -> Self {
        self.pointer = pointer;
        self
    }
}
