//! Flow particle motion and coloring.

use std::f64::consts::{FRAC_PI_2, PI};

use ambient_core::{ColorScheme, Pointer, PointerMode, RenderProfile, Rgba, Viewport, Xorshift64};
use glam::DVec2;

use crate::field::FlowField;

/// Weight of the bias direction when blending the field angle.
const BIAS_BLEND: f64 = 0.1;
/// Extra vertical velocity per unit of bias per step.
const BIAS_PUSH: f64 = 0.05;
/// Field acceleration per step.
const FIELD_PUSH: f64 = 0.1;
/// Speed at which particle color saturates.
const COLOR_SPEED: f64 = 3.0;

/// A point carried by the flow field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParticle {
    pub pos: DVec2,
    pub vel: DVec2,
    /// Drawn once from [1, 2); scales this particle's speed limit.
    pub base_speed: f64,
}

impl FlowParticle {
    /// Places a particle at rest uniformly inside the viewport.
    pub fn spawn(rng: &mut Xorshift64, viewport: Viewport) -> Self {
        Self {
            pos: DVec2::new(
                rng.next_range(0.0, viewport.width.max(0.0)),
                rng.next_range(0.0, viewport.height.max(0.0)),
            ),
            vel: DVec2::ZERO,
            base_speed: rng.next_range(1.0, 2.0),
        }
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}

/// Advances one particle by a frame.
///
/// Reads the field angle under the particle, applies vertical bias, the
/// pointer impulse, field acceleration and damping, clamps speed to
/// `base_speed · speed_mod · speed_boost`, then moves and wraps so the
/// particle ends inside `[0, width) × [0, height)`.
pub fn update_particle(
    particle: &mut FlowParticle,
    field: &FlowField,
    pointer: Pointer,
    viewport: Viewport,
    profile: &RenderProfile,
    speed_boost: f64,
) {
    let mut angle = field.angle_at(particle.pos);

    let bias = profile.vertical_bias;
    if bias != 0.0 {
        let target = if bias > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        angle = angle * (1.0 - BIAS_BLEND) + target * BIAS_BLEND;
    }

    if pointer.active {
        let response = profile.pointer;
        let to_pointer = pointer.position - particle.pos;
        let dist_sq = to_pointer.length_squared();
        if dist_sq < response.radius_sq {
            let force = (response.radius_sq - dist_sq) / response.radius_sq;
            let mut heading = to_pointer.y.atan2(to_pointer.x);
            if response.mode == PointerMode::Repel {
                heading += PI;
            }
            particle.vel += DVec2::from_angle(heading) * response.strength * force;
        }
    }

    particle.vel += DVec2::from_angle(angle) * FIELD_PUSH;
    particle.vel.y += bias * BIAS_PUSH;
    particle.vel *= profile.damping;

    let max_speed = particle.base_speed * profile.speed_mod * speed_boost;
    let speed = particle.vel.length();
    if speed > max_speed && speed > 0.0 {
        particle.vel *= max_speed / speed;
    }

    particle.pos += particle.vel;
    particle.pos.x = wrap(particle.pos.x, viewport.width);
    particle.pos.y = wrap(particle.pos.y, viewport.height);
}

fn wrap(v: f64, extent: f64) -> f64 {
    if !(extent > 0.0) {
        return 0.0;
    }
    let w = v.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if w >= extent {
        0.0
    } else {
        w
    }
}

/// Color for a particle moving at `speed`.
///
/// Speed is normalized as `min(speed / 3, 1)`, which also drives alpha
/// `0.4 + 0.6 · norm`. A `hue` hint overrides the scheme with
/// HSL(hue, 70%, 45–75%).
pub fn particle_color(scheme: ColorScheme, speed: f64, hue: Option<f64>) -> Rgba {
    let norm = if speed.is_finite() {
        (speed / COLOR_SPEED).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let alpha = 0.4 + norm * 0.6;

    if let Some(hue) = hue {
        return Rgba::from_hsla(hue, 0.7, 0.45 + norm * 0.3, alpha);
    }

    match scheme {
        ColorScheme::Blue => {
            let rg = channel(50.0 + norm * 100.0);
            Rgba::new(rg, rg, channel(200.0 + norm * 55.0), alpha)
        }
        ColorScheme::Gold => Rgba::new(255, 215, channel(norm * 100.0), alpha),
        ColorScheme::Cyan => Rgba::new(0, channel(200.0 + norm * 55.0), 255, alpha),
        ColorScheme::White => Rgba::new(200, 200, 200, alpha),
        ColorScheme::Chaos => Rgba::from_hsla(180.0 + norm * 150.0, 0.8, 0.6, alpha),
    }
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
