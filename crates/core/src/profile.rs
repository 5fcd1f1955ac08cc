//! Render profiles: per-route motion tuning plus per-device cost tiers.
//!
//! [`profile_for`] is pure and total. Route resolution tries an exact match,
//! then the longest known non-root prefix, then falls back to `/`. The
//! viewport width independently picks a [`DeviceClass`], which sets the flow
//! particle count and the attractor projection scale so small screens stay
//! within frame budget.

use serde::Serialize;

/// Palette family used to color flow particles by speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Blue,
    Gold,
    Cyan,
    White,
    Chaos,
}

/// Whether the pointer pushes particles away or pulls them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerMode {
    Repel,
    Attract,
}

/// Pointer interaction tuning. Force falls off linearly with squared
/// distance, reaching zero at `radius_sq`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerResponse {
    pub radius_sq: f64,
    pub strength: f64,
    pub mode: PointerMode,
}

/// Viewport size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    /// Classifies by viewport width in CSS pixels.
    pub fn classify(width: f64) -> Self {
        if width < 640.0 {
            DeviceClass::Mobile
        } else if width < 1024.0 {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }

    /// Flow particle count for this class.
    pub fn particle_count(self) -> usize {
        match self {
            DeviceClass::Mobile => 600,
            DeviceClass::Tablet => 1000,
            DeviceClass::Desktop => 1500,
        }
    }

    /// Pixels per Lorenz unit when projecting attractor trails.
    pub fn projection_scale(self) -> f64 {
        match self {
            DeviceClass::Mobile => 8.0,
            DeviceClass::Tablet => 11.0,
            DeviceClass::Desktop => 15.0,
        }
    }
}

/// Motion tuning attached to a route.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RouteTuning {
    route: &'static str,
    speed_mod: f64,
    noise_zoom: f64,
    vertical_bias: f64,
    color_scheme: ColorScheme,
    pointer: PointerResponse,
    damping: f64,
}

const REPEL: PointerResponse = PointerResponse {
    radius_sq: 20_000.0,
    strength: 0.2,
    mode: PointerMode::Repel,
};

const ROUTES: [RouteTuning; 6] = [
    RouteTuning {
        route: "/",
        speed_mod: 1.0,
        noise_zoom: 0.05,
        vertical_bias: 0.0,
        color_scheme: ColorScheme::Blue,
        pointer: REPEL,
        damping: 1.0,
    },
    RouteTuning {
        route: "/projects",
        speed_mod: 1.1,
        noise_zoom: 0.06,
        vertical_bias: 0.0,
        color_scheme: ColorScheme::Cyan,
        pointer: REPEL,
        damping: 1.0,
    },
    RouteTuning {
        route: "/resume",
        speed_mod: 0.8,
        noise_zoom: 0.03,
        vertical_bias: -1.0,
        color_scheme: ColorScheme::Gold,
        pointer: PointerResponse {
            radius_sq: 20_000.0,
            strength: 0.15,
            mode: PointerMode::Repel,
        },
        damping: 0.97,
    },
    RouteTuning {
        route: "/blog",
        speed_mod: 0.7,
        noise_zoom: 0.04,
        vertical_bias: 0.0,
        color_scheme: ColorScheme::Blue,
        pointer: REPEL,
        damping: 1.0,
    },
    RouteTuning {
        route: "/about",
        speed_mod: 0.6,
        noise_zoom: 0.03,
        vertical_bias: 0.0,
        color_scheme: ColorScheme::White,
        pointer: PointerResponse {
            radius_sq: 30_000.0,
            strength: 0.1,
            mode: PointerMode::Attract,
        },
        damping: 0.97,
    },
    RouteTuning {
        route: "/chaos",
        speed_mod: 1.2,
        noise_zoom: 0.05,
        vertical_bias: 0.0,
        color_scheme: ColorScheme::Chaos,
        pointer: PointerResponse {
            radius_sq: 40_000.0,
            strength: 0.3,
            mode: PointerMode::Attract,
        },
        damping: 1.0,
    },
];

/// Complete tuning for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderProfile {
    /// The known route this profile was resolved to.
    pub route: &'static str,
    pub speed_mod: f64,
    pub noise_zoom: f64,
    /// Positive skews flow downward, negative upward, zero disables.
    pub vertical_bias: f64,
    pub color_scheme: ColorScheme,
    pub pointer: PointerResponse,
    /// Per-step velocity multiplier; 1.0 disables inertia decay.
    pub damping: f64,
    pub device: DeviceClass,
    pub particle_count: usize,
    pub projection_scale: f64,
}

/// Routes with a dedicated profile.
pub fn known_routes() -> impl Iterator<Item = &'static str> {
    ROUTES.iter().map(|r| r.route)
}

/// Resolves the profile for `route` on a viewport of the given size.
///
/// Only the width participates in device classification today.
pub fn profile_for(route: &str, viewport_width: f64, _viewport_height: f64) -> RenderProfile {
    let tuning = resolve_route(route);
    let device = DeviceClass::classify(viewport_width);
    RenderProfile {
        route: tuning.route,
        speed_mod: tuning.speed_mod,
        noise_zoom: tuning.noise_zoom,
        vertical_bias: tuning.vertical_bias,
        color_scheme: tuning.color_scheme,
        pointer: tuning.pointer,
        damping: tuning.damping,
        device,
        particle_count: device.particle_count(),
        projection_scale: device.projection_scale(),
    }
}

fn resolve_route(route: &str) -> &'static RouteTuning {
    let path = route.split(['?', '#']).next().unwrap_or(route);

    if let Some(exact) = ROUTES.iter().find(|r| r.route == path) {
        return exact;
    }

    ROUTES
        .iter()
        .filter(|r| r.route != "/" && path.starts_with(r.route))
        .max_by_key(|r| r.route.len())
        .unwrap_or(&ROUTES[0])
}
