#![deny(unsafe_code)]
//! Flow field background engine.
//!
//! A grid of angles sampled from 2D simplex noise steers a few hundred to a
//! few thousand particles. Each frame the field is resampled at an advancing
//! time offset, every particle is pushed along its cell's angle (plus the
//! pointer impulse and route bias), and particles closer than the
//! connection radius are joined by faint constellation lines found through
//! [`ambient_constellation::NeighborGrid`].

pub mod field;
pub mod particle;

use ambient_constellation::NeighborGrid;
use ambient_core::{
    Engine, EngineError, FrameInput, RenderProfile, Rgba, SimplexNoise, Surface, Viewport,
    Xorshift64,
};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub use field::{FlowField, DEFAULT_CELL_SIZE};
pub use particle::{particle_color, update_particle, FlowParticle};

/// Edge of the square drawn for each particle.
const PARTICLE_SIZE: f64 = 1.5;
/// Peak alpha of a constellation line between coincident particles.
const LINK_ALPHA: f64 = 0.15;
/// Default maximum length of a constellation line.
pub const DEFAULT_CONNECTION_RADIUS: f64 = 60.0;

/// Tuning that is fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSettings {
    pub cell_size: f64,
    pub connections: bool,
    pub connection_radius: f64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            connections: true,
            connection_radius: DEFAULT_CONNECTION_RADIUS,
        }
    }
}

/// Flow field engine.
pub struct FlowEngine {
    settings: FlowSettings,
    rng: Xorshift64,
    noise: SimplexNoise,
    field: FlowField,
    particles: Vec<FlowParticle>,
    grid: NeighborGrid,
    positions: Vec<DVec2>,
    viewport: Viewport,
    links: usize,
}

impl FlowEngine {
    /// Creates an engine with no particles; call [`Engine::resize`] before
    /// the first frame.
    ///
    /// Returns `EngineError::InvalidConfig` for a non-positive cell size or
    /// connection radius.
    pub fn new(seed: u64, settings: FlowSettings) -> Result<Self, EngineError> {
        let field = FlowField::new(settings.cell_size)?;
        let grid = NeighborGrid::new(settings.connection_radius)?;
        let mut rng = Xorshift64::new(seed);
        let noise = SimplexNoise::new(rng.next_u64());
        Ok(Self {
            settings,
            rng,
            noise,
            field,
            particles: Vec::new(),
            grid,
            positions: Vec::new(),
            viewport: Viewport::default(),
            links: 0,
        })
    }

    pub fn settings(&self) -> FlowSettings {
        self.settings
    }

    pub fn particles(&self) -> &[FlowParticle] {
        &self.particles
    }

    pub fn field(&self) -> &FlowField {
        &self.field
    }

    /// Constellation lines found on the last step.
    pub fn link_count(&self) -> usize {
        self.links
    }

    fn populate(&mut self, count: usize) {
        let viewport = self.viewport;
        let rng = &mut self.rng;
        self.particles.clear();
        self.particles
            .extend((0..count).map(|_| FlowParticle::spawn(rng, viewport)));
    }
}

impl Engine for FlowEngine {
    fn resize(&mut self, viewport: Viewport, profile: &RenderProfile) {
        self.viewport = viewport;
        self.field.resize(viewport);
        self.populate(profile.particle_count);
        self.links = 0;
        debug!(
            width = viewport.width,
            height = viewport.height,
            particles = profile.particle_count,
            "flow field resized"
        );
    }

    fn step(&mut self, frame: &FrameInput<'_>) {
        if frame.viewport != self.viewport || frame.profile.particle_count != self.particles.len() {
            self.resize(frame.viewport, frame.profile);
        }
        if self.viewport.is_empty() {
            return;
        }

        let profile = frame.profile;
        self.field
            .update(&self.noise, profile.noise_zoom, profile.speed_mod);

        for (i, p) in self.particles.iter_mut().enumerate() {
            update_particle(
                p,
                &self.field,
                frame.pointer,
                self.viewport,
                profile,
                frame.speed_boost,
            );
            if !p.is_finite() {
                debug!(index = i, "respawning non-finite flow particle");
                *p = FlowParticle::spawn(&mut self.rng, self.viewport);
            }
        }

        self.links = 0;
        if self.settings.connections {
            self.positions.clear();
            self.positions.extend(self.particles.iter().map(|p| p.pos));
            self.grid
                .rebuild(&self.positions, self.viewport.width, self.viewport.height);
        }
    }

    fn draw(&mut self, surface: &mut dyn Surface, frame: &FrameInput<'_>) {
        let scheme = frame.profile.color_scheme;

        if self.settings.connections && self.positions.len() == self.particles.len() {
            let base = particle_color(scheme, 0.0, frame.hue);
            let radius = self.grid.radius();
            let positions = &self.positions;
            let stats = self.grid.for_each_pair(positions, |i, j, d2| {
                let alpha = (1.0 - d2.sqrt() / radius) * LINK_ALPHA;
                surface.stroke_line(positions[i], positions[j], base.with_alpha(alpha), 1.0);
            });
            self.links = stats.pairs;
        }

        for p in &self.particles {
            let color = particle_color(scheme, p.speed(), frame.hue);
            surface.fill_rect(p.pos.x, p.pos.y, PARTICLE_SIZE, PARTICLE_SIZE, color);
        }
    }

    fn overlay(&self) -> Rgba {
        Rgba::new(0, 0, 0, 0.2)
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn params(&self) -> Value {
        json!({
            "cell_size": self.settings.cell_size,
            "connections": self.settings.connections,
            "connection_radius": self.settings.connection_radius,
            "particles": self.particles.len(),
            "z_offset": self.field.z_offset(),
        })
    }
}
