#![deny(unsafe_code)]
//! Lorenz attractor background engine.
//!
//! A few dozen trajectories start near `(0.1, 0, 0)` and are integrated each
//! frame, each keeping a short fixed-capacity trail. Trails are drawn as
//! graded segments rotating about the vertical axis, steered by the pointer,
//! and the surface is faded with a dark translucent overlay so older
//! strokes dissolve.

pub mod lorenz;
pub mod projection;

use ambient_core::{
    Engine, EngineError, FrameInput, RenderProfile, Rgba, Surface, Viewport, Xorshift64,
};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub use lorenz::{AttractorParticle, LorenzParams, Trail, DT_RANGE};
pub use projection::Projection;

/// Alpha of the newest trail segment.
const TRAIL_ALPHA: f64 = 0.5;
const HEAD_RADIUS: f64 = 1.5;

/// Population and trail tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttractorSettings {
    pub trail_capacity: usize,
    /// Particles spawned after a reset.
    pub initial: usize,
    /// Upper bound reached through random growth.
    pub cap: usize,
    /// Frames between staggered spawns after a reset; 0 spawns all at once.
    pub spawn_stagger_frames: u32,
    /// Per-frame probability of adding one particle once the initial batch
    /// is complete.
    pub growth_chance: f64,
    pub lorenz: LorenzParams,
}

impl Default for AttractorSettings {
    fn default() -> Self {
        Self {
            trail_capacity: 50,
            initial: 30,
            cap: 50,
            spawn_stagger_frames: 2,
            growth_chance: 0.03,
            lorenz: LorenzParams::default(),
        }
    }
}

impl AttractorSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.lorenz.validate()?;
        if self.trail_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "trail capacity must be at least 1".into(),
            ));
        }
        if self.cap == 0 || self.initial > self.cap {
            return Err(EngineError::InvalidConfig(format!(
                "attractor population needs 0 < initial ({}) <= cap ({})",
                self.initial, self.cap
            )));
        }
        if !(0.0..=1.0).contains(&self.growth_chance) {
            return Err(EngineError::InvalidConfig(format!(
                "growth chance must be within [0, 1], got {}",
                self.growth_chance
            )));
        }
        Ok(())
    }
}

/// Lorenz attractor engine.
pub struct LorenzEngine {
    settings: AttractorSettings,
    rng: Xorshift64,
    particles: Vec<AttractorParticle>,
    /// Initial-batch particles not yet spawned.
    pending: usize,
    frame: u64,
    viewport: Viewport,
    scale: f64,
    projected: Vec<DVec2>,
}

impl LorenzEngine {
    /// Creates an engine and queues the initial batch.
    pub fn new(seed: u64, settings: AttractorSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        let mut engine = Self {
            settings,
            rng: Xorshift64::new(seed),
            particles: Vec::with_capacity(settings.cap),
            pending: 0,
            frame: 0,
            viewport: Viewport::default(),
            scale: 15.0,
            projected: Vec::with_capacity(settings.trail_capacity),
        };
        engine.reset();
        Ok(engine)
    }

    /// Drops every trajectory and queues a fresh staggered batch.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.pending = self.settings.initial;
        self.frame = 0;
        if self.settings.spawn_stagger_frames == 0 {
            self.spawn_pending(self.pending);
        }
    }

    pub fn settings(&self) -> AttractorSettings {
        self.settings
    }

    pub fn particles(&self) -> &[AttractorParticle] {
        &self.particles
    }

    /// Initial-batch particles still waiting to spawn.
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn spawn_pending(&mut self, n: usize) {
        let n = n.min(self.pending);
        for _ in 0..n {
            self.particles
                .push(AttractorParticle::spawn(&mut self.rng, self.settings.trail_capacity));
        }
        self.pending -= n;
    }

    fn grow(&mut self) {
        if self.pending > 0 {
            let stagger = u64::from(self.settings.spawn_stagger_frames.max(1));
            if self.frame % stagger == 0 {
                self.spawn_pending(1);
            }
        } else if self.particles.len() < self.settings.cap
            && self.rng.chance(self.settings.growth_chance)
        {
            self.particles
                .push(AttractorParticle::spawn(&mut self.rng, self.settings.trail_capacity));
        }
    }
}

impl Engine for LorenzEngine {
    fn resize(&mut self, viewport: Viewport, profile: &RenderProfile) {
        self.viewport = viewport;
        self.scale = profile.projection_scale;
        debug!(
            width = viewport.width,
            height = viewport.height,
            scale = self.scale,
            "attractor projection resized"
        );
    }

    fn step(&mut self, frame: &FrameInput<'_>) {
        if frame.viewport != self.viewport || frame.profile.projection_scale != self.scale {
            self.resize(frame.viewport, frame.profile);
        }

        let params = self.settings.lorenz;
        let capacity = self.settings.trail_capacity;
        for (i, p) in self.particles.iter_mut().enumerate() {
            if !p.advance(&params) {
                debug!(index = i, "respawning diverged attractor particle");
                *p = AttractorParticle::spawn(&mut self.rng, capacity);
            }
        }

        self.grow();
        self.frame += 1;
    }

    fn draw(&mut self, surface: &mut dyn Surface, frame: &FrameInput<'_>) {
        if self.viewport.is_empty() {
            return;
        }
        let projection = Projection::new(self.viewport, frame.pointer, frame.time_ms, self.scale);

        for p in &self.particles {
            self.projected.clear();
            self.projected
                .extend(p.trail.iter().map(|&pt| projection.project(pt)));

            let hue = match frame.hue {
                Some(h) => h + p.hue - 40.0,
                None => p.hue,
            };

            let segments = self.projected.len().saturating_sub(1);
            for (k, pair) in self.projected.windows(2).enumerate() {
                let age = (k + 1) as f64 / segments as f64;
                let color = Rgba::from_hsla(hue, 0.8, 0.6, TRAIL_ALPHA * age);
                surface.stroke_line(pair[0], pair[1], color, 1.0);
            }

            if let Some(&head) = self.projected.last() {
                surface.fill_circle(head, HEAD_RADIUS, Rgba::from_hsla(hue, 0.8, 0.75, 0.9));
            }
        }
    }

    fn overlay(&self) -> Rgba {
        Rgba::new(5, 5, 5, 0.15)
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn params(&self) -> Value {
        let l = self.settings.lorenz;
        json!({
            "sigma": l.sigma,
            "rho": l.rho,
            "beta": l.beta,
            "dt": l.dt,
            "substeps": l.substeps,
            "trail_capacity": self.settings.trail_capacity,
            "particles": self.particles.len(),
            "cap": self.settings.cap,
            "projection_scale": self.scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambient_core::{profile_for, PixelSurface, Pointer};
    use glam::DVec3;

    fn run(engine: &mut LorenzEngine, frames: usize) {
        let profile = profile_for("/", 800.0, 600.0);
        let viewport = Viewport::new(800.0, 600.0);
        for t in 0..frames {
            engine.step(&FrameInput::new(&profile, viewport, t as f64 * 16.0));
        }
    }

    #[test]
    fn settings_validation() {
        assert!(AttractorSettings::default().validate().is_ok());
        let inverted = AttractorSettings {
            initial: 60,
            cap: 50,
            ..AttractorSettings::default()
        };
        assert!(matches!(inverted.validate(), Err(EngineError::InvalidConfig(_))));
        let no_trail = AttractorSettings {
            trail_capacity: 0,
            ..AttractorSettings::default()
        };
        assert!(LorenzEngine::new(1, no_trail).is_err());
        let odds = AttractorSettings {
            growth_chance: 1.5,
            ..AttractorSettings::default()
        };
        assert!(odds.validate().is_err());
    }

    #[test]
    fn new_rejects_a_step_outside_the_stable_range() {
        let settings = AttractorSettings {
            lorenz: LorenzParams {
                dt: 0.05,
                ..LorenzParams::default()
            },
            ..AttractorSettings::default()
        };
        assert!(matches!(
            LorenzEngine::new(1, settings),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn initial_batch_is_staggered() {
        let mut engine = LorenzEngine::new(7, AttractorSettings::default()).unwrap();
        assert_eq!(engine.particle_count(), 0);
        assert_eq!(engine.pending(), 30);
        run(&mut engine, 10);
        assert_eq!(engine.particle_count(), 5);
        run(&mut engine, 50);
        assert_eq!(engine.pending(), 0);
        assert!(engine.particle_count() >= 30);
    }

    #[test]
    fn zero_stagger_spawns_everything_immediately() {
        let settings = AttractorSettings {
            spawn_stagger_frames: 0,
            ..AttractorSettings::default()
        };
        let engine = LorenzEngine::new(7, settings).unwrap();
        assert_eq!(engine.particle_count(), 30);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn growth_stops_at_cap() {
        let settings = AttractorSettings {
            spawn_stagger_frames: 0,
            growth_chance: 1.0,
            ..AttractorSettings::default()
        };
        let mut engine = LorenzEngine::new(3, settings).unwrap();
        run(&mut engine, 100);
        assert_eq!(engine.particle_count(), 50);
    }

    #[test]
    fn trails_respect_capacity() {
        let settings = AttractorSettings {
            trail_capacity: 12,
            ..AttractorSettings::default()
        };
        let mut engine = LorenzEngine::new(9, settings).unwrap();
        run(&mut engine, 200);
        assert!(engine.particles().iter().all(|p| p.trail.len() <= 12));
        assert!(engine.particles().iter().any(|p| p.trail.len() == 12));
    }

    #[test]
    fn reset_clears_and_requeues() {
        let mut engine = LorenzEngine::new(5, AttractorSettings::default()).unwrap();
        run(&mut engine, 100);
        assert!(engine.particle_count() > 0);
        engine.reset();
        assert_eq!(engine.particle_count(), 0);
        assert_eq!(engine.pending(), 30);
    }

    #[test]
    fn diverged_particle_is_respawned() {
        let settings = AttractorSettings {
            spawn_stagger_frames: 0,
            ..AttractorSettings::default()
        };
        let mut engine = LorenzEngine::new(5, settings).unwrap();
        engine.particles[0].pos = DVec3::new(f64::MAX, f64::MAX, 0.0);
        run(&mut engine, 1);
        assert!(engine.particles().iter().all(|p| p.pos.is_finite()));
        assert!((engine.particles()[0].pos.x - 0.1).abs() <= 0.05);
    }

    #[test]
    fn draw_leaves_marks_near_center() {
        let settings = AttractorSettings {
            spawn_stagger_frames: 0,
            ..AttractorSettings::default()
        };
        let mut engine = LorenzEngine::new(11, settings).unwrap();
        run(&mut engine, 300);

        let profile = profile_for("/", 800.0, 600.0);
        let frame = FrameInput::new(&profile, Viewport::new(800.0, 600.0), 4_800.0)
            .with_pointer(Pointer::at(200.0, 300.0));
        let mut surface = PixelSurface::new(800, 600, Rgba::opaque(5, 5, 5)).unwrap();
        engine.draw(&mut surface, &frame);
        assert!(surface.count_differing([5, 5, 5]) > 100);
    }

    #[test]
    fn projection_scale_follows_device_tier() {
        let mut engine = LorenzEngine::new(1, AttractorSettings::default()).unwrap();
        let mobile = profile_for("/", 375.0, 700.0);
        engine.step(&FrameInput::new(&mobile, Viewport::new(375.0, 700.0), 0.0));
        assert_eq!(engine.params()["projection_scale"], mobile.projection_scale);
    }

    #[test]
    fn overlay_is_the_dark_attractor_fade() {
        let engine = LorenzEngine::new(1, AttractorSettings::default()).unwrap();
        assert_eq!(engine.overlay(), Rgba::new(5, 5, 5, 0.15));
    }
}
