#![deny(unsafe_code)]
//! Scene orchestration for the ambient background.
//!
//! This crate sits between `ambient-core` (the `Engine` trait, profiles and
//! surfaces) and the engine crates (`ambient-flow`, `ambient-attractor`).
//! It owns the mode/pause controller and its persistence, the optional
//! track hint, scene configuration, and the [`FrameDriver`] that schedules
//! frames and routes input to the active engine. Both the CLI and the WASM
//! bindings drive animations through it.

pub mod config;
pub mod driver;
pub mod hint;
pub mod mode;
pub mod store;

#[cfg(feature = "png")]
pub mod snapshot;

use ambient_attractor::LorenzEngine;
use ambient_core::{Engine, EngineError, FrameInput, RenderProfile, Rgba, Surface, Viewport};
use ambient_flow::FlowEngine;
use serde_json::Value;

pub use config::SceneConfig;
pub use driver::{FrameContext, FrameDriver, FrameHandle, FrameScheduler, ManualScheduler};
pub use hint::{HintEffect, HintSource, HueTracker, NoHint, StaticHint, TrackHint};
pub use mode::{Mode, ModeController, MODE_KEY, PAUSED_KEY};
pub use store::{FileStore, MemoryStore, ModeStore};

/// The engine behind each animated mode.
///
/// Delegates every `Engine` method to the wrapped implementation.
pub enum EngineKind {
    Flow(FlowEngine),
    Attractor(LorenzEngine),
}

impl EngineKind {
    /// Builds the engine for `mode`, or `None` for [`Mode::Off`].
    ///
    /// The whole `config` is validated first, so an out-of-range value is
    /// rejected even for a mode that would not read it.
    pub fn for_mode(
        mode: Mode,
        seed: u64,
        config: &SceneConfig,
    ) -> Result<Option<Self>, EngineError> {
        config.validate()?;
        Ok(match mode {
            Mode::Off => None,
            Mode::FlowField => Some(EngineKind::Flow(FlowEngine::new(
                seed,
                config.flow_settings(),
            )?)),
            Mode::Attractor => Some(EngineKind::Attractor(LorenzEngine::new(
                seed,
                config.attractor_settings(),
            )?)),
        })
    }

    /// The mode this engine renders.
    pub fn mode(&self) -> Mode {
        match self {
            EngineKind::Flow(_) => Mode::FlowField,
            EngineKind::Attractor(_) => Mode::Attractor,
        }
    }
}

impl Engine for EngineKind {
    fn resize(&mut self, viewport: Viewport, profile: &RenderProfile) {
        match self {
            EngineKind::Flow(e) => e.resize(viewport, profile),
            EngineKind::Attractor(e) => e.resize(viewport, profile),
        }
    }

    fn step(&mut self, frame: &FrameInput<'_>) {
        match self {
            EngineKind::Flow(e) => e.step(frame),
            EngineKind::Attractor(e) => e.step(frame),
        }
    }

    fn draw(&mut self, surface: &mut dyn Surface, frame: &FrameInput<'_>) {
        match self {
            EngineKind::Flow(e) => e.draw(surface, frame),
            EngineKind::Attractor(e) => e.draw(surface, frame),
        }
    }

    fn overlay(&self) -> Rgba {
        match self {
            EngineKind::Flow(e) => e.overlay(),
            EngineKind::Attractor(e) => e.overlay(),
        }
    }

    fn particle_count(&self) -> usize {
        match self {
            EngineKind::Flow(e) => e.particle_count(),
            EngineKind::Attractor(e) => e.particle_count(),
        }
    }

    fn params(&self) -> Value {
        match self {
            EngineKind::Flow(e) => e.params(),
            EngineKind::Attractor(e) => e.params(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambient_core::profile_for;

    #[test]
    fn off_has_no_engine() {
        assert!(EngineKind::for_mode(Mode::Off, 1, &SceneConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn animated_modes_build_matching_engines() {
        let config = SceneConfig::default();
        for mode in [Mode::FlowField, Mode::Attractor] {
            let engine = EngineKind::for_mode(mode, 42, &config).unwrap().unwrap();
            assert_eq!(engine.mode(), mode);
        }
    }

    #[test]
    fn invalid_config_surfaces_as_error() {
        let config = SceneConfig {
            cell_size: -1.0,
            ..SceneConfig::default()
        };
        assert!(matches!(
            EngineKind::for_mode(Mode::FlowField, 1, &config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn coarse_attractor_step_is_rejected_for_every_mode() {
        let config = SceneConfig {
            dt: 0.05,
            ..SceneConfig::default()
        };
        for mode in [Mode::Off, Mode::FlowField, Mode::Attractor] {
            assert!(
                matches!(
                    EngineKind::for_mode(mode, 1, &config),
                    Err(EngineError::InvalidConfig(_))
                ),
                "{mode} accepted dt 0.05"
            );
        }
    }

    #[test]
    fn delegation_reaches_the_inner_engine() {
        let profile = profile_for("/", 640.0, 480.0);
        let viewport = Viewport::new(640.0, 480.0);
        let mut engine = EngineKind::for_mode(Mode::FlowField, 42, &SceneConfig::default())
            .unwrap()
            .unwrap();
        engine.resize(viewport, &profile);
        engine.step(&FrameInput::new(&profile, viewport, 0.0));
        assert_eq!(engine.particle_count(), profile.particle_count);
        assert!(engine.params().get("cell_size").is_some());
        assert_eq!(engine.overlay(), Rgba::new(0, 0, 0, 0.2));
    }

    #[test]
    fn object_safety() {
        let engine = EngineKind::for_mode(Mode::Attractor, 1, &SceneConfig::default())
            .unwrap()
            .unwrap();
        let boxed: Box<dyn Engine> = Box::new(engine);
        assert_eq!(boxed.overlay(), Rgba::new(5, 5, 5, 0.15));
    }
}
