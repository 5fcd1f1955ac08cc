//! Scene-wide tuning loaded from JSON.

use std::fs;
use std::path::Path;

use ambient_attractor::{AttractorSettings, LorenzParams};
use ambient_core::prng::entropy_seed;
use ambient_core::EngineError;
use ambient_flow::{FlowSettings, DEFAULT_CELL_SIZE, DEFAULT_CONNECTION_RADIUS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every tunable the scene exposes. Missing JSON keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Fixed seed for reproducible runs; `None` draws one from entropy.
    pub seed: Option<u64>,
    pub cell_size: f64,
    pub connections: bool,
    pub connection_radius: f64,
    pub trail_capacity: usize,
    pub attractor_initial: usize,
    pub attractor_cap: usize,
    pub spawn_stagger_frames: u32,
    pub growth_chance: f64,
    pub dt: f64,
    pub substeps: u32,
    pub boost_factor: f64,
    pub boost_window_ms: f64,
    pub hint_stale_ms: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let attractor = AttractorSettings::default();
        Self {
            seed: None,
            cell_size: DEFAULT_CELL_SIZE,
            connections: true,
            connection_radius: DEFAULT_CONNECTION_RADIUS,
            trail_capacity: attractor.trail_capacity,
            attractor_initial: attractor.initial,
            attractor_cap: attractor.cap,
            spawn_stagger_frames: attractor.spawn_stagger_frames,
            growth_chance: attractor.growth_chance,
            dt: attractor.lorenz.dt,
            substeps: attractor.lorenz.substeps,
            boost_factor: 2.5,
            boost_window_ms: 2_000.0,
            hint_stale_ms: 120_000.0,
        }
    }
}

impl SceneConfig {
    /// Parses a JSON object; absent keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Returns a copy with the keys of `overrides` (a JSON object) applied.
    pub fn merged(&self, overrides: &Value) -> Result<Self, EngineError> {
        let Value::Object(patch) = overrides else {
            return Err(EngineError::InvalidConfig(
                "overrides must be a JSON object".into(),
            ));
        };
        let mut base = serde_json::to_value(self)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        if let Value::Object(fields) = &mut base {
            for (k, v) in patch {
                fields.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Rejects values the engines cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        positive("cell_size", self.cell_size)?;
        positive("connection_radius", self.connection_radius)?;
        if !(self.boost_factor.is_finite() && self.boost_factor >= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "boost_factor must be at least 1, got {}",
                self.boost_factor
            )));
        }
        positive("boost_window_ms", self.boost_window_ms)?;
        positive("hint_stale_ms", self.hint_stale_ms)?;
        self.attractor_settings().validate()?;
        Ok(())
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            cell_size: self.cell_size,
            connections: self.connections,
            connection_radius: self.connection_radius,
        }
    }

    pub fn attractor_settings(&self) -> AttractorSettings {
        AttractorSettings {
            trail_capacity: self.trail_capacity,
            initial: self.attractor_initial,
            cap: self.attractor_cap,
            spawn_stagger_frames: self.spawn_stagger_frames,
            growth_chance: self.growth_chance,
            lorenz: LorenzParams {
                dt: self.dt,
                substeps: self.substeps,
                ..LorenzParams::default()
            },
        }
    }

    /// The configured seed, or a fresh nondeterministic one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(entropy_seed)
    }
}

fn positive(name: &str, v: f64) -> Result<(), EngineError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "{name} must be positive and finite, got {v}"
        )))
    }
}
