//! Animation modes and the persisted mode/pause controller.

use std::fmt;
use std::str::FromStr;

use ambient_core::EngineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::ModeStore;

/// Storage key of the selected mode.
pub const MODE_KEY: &str = "ambient-mode";
/// Storage key of the page-level pause flag.
pub const PAUSED_KEY: &str = "ambient-paused";

/// Which background runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Off,
    #[default]
    FlowField,
    Attractor,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Off, Mode::FlowField, Mode::Attractor];

    /// Canonical name, as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Off => "off",
            Mode::FlowField => "flow-field",
            Mode::Attractor => "attractor",
        }
    }

    /// Parses a persisted value. Only the exact canonical names and the
    /// legacy `boids` and `lorenz` names are recognised.
    pub fn from_stored(raw: &str) -> Option<Mode> {
        match raw {
            "off" => Some(Mode::Off),
            "flow-field" | "boids" => Some(Mode::FlowField),
            "attractor" | "lorenz" => Some(Mode::Attractor),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    /// Accepts canonical names plus the older `boids` and `lorenz` names,
    /// ignoring surrounding whitespace and ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Mode::Off),
            "flow-field" | "flow" | "boids" => Ok(Mode::FlowField),
            "attractor" | "lorenz" => Ok(Mode::Attractor),
            _ => Err(EngineError::UnknownMode(s.to_string())),
        }
    }
}

/// Current mode and pause flag, mirrored into a [`ModeStore`].
///
/// Starts at the default mode, unpaused, so the first paint never waits on
/// storage. [`restore`](Self::restore) then applies whatever was persisted.
#[derive(Debug)]
pub struct ModeController<S: ModeStore> {
    store: S,
    mode: Mode,
    paused: bool,
}

impl<S: ModeStore> ModeController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mode: Mode::default(),
            paused: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Loads the persisted mode and pause flag.
    ///
    /// Missing, unreadable or unrecognised values leave the defaults in
    /// place.
    pub fn restore(&mut self) -> Mode {
        self.mode = match self.store.load(MODE_KEY) {
            Ok(Some(raw)) => Mode::from_stored(&raw).unwrap_or_else(|| {
                debug!(value = %raw, "ignoring unrecognised stored mode");
                Mode::default()
            }),
            Ok(None) => Mode::default(),
            Err(e) => {
                debug!(error = %e, "mode store unreadable, using default");
                Mode::default()
            }
        };
        self.paused = matches!(self.store.load(PAUSED_KEY), Ok(Some(v)) if v == "true");
        info!(mode = %self.mode, paused = self.paused, "restored mode");
        self.mode
    }

    /// Switches mode and persists it. The in-memory mode changes even when
    /// persisting fails.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), EngineError> {
        self.mode = mode;
        self.store.save(MODE_KEY, mode.as_str())
    }

    pub fn set_paused(&mut self, paused: bool) -> Result<(), EngineError> {
        self.paused = paused;
        self.store
            .save(PAUSED_KEY, if paused { "true" } else { "false" })
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_paused(&mut self) -> Result<bool, EngineError> {
        let paused = !self.paused;
        self.set_paused(paused)?;
        Ok(paused)
    }
}
