//! Optional "now playing" hint: a track id tints the particles and each new
//! track briefly speeds the animation up.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Track currently playing, as reported by some external poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackHint {
    pub track_id: String,
    /// Host time at which the hint was fetched, in milliseconds.
    pub fetched_at_ms: f64,
}

impl TrackHint {
    pub fn new(track_id: impl Into<String>, fetched_at_ms: f64) -> Self {
        Self {
            track_id: track_id.into(),
            fetched_at_ms,
        }
    }
}

/// Supplies the latest hint, if any.
pub trait HintSource {
    fn current_hint(&self) -> Option<TrackHint>;
}

/// Source that never has a hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHint;

impl HintSource for NoHint {
    fn current_hint(&self) -> Option<TrackHint> {
        None
    }
}

/// Shared, externally settable hint slot.
///
/// Clones share the slot, so a host can keep one handle and give another to
/// the frame driver.
#[derive(Debug, Clone, Default)]
pub struct StaticHint {
    slot: Rc<RefCell<Option<TrackHint>>>,
}

impl StaticHint {
    pub fn new(hint: Option<TrackHint>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(hint)),
        }
    }

    pub fn set(&self, hint: TrackHint) {
        *self.slot.borrow_mut() = Some(hint);
    }

    pub fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }
}

impl HintSource for StaticHint {
    fn current_hint(&self) -> Option<TrackHint> {
        self.slot.borrow().clone()
    }
}

/// What a hint contributes to one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintEffect {
    pub hue: Option<f64>,
    pub speed_boost: f64,
}

impl HintEffect {
    pub const NONE: HintEffect = HintEffect {
        hue: None,
        speed_boost: 1.0,
    };
}

/// Turns successive hints into a hue and a decaying speed boost.
#[derive(Debug, Clone)]
pub struct HueTracker {
    boost_factor: f64,
    boost_window_ms: f64,
    stale_ms: f64,
    track: Option<String>,
    hue: f64,
    boost_started_ms: Option<f64>,
}

impl HueTracker {
    pub fn new(boost_factor: f64, boost_window_ms: f64, stale_ms: f64) -> Self {
        Self {
            boost_factor,
            boost_window_ms,
            stale_ms,
            track: None,
            hue: 0.0,
            boost_started_ms: None,
        }
    }

    /// Folds in the current hint at host time `now_ms`.
    ///
    /// A missing or stale hint yields [`HintEffect::NONE`] and forgets the
    /// track, so the same track coming back boosts again. A new track id
    /// restarts the boost, which decays linearly from `boost_factor` to 1
    /// over the boost window.
    pub fn observe(&mut self, hint: Option<&TrackHint>, now_ms: f64) -> HintEffect {
        let Some(hint) = hint.filter(|h| !self.is_stale(h, now_ms)) else {
            self.track = None;
            self.boost_started_ms = None;
            return HintEffect::NONE;
        };

        if self.track.as_deref() != Some(hint.track_id.as_str()) {
            self.hue = hue_for(&hint.track_id);
            self.track = Some(hint.track_id.clone());
            self.boost_started_ms = Some(now_ms);
            debug!(track = %hint.track_id, hue = self.hue, "track changed");
        }

        HintEffect {
            hue: Some(self.hue),
            speed_boost: self.boost_at(now_ms),
        }
    }

    /// A hint fetched after `now_ms` comes from a skewed clock and is
    /// treated as stale, as is anything with a NaN timestamp.
    fn is_stale(&self, hint: &TrackHint, now_ms: f64) -> bool {
        let age = now_ms - hint.fetched_at_ms;
        !(0.0..=self.stale_ms).contains(&age)
    }

    fn boost_at(&self, now_ms: f64) -> f64 {
        let Some(start) = self.boost_started_ms else {
            return 1.0;
        };
        if !(self.boost_window_ms > 0.0) {
            return 1.0;
        }
        let remaining = 1.0 - ((now_ms - start) / self.boost_window_ms).clamp(0.0, 1.0);
        1.0 + (self.boost_factor - 1.0) * remaining
    }
}

/// Hue in [0, 360) derived from the FNV-1a hash of `track_id`.
pub fn hue_for(track_id: &str) -> f64 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let hash = track_id
        .bytes()
        .fold(OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(PRIME));
    f64::from(hash % 360)
}
