//! Lorenz system integration and trail-carrying particles.
//!
//! The system
//!
//! ```text
//! dx/dt = σ(y − x)
//! dy/dt = x(ρ − z) − y
//! dz/dt = xy − βz
//! ```
//!
//! is advanced with explicit Euler steps. At the classic parameters
//! (σ = 10, ρ = 28, β = 8/3) and a small `dt` trajectories stay on the
//! butterfly-shaped attractor, which fits comfortably in |x|, |y| < 30 and
//! 0 ≤ z < 55.

use std::collections::VecDeque;

use ambient_core::{EngineError, Xorshift64};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Recommended integration step range; larger steps drift off the attractor.
pub const DT_RANGE: (f64, f64) = (0.004, 0.006);

/// Lorenz constants and the integration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub dt: f64,
    /// Euler steps per frame.
    pub substeps: u32,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
            dt: 0.005,
            substeps: 1,
        }
    }
}

impl LorenzParams {
    /// Returns `EngineError::InvalidConfig` when `dt` falls outside
    /// [`DT_RANGE`], `substeps` is zero or a constant is not finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(DT_RANGE.0..=DT_RANGE.1).contains(&self.dt) {
            return Err(EngineError::InvalidConfig(format!(
                "lorenz dt must be within [{}, {}], got {}",
                DT_RANGE.0, DT_RANGE.1, self.dt
            )));
        }
        if self.substeps == 0 {
            return Err(EngineError::InvalidConfig(
                "lorenz substeps must be at least 1".into(),
            ));
        }
        if ![self.sigma, self.rho, self.beta].iter().all(|c| c.is_finite()) {
            return Err(EngineError::InvalidConfig(
                "lorenz constants must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Time derivative at `p`.
    pub fn derivative(&self, p: DVec3) -> DVec3 {
        DVec3::new(
            self.sigma * (p.y - p.x),
            p.x * (self.rho - p.z) - p.y,
            p.x * p.y - self.beta * p.z,
        )
    }

    /// One explicit Euler step of length `dt`.
    pub fn euler_step(&self, p: DVec3) -> DVec3 {
        p + self.derivative(p) * self.dt
    }
}

/// Fixed-capacity FIFO of recent positions, oldest first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<DVec3>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `p`, evicting the oldest point when full.
    pub fn push(&mut self, p: DVec3) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &DVec3> + '_ {
        self.points.iter()
    }

    pub fn head(&self) -> Option<DVec3> {
        self.points.back().copied()
    }
}

/// One trajectory on the attractor.
#[derive(Debug, Clone)]
pub struct AttractorParticle {
    pub pos: DVec3,
    /// Hue offset in degrees, drawn from [10, 70).
    pub hue: f64,
    pub trail: Trail,
}

impl AttractorParticle {
    /// Starts near `(0.1, 0, 0)` with x jittered by up to ±0.05.
    pub fn spawn(rng: &mut Xorshift64, trail_capacity: usize) -> Self {
        Self {
            pos: DVec3::new(0.1 + rng.next_range(-0.05, 0.05), 0.0, 0.0),
            hue: rng.next_range(10.0, 70.0),
            trail: Trail::new(trail_capacity),
        }
    }

    /// Runs `params.substeps` Euler steps, recording each position.
    ///
    /// Returns `false` as soon as the state stops being finite; the caller
    /// is expected to respawn the particle.
    pub fn advance(&mut self, params: &LorenzParams) -> bool {
        for _ in 0..params.substeps {
            self.pos = params.euler_step(self.pos);
            if !self.pos.is_finite() {
                return false;
            }
            self.trail.push(self.pos);
        }
        true
    }
}
