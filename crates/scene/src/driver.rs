//! The frame driver: sole owner of the animation state across frames.
//!
//! Hosts feed it events (pointer, resize, route, mode, pause) and frame
//! callbacks. Exactly one frame is pending with the [`FrameScheduler`] at
//! any time while the animation runs; pausing or switching to
//! [`Mode::Off`] cancels it, and a callback arriving while nothing is
//! pending is ignored.
//!
//! Each frame: fade the surface with the engine's overlay, step the engine
//! (field update, particle update, neighbor rebuild), then draw.

use ambient_core::{
    profile_for, Engine, EngineError, FrameInput, Pointer, RenderProfile, Surface, Viewport,
    Xorshift64,
};
use tracing::{debug, info, warn};

use crate::config::SceneConfig;
use crate::hint::{HintSource, HueTracker, NoHint};
use crate::mode::{Mode, ModeController};
use crate::store::ModeStore;
use crate::EngineKind;

/// Identifier of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Registers and cancels the host's next-frame callback.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler for headless hosts and tests: records requests, never fires
/// on its own.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        self.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
        self.cancelled += 1;
    }
}

/// Latest host input, read by the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    pub route: String,
    pub viewport: Viewport,
    pub pointer: Pointer,
}

/// Drives one background animation.
pub struct FrameDriver<Sf: Surface, Sc: FrameScheduler, St: ModeStore> {
    config: SceneConfig,
    rng: Xorshift64,
    surface: Option<Sf>,
    scheduler: Sc,
    controller: ModeController<St>,
    hint: Box<dyn HintSource>,
    tracker: HueTracker,
    engine: Option<EngineKind>,
    context: FrameContext,
    pending: Option<FrameHandle>,
    frames: u64,
}

impl<Sf: Surface, Sc: FrameScheduler, St: ModeStore> FrameDriver<Sf, Sc, St> {
    /// Creates an idle driver. Nothing is scheduled until [`start`](Self::start).
    ///
    /// A surface that could not be acquired turns the driver into a no-op,
    /// logged once at warn. Returns `EngineError::InvalidConfig` if `config`
    /// does not validate.
    pub fn new(
        surface: Result<Sf, EngineError>,
        scheduler: Sc,
        store: St,
        config: SceneConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let surface = match surface {
            Ok(surface) => Some(surface),
            Err(e) => {
                warn!(error = %e, "no drawing surface, background disabled");
                None
            }
        };
        let seed = config.resolve_seed();
        let viewport = surface
            .as_ref()
            .map(|s| Viewport::new(s.width(), s.height()))
            .unwrap_or_default();
        let tracker = HueTracker::new(
            config.boost_factor,
            config.boost_window_ms,
            config.hint_stale_ms,
        );
        Ok(Self {
            config,
            rng: Xorshift64::new(seed),
            surface,
            scheduler,
            controller: ModeController::new(store),
            hint: Box::new(NoHint),
            tracker,
            engine: None,
            context: FrameContext {
                route: "/".to_string(),
                viewport,
                pointer: Pointer::inactive(),
            },
            pending: None,
            frames: 0,
        })
    }

    /// Replaces the hint source (default: [`NoHint`]).
    pub fn with_hint_source(mut self, source: Box<dyn HintSource>) -> Self {
        self.hint = source;
        self
    }

    /// Sets the initial route before starting.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.context.route = route.into();
        self
    }

    /// Restores the persisted mode and pause flag, builds the engine and
    /// schedules the first frame when animating.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let mode = self.controller.restore();
        self.install_engine(mode)?;
        self.sync_schedule();
        info!(
            mode = %mode,
            paused = self.is_paused(),
            route = %self.context.route,
            "frame driver started"
        );
        Ok(())
    }

    /// Runs one frame at host time `time_ms`.
    ///
    /// Returns `false` without touching any state when no frame was pending.
    pub fn on_frame(&mut self, time_ms: f64) -> bool {
        if self.pending.take().is_none() {
            return false;
        }
        let (Some(surface), Some(engine)) = (self.surface.as_mut(), self.engine.as_mut()) else {
            return false;
        };

        let profile = profile_for(
            &self.context.route,
            self.context.viewport.width,
            self.context.viewport.height,
        );
        let hint = self.hint.current_hint();
        let effect = self.tracker.observe(hint.as_ref(), time_ms);

        let mut frame = FrameInput::new(&profile, self.context.viewport, time_ms)
            .with_pointer(self.context.pointer);
        frame.speed_boost = effect.speed_boost;
        frame.hue = effect.hue;

        surface.fade(engine.overlay());
        engine.step(&frame);
        engine.draw(surface, &frame);
        self.frames += 1;

        self.pending = Some(self.scheduler.request_frame());
        true
    }

    /// Pauses and persists the flag. The pending frame is cancelled.
    pub fn pause(&mut self) {
        self.set_paused(true);
    }

    /// Resumes and persists the flag. A frame is scheduled if animating.
    pub fn resume(&mut self) {
        self.set_paused(false);
    }

    pub fn set_paused(&mut self, paused: bool) {
        if let Err(e) = self.controller.set_paused(paused) {
            warn!(error = %e, "failed to persist pause flag");
        }
        info!(paused, "pause toggled");
        self.sync_schedule();
    }

    /// Switches mode, persisting it. Entering the attractor starts a fresh
    /// set of trajectories; entering `Off` cancels the pending frame.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), EngineError> {
        let running = self.engine.as_ref().map_or(Mode::Off, EngineKind::mode);
        if mode == self.mode() && mode == running {
            return Ok(());
        }
        if let Err(e) = self.controller.set_mode(mode) {
            warn!(error = %e, "failed to persist mode");
        }
        self.install_engine(mode)?;
        self.sync_schedule();
        info!(mode = %mode, "mode changed");
        Ok(())
    }

    /// Updates the route; the next frame resolves its profile.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.context.route = route.into();
        debug!(route = %self.context.route, "route changed");
    }

    /// Records the new viewport and rebuilds size-dependent engine state.
    pub fn on_resize(&mut self, width: f64, height: f64) {
        let viewport = Viewport::new(width, height);
        self.context.viewport = viewport;
        let profile = self.current_profile_for(viewport);
        if let Some(engine) = self.engine.as_mut() {
            engine.resize(viewport, &profile);
        }
        debug!(width, height, "viewport resized");
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.context.pointer = Pointer::at(x, y);
    }

    pub fn on_pointer_leave(&mut self) {
        self.context.pointer.active = false;
    }

    /// Cancels the pending frame and drops the engine.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.engine = None;
        info!("frame driver stopped");
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    /// Profile for the current route and viewport.
    pub fn profile(&self) -> RenderProfile {
        self.current_profile_for(self.context.viewport)
    }

    pub fn context(&self) -> &FrameContext {
        &self.context
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn engine(&self) -> Option<&EngineKind> {
        self.engine.as_ref()
    }

    pub fn surface(&self) -> Option<&Sf> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut Sf> {
        self.surface.as_mut()
    }

    pub fn into_surface(self) -> Option<Sf> {
        self.surface
    }

    pub fn scheduler(&self) -> &Sc {
        &self.scheduler
    }

    pub fn store(&self) -> &St {
        self.controller.store()
    }

    /// The frame currently registered with the scheduler.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    fn current_profile_for(&self, viewport: Viewport) -> RenderProfile {
        profile_for(&self.context.route, viewport.width, viewport.height)
    }

    fn install_engine(&mut self, mode: Mode) -> Result<(), EngineError> {
        let seed = self.rng.next_u64();
        self.engine = EngineKind::for_mode(mode, seed, &self.config)?;
        let viewport = self.context.viewport;
        let profile = self.current_profile_for(viewport);
        if let Some(engine) = self.engine.as_mut() {
            engine.resize(viewport, &profile);
        }
        Ok(())
    }

    /// Brings the scheduler in line with the current state: one pending
    /// frame while animating, none otherwise.
    fn sync_schedule(&mut self) {
        let animating = self.surface.is_some() && self.engine.is_some() && !self.is_paused();
        if animating {
            if self.pending.is_none() {
                self.pending = Some(self.scheduler.request_frame());
            }
        } else {
            self.cancel_pending();
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::{StaticHint, TrackHint};
    use crate::mode::MODE_KEY;
    use crate::store::MemoryStore;
    use ambient_core::{PixelSurface, Rgba};

    type TestDriver = FrameDriver<PixelSurface, ManualScheduler, MemoryStore>;

    fn config() -> SceneConfig {
        SceneConfig {
            seed: Some(42),
            ..SceneConfig::default()
        }
    }

    fn driver_with(store: MemoryStore) -> TestDriver {
        let surface = PixelSurface::new(320, 240, Rgba::opaque(0, 0, 0)).unwrap();
        FrameDriver::new(Ok(surface), ManualScheduler::new(), store, config()).unwrap()
    }

    #[test]
    fn nothing_is_scheduled_before_start() {
        let driver = driver_with(MemoryStore::new());
        assert!(driver.pending_frame().is_none());
        assert_eq!(driver.scheduler().requested(), 0);
    }

    #[test]
    fn start_schedules_exactly_one_frame() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        assert_eq!(driver.mode(), Mode::FlowField);
        assert!(driver.pending_frame().is_some());
        assert_eq!(driver.scheduler().requested(), 1);
    }

    #[test]
    fn frames_reschedule_themselves() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        for i in 0..5 {
            assert!(driver.on_frame(i as f64 * 16.0));
        }
        assert_eq!(driver.frames_rendered(), 5);
        assert_eq!(driver.scheduler().requested(), 6);
        assert_eq!(driver.pending_frame(), driver.scheduler().pending());
    }

    #[test]
    fn unsolicited_frame_is_ignored() {
        let mut driver = driver_with(MemoryStore::new());
        assert!(!driver.on_frame(0.0));
        driver.start().unwrap();
        driver.pause();
        assert!(!driver.on_frame(16.0));
        assert_eq!(driver.frames_rendered(), 0);
    }

    #[test]
    fn pause_cancels_and_resume_reschedules() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        driver.pause();
        assert!(driver.pending_frame().is_none());
        assert_eq!(driver.scheduler().cancelled(), 1);
        driver.resume();
        assert!(driver.pending_frame().is_some());
        driver.resume();
        assert_eq!(driver.scheduler().requested(), 2, "resume is idempotent");
    }

    #[test]
    fn off_mode_cancels_frames() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        driver.set_mode(Mode::Off).unwrap();
        assert!(driver.engine().is_none());
        assert!(driver.pending_frame().is_none());
        driver.set_mode(Mode::FlowField).unwrap();
        assert!(driver.pending_frame().is_some());
    }

    #[test]
    fn entering_attractor_reseeds() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        driver.set_mode(Mode::Attractor).unwrap();
        for i in 0..40 {
            driver.on_frame(i as f64 * 16.0);
        }
        let grown = driver.engine().map(|e| e.particle_count()).unwrap();
        assert!(grown > 0);
        driver.set_mode(Mode::FlowField).unwrap();
        driver.set_mode(Mode::Attractor).unwrap();
        assert_eq!(driver.engine().map(|e| e.particle_count()), Some(0));
    }

    #[test]
    fn restores_persisted_mode_on_start() {
        let mut driver = driver_with(MemoryStore::with_entry(MODE_KEY, "lorenz"));
        assert_eq!(driver.mode(), Mode::FlowField);
        driver.start().unwrap();
        assert_eq!(driver.mode(), Mode::Attractor);
        assert_eq!(driver.engine().map(EngineKind::mode), Some(Mode::Attractor));
    }

    #[test]
    fn missing_surface_is_a_no_op() {
        let missing = Err(EngineError::SurfaceUnavailable("headless".into()));
        let mut driver: TestDriver =
            FrameDriver::new(missing, ManualScheduler::new(), MemoryStore::new(), config())
                .unwrap();
        driver.start().unwrap();
        assert!(driver.pending_frame().is_none());
        assert!(!driver.on_frame(0.0));
        driver.on_resize(100.0, 100.0);
        driver.on_pointer_move(1.0, 1.0);
        assert_eq!(driver.frames_rendered(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = SceneConfig {
            dt: 1.0,
            ..config()
        };
        let surface = PixelSurface::new(4, 4, Rgba::opaque(0, 0, 0)).unwrap();
        let result: Result<TestDriver, _> =
            FrameDriver::new(Ok(surface), ManualScheduler::new(), MemoryStore::new(), bad);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn resize_rebuilds_particles_for_new_tier() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        assert_eq!(driver.engine().map(|e| e.particle_count()), Some(600));
        driver.on_resize(1280.0, 800.0);
        assert_eq!(driver.engine().map(|e| e.particle_count()), Some(1500));
    }

    #[test]
    fn resize_then_frame_keeps_the_resized_population() {
        let mut driver = driver_with(MemoryStore::new()).with_route("/resume");
        driver.start().unwrap();
        driver.on_resize(800.0, 1000.0);
        assert_eq!(driver.engine().map(|e| e.particle_count()), Some(1000));
        assert!(driver.on_frame(0.0));
        assert_eq!(driver.engine().map(|e| e.particle_count()), Some(1000));
        assert_eq!(driver.profile().route, "/resume");
    }

    #[test]
    fn pointer_and_route_land_in_context() {
        let mut driver = driver_with(MemoryStore::new());
        driver.set_route("/projects/x");
        driver.on_pointer_move(10.0, 20.0);
        assert!(driver.context().pointer.active);
        driver.on_pointer_leave();
        assert!(!driver.context().pointer.active);
        assert_eq!(driver.profile().route, "/projects");
    }

    #[test]
    fn hint_source_is_consulted() {
        let hint = StaticHint::new(Some(TrackHint::new("song", 0.0)));
        let mut driver = driver_with(MemoryStore::new()).with_hint_source(Box::new(hint.clone()));
        driver.start().unwrap();
        assert!(driver.on_frame(0.0));
        hint.clear();
        assert!(driver.on_frame(16.0));
    }

    #[test]
    fn frames_draw_onto_the_surface() {
        let mut driver = driver_with(MemoryStore::new());
        driver.start().unwrap();
        driver.on_frame(0.0);
        let surface = driver.into_surface().unwrap();
        assert!(surface.count_differing([0, 0, 0]) > 0);
    }
}
