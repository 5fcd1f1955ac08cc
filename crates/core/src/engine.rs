//! The `Engine` trait implemented by each background animation.
//!
//! The trait is object-safe so the scene can hold `Box<dyn Engine>` or an
//! enum of engines and switch between them at runtime.

use serde_json::Value;

use crate::color::Rgba;
use crate::frame::{FrameInput, Viewport};
use crate::profile::RenderProfile;
use crate::surface::Surface;

/// A stateful animation advanced once per display frame.
///
/// Within a frame the driver calls [`step`](Engine::step) and then
/// [`draw`](Engine::draw); engines mutate their particles in place and must
/// not allocate per frame once warmed up.
pub trait Engine {
    /// Rebuilds size-dependent state for a new viewport.
    fn resize(&mut self, viewport: Viewport, profile: &RenderProfile);

    /// Advances the simulation by one frame.
    fn step(&mut self, frame: &FrameInput<'_>);

    /// Draws the current state. The driver has already faded the surface.
    fn draw(&mut self, surface: &mut dyn Surface, frame: &FrameInput<'_>);

    /// Translucent overlay used to fade the previous frame.
    fn overlay(&self) -> Rgba;

    /// Number of live particles.
    fn particle_count(&self) -> usize;

    /// Current tuning as a JSON object, for diagnostics.
    fn params(&self) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile_for;
    use crate::surface::PixelSurface;
    use serde_json::json;

    /// Minimal engine used to verify trait object safety.
    struct Counter {
        steps: usize,
        area: f64,
    }

    impl Engine for Counter {
        fn resize(&mut self, viewport: Viewport, _profile: &RenderProfile) {
            self.area = viewport.width * viewport.height;
        }

        fn step(&mut self, _frame: &FrameInput<'_>) {
            self.steps += 1;
        }

        fn draw(&mut self, surface: &mut dyn Surface, _frame: &FrameInput<'_>) {
            surface.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::opaque(255, 255, 255));
        }

        fn overlay(&self) -> Rgba {
            Rgba::new(0, 0, 0, 0.2)
        }

        fn particle_count(&self) -> usize {
            0
        }

        fn params(&self) -> Value {
            json!({ "steps": self.steps, "area": self.area })
        }
    }

    #[test]
    fn engine_trait_is_object_safe() {
        let profile = profile_for("/", 800.0, 600.0);
        let mut engine: Box<dyn Engine> = Box::new(Counter {
            steps: 0,
            area: 0.0,
        });
        let viewport = Viewport::new(4.0, 4.0);
        engine.resize(viewport, &profile);
        let frame = FrameInput::new(&profile, viewport, 0.0);
        engine.step(&frame);
        engine.step(&frame);
        assert_eq!(engine.params()["steps"], 2);
        assert_eq!(engine.params()["area"], 16.0);

        let mut surface = PixelSurface::new(4, 4, Rgba::opaque(0, 0, 0)).unwrap();
        engine.draw(&mut surface, &frame);
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
    }
}
