//! `requestAnimationFrame` scheduling.

use std::cell::RefCell;
use std::rc::Rc;

use ambient_scene::{FrameHandle, FrameScheduler};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// Slot holding the per-frame callback. Filled once the driver exists.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Schedules the shared frame callback with the browser.
pub struct RafScheduler {
    window: Window,
    callback: FrameCallback,
}

impl RafScheduler {
    pub fn new(window: Window, callback: FrameCallback) -> Self {
        Self { window, callback }
    }
}

impl FrameScheduler for RafScheduler {
    /// Handle 0 means the request could not be registered; cancelling it is
    /// harmless.
    fn request_frame(&mut self) -> FrameHandle {
        let slot = self.callback.borrow();
        let Some(cb) = slot.as_ref() else {
            return FrameHandle(0);
        };
        match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => FrameHandle(u64::from(id as u32)),
            Err(_) => FrameHandle(0),
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if handle.0 != 0 {
            let _ = self.window.cancel_animation_frame(handle.0 as u32 as i32);
        }
    }
}
