#![deny(unsafe_code)]
//! WASM bindings for the ambient background.
//!
//! [`Background`] attaches to a `<canvas>`, restores the persisted mode from
//! `localStorage` and animates through `requestAnimationFrame`. When the
//! canvas has no 2D context the handle still works but draws nothing.

pub mod canvas;
pub mod scheduler;
pub mod storage;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ambient_core::EngineError;
use ambient_scene::{FrameDriver, FrameScheduler, Mode, SceneConfig, StaticHint, TrackHint};
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use crate::canvas::Canvas2dSurface;
use crate::scheduler::{FrameCallback, RafScheduler};
use crate::storage::LocalStore;

type Driver = FrameDriver<Canvas2dSurface, RafScheduler, LocalStore>;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Handle owned by the page for the lifetime of the background.
#[wasm_bindgen]
pub struct Background {
    driver: Rc<RefCell<Driver>>,
    callback: FrameCallback,
    hint: StaticHint,
    canvas: Option<HtmlCanvasElement>,
}

#[wasm_bindgen]
impl Background {
    /// Attaches to the canvas with id `canvas_id` and starts animating.
    ///
    /// `config_json` may be empty or a JSON object of scene settings.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, route: &str, config_json: &str) -> Result<Background, JsValue> {
        let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
        let config = if config_json.trim().is_empty() {
            SceneConfig::default()
        } else {
            SceneConfig::from_json_str(config_json).map_err(js_err)?
        };

        let canvas = find_canvas(&window, canvas_id);
        let (width, height) = window_size(&window);
        let surface = match &canvas {
            Some(c) => {
                c.set_width(width as u32);
                c.set_height(height as u32);
                context_2d(c).map(|ctx| Canvas2dSurface::new(ctx, width, height))
            }
            None => Err(EngineError::SurfaceUnavailable(format!("no canvas #{canvas_id}"))),
        };

        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let scheduler = RafScheduler::new(window.clone(), Rc::clone(&callback));
        let hint = StaticHint::default();
        let driver = FrameDriver::new(surface, scheduler, LocalStore::new(), config)
            .map_err(js_err)?
            .with_hint_source(Box::new(hint.clone()))
            .with_route(route);
        let driver = Rc::new(RefCell::new(driver));

        let weak_driver: Weak<RefCell<Driver>> = Rc::downgrade(&driver);
        let weak_callback = Rc::downgrade(&callback);
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |time_ms: f64| {
            let Some(driver) = weak_driver.upgrade() else {
                return;
            };
            let delivered = deliver(&*driver, |d| {
                d.on_frame(time_ms);
            });
            if !delivered {
                // The driver keeps its pending handle, so the loop only
                // continues if this callback asks for another frame.
                debug!(time_ms, "frame driver busy, retrying next frame");
                if let Some(slot) = weak_callback.upgrade() {
                    RafScheduler::new(window.clone(), slot).request_frame();
                }
            }
        }) as Box<dyn FnMut(f64)>));

        driver.borrow_mut().start().map_err(js_err)?;

        Ok(Background {
            driver,
            callback,
            hint,
            canvas,
        })
    }

    #[wasm_bindgen(js_name = setRoute)]
    pub fn set_route(&self, route: &str) {
        self.driver.borrow_mut().set_route(route);
    }

    /// Accepts `off`, `flow-field`, `attractor` and the older `boids` /
    /// `lorenz` names.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode: Mode = mode.parse().map_err(js_err)?;
        self.driver.borrow_mut().set_mode(mode).map_err(js_err)
    }

    pub fn mode(&self) -> String {
        self.driver.borrow().mode().to_string()
    }

    #[wasm_bindgen(js_name = setPaused)]
    pub fn set_paused(&self, paused: bool) {
        self.driver.borrow_mut().set_paused(paused);
    }

    #[wasm_bindgen(js_name = isPaused)]
    pub fn is_paused(&self) -> bool {
        self.driver.borrow().is_paused()
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64, y: f64) {
        self.driver.borrow_mut().on_pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&self) {
        self.driver.borrow_mut().on_pointer_leave();
    }

    /// Resizes the canvas backing store and the simulation.
    pub fn resize(&self, width: f64, height: f64) {
        if let Some(canvas) = &self.canvas {
            canvas.set_width(width.max(0.0) as u32);
            canvas.set_height(height.max(0.0) as u32);
        }
        let mut driver = self.driver.borrow_mut();
        if let Some(surface) = driver.surface_mut() {
            surface.set_size(width, height);
        }
        driver.on_resize(width, height);
    }

    /// Sets the now-playing hint; `fetched_at_ms` is in
    /// `requestAnimationFrame` time.
    #[wasm_bindgen(js_name = setTrack)]
    pub fn set_track(&self, track_id: &str, fetched_at_ms: f64) {
        self.hint.set(TrackHint::new(track_id, fetched_at_ms));
    }

    #[wasm_bindgen(js_name = clearTrack)]
    pub fn clear_track(&self) {
        self.hint.clear();
    }

    /// Stops animating and releases the frame callback.
    pub fn destroy(&self) {
        self.driver.borrow_mut().stop();
        self.callback.borrow_mut().take();
    }
}

/// Runs `frame` against the driver unless something else holds it.
/// Returns `false` when the frame could not be delivered.
fn deliver<D>(driver: &RefCell<D>, frame: impl FnOnce(&mut D)) -> bool {
    match driver.try_borrow_mut() {
        Ok(mut driver) => {
            frame(&mut driver);
            true
        }
        Err(_) => false,
    }
}

fn find_canvas(window: &Window, id: &str) -> Option<HtmlCanvasElement> {
    window
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlCanvasElement>()
        .ok()
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, EngineError> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| EngineError::SurfaceUnavailable("2d context not supported".into()))
}

fn window_size(window: &Window) -> (f64, f64) {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (dim(window.inner_width()), dim(window.inner_height()))
}
