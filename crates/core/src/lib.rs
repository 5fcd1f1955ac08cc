#![deny(unsafe_code)]
//! Core types for the ambient background engine.
//!
//! Provides the `Engine` trait, seeded `SimplexNoise`, the `Xorshift64`
//! PRNG, `Rgba` colors, route/device `RenderProfile` lookup, the `Surface`
//! drawing trait with a CPU `PixelSurface`, and per-frame input types.

pub mod color;
pub mod engine;
pub mod error;
pub mod frame;
pub mod noise;
pub mod prng;
pub mod profile;
pub mod surface;

pub use color::Rgba;
pub use engine::Engine;
pub use error::EngineError;
pub use frame::{FrameInput, Pointer, Viewport};
pub use noise::SimplexNoise;
pub use prng::Xorshift64;
pub use profile::{profile_for, ColorScheme, DeviceClass, PointerMode, RenderProfile};
pub use surface::{PixelSurface, Surface};
