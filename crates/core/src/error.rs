//! Error types for the ambient background engine.
//!
//! The animation itself is best-effort and almost never fails at runtime;
//! these errors cover construction (bad dimensions, bad configuration),
//! name lookups coming from the outside world, and the I/O edges
//! (persisted state, snapshots, drawing surface acquisition).

use thiserror::Error;

/// Errors produced by engine construction and the engine's I/O edges.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero when creating a surface or grid.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A configuration value cannot be used (e.g. non-positive radius).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A mode name did not match `off`, `flow-field` or `attractor`.
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// The host could not provide a drawing surface.
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Reading or writing persisted state failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A filesystem or encoding failure (snapshots).
    #[error("i/o error: {0}")]
    Io(String),
}
