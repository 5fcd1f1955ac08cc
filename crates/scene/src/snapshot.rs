//! PNG export of a [`PixelSurface`].
//!
//! Feature-gated behind `png` (default on) so browser builds do not pull in
//! the `image` crate.

use std::path::Path;

use ambient_core::{EngineError, PixelSurface};

/// Writes the surface as an 8-bit RGBA PNG.
///
/// Returns `EngineError::InvalidDimensions` if the surface dimensions
/// overflow `u32`, or `EngineError::Io` on write failure.
pub fn write_png(surface: &PixelSurface, path: &Path) -> Result<(), EngineError> {
    let w = u32::try_from(surface.pixel_width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(surface.pixel_height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, surface.as_rgba().to_vec())
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))
}
