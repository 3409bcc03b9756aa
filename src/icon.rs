//! Mirrored notification icons.
//!
//! Phones send the app icon as base64; Kodi needs a file path.

use crate::error::{BridgeError, Result};
use base64::engine::general_purpose;
use base64::Engine;
use image::imageops::FilterType;
use image::ImageFormat;
use std::path::Path;

/// Side length of written icons, in pixels.
pub const ICON_SIZE: u32 = 96;

/// Decodes a base64 image and writes it to `path` as a 96x96 JPEG.
///
/// The file is overwritten on every call.
pub fn write_icon(encoded: &str, path: &Path) -> Result<()> {
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| BridgeError::Image(format!("Failed to decode base64 icon: {}", e)))?;

    let img = image::load_from_memory(&bytes)
        .map_err(|e| BridgeError::Image(format!("Failed to decode icon image: {}", e)))?;

    img.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
        .to_rgb8()
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| BridgeError::Image(format!("Failed to write icon {}: {}", path.display(), e)))?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_icon_base64() -> String {
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    let img = ImageBuffer::from_pixel(8, 4, Rgba([200u8, 30, 30, 255]));
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png).unwrap();
    general_purpose::STANDARD.encode(png.into_inner())
}
