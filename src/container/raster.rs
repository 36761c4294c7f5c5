//! Raster decoding through the `image` crate
//!
//! The decoder fills in the displayable facts (dimensions, color mode,
//! format label, MIME type, bit depth) while the metadata scan supplies the
//! frame count and the EXIF/XMP presence flags. Color mode labels follow
//! the conventional short names ("L" for grayscale, "RGB", "RGBA").

use std::path::Path;

use image::{ColorType, ImageFormat};

use crate::container::DecodedImage;
use crate::error::{InfoError, InfoResult};
use crate::meta::RawMetadata;

/// Decode `data` into pixels and image facts.
///
/// `origin` names the file (or container) in decode errors. The scan of the
/// same bytes rides along in `meta`.
pub(crate) fn decode(data: &[u8], origin: &Path, meta: &RawMetadata) -> InfoResult<DecodedImage> {
    let format =
        image::guess_format(data).map_err(|err| InfoError::decode(origin, err.to_string()))?;
    let pixels = image::load_from_memory_with_format(data, format)
        .map_err(|err| InfoError::decode(origin, err.to_string()))?;
    let color = pixels.color();
    Ok(DecodedImage {
        width: pixels.width(),
        height: pixels.height(),
        mode: mode_label(color).to_string(),
        format: format_label(format),
        mime: Some(format.to_mime_type().to_string()),
        bit_depth: Some(bits_per_channel(color)),
        frame_count: meta.frames.max(1),
        has_legacy_exif: meta.has_exif(),
        has_xmp: meta.has_xmp(),
        pixels,
    })
}

/// Short label for a color layout.
pub(crate) fn mode_label(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;32F",
        ColorType::Rgba32F => "RGBA;32F",
        _ => "?",
    }
}

/// Uppercased format label ("PNG", "JPEG", "WEBP").
fn format_label(format: ImageFormat) -> String {
    format!("{format:?}").to_uppercase()
}

fn bits_per_channel(color: ColorType) -> u8 {
    (color.bits_per_pixel() / u16::from(color.channel_count())) as u8
}
