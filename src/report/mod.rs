//! Report assembly: scalar header, image facts, scheme extractors.
//!
//! [`build_report`] is the one entry point. It renders the scalar fields
//! the scanners collected, appends basic facts about the decoded pixels,
//! then runs the six extractors in a fixed order and joins every
//! non-empty section with a blank line. Extractors contain their own
//! failures; a corrupt metadata block costs its section, never the
//! report.

pub mod exif;
pub mod exiftool;
pub mod icc;
pub mod iptc;
pub mod psd;
pub mod tags;
pub mod text;
pub mod xmp;

use std::collections::HashSet;
use std::path::Path;

use ::exif::{Context, Tag};

use crate::container::DecodedImage;
use crate::meta::RawMetadata;
use crate::report::text::{decode_ansi, try_decode, Encoding};
use crate::types::MetaValue;

/// Fields kept out of the header block: `dpi` and `jfif` duplicate
/// friendlier fields, `transparency` is raw chunk data.
const SKIPPED_FIELDS: [&str; 3] = ["dpi", "jfif", "transparency"];

/// Inputs for one report. Borrowed, request-scoped, never mutated.
pub struct ReportRequest<'a> {
    pub image: Option<&'a DecodedImage>,
    pub meta: &'a RawMetadata,
    pub path: &'a Path,
}

/// Build the full diagnostic text for one loaded image.
///
/// Blocking and potentially expensive: walks every pixel for the color
/// count and shells out to `exiftool` when it is installed. Callers
/// should recompute only when the displayed entry changes.
pub fn build_report(request: &ReportRequest<'_>) -> String {
    let mut msg = String::new();
    for (key, value) in &request.meta.fields {
        if SKIPPED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        msg.push('\n');
        msg.push_str(key);
        msg.push_str(": ");
        msg.push_str(&humanize(key, value));
    }
    if !request.meta.tiff_tags.is_empty() {
        msg.push_str("\ntag_v2: ");
        msg.push_str(&tiff_directory(&request.meta.tiff_tags));
    }

    let Some(image) = request.image else {
        return msg.replace('\0', "\\0");
    };

    msg.push_str(&format!("\nFormat: {}", image.format));
    if let Some(mime) = &image.mime {
        msg.push_str(&format!("\nMIME type: {mime}"));
    }
    if let Some(bits) = image.bit_depth {
        msg.push_str(&format!("\nBit Depth: {bits}"));
    }
    let pixels = u64::from(image.width) * u64::from(image.height);
    msg.push_str(&format!("\nColor Type: {}", image.mode));
    msg.push_str(&format!("\nColors: {}", thousands(distinct_colors(image))));
    msg.push_str(&format!("\nPixels: {}", thousands(pixels)));

    let sections = [
        exif::extract(request.meta),
        icc::extract(request.meta),
        iptc::extract(request.meta),
        xmp::extract(request.meta),
        psd::extract(request.meta),
        exiftool::extract(request.path),
    ];
    for section in sections {
        if !section.is_empty() {
            msg.push_str("\n\n");
            msg.push_str(&section);
        }
    }
    // A text widget must never see a raw NUL.
    msg.replace('\0', "\\0")
}

/// Per-field display tweaks for the header block.
fn humanize(key: &str, value: &MetaValue) -> String {
    match key {
        "adobe" => format!("DCT v{value}"),
        "adobe_transform" => match value.as_int() {
            Some(1) => "YCbCr".to_string(),
            _ => value.to_string(),
        },
        "comment" => match value.as_bytes() {
            Some(bytes) => comment_text(bytes),
            None => value.to_string(),
        },
        "jfif_unit" => match value.as_int() {
            Some(0) => "none".to_string(),
            Some(1) => "inch".to_string(),
            Some(2) => "cm".to_string(),
            _ => value.to_string(),
        },
        "jfif_version" => match value {
            MetaValue::Pair(major, minor) => format!("{major}.0{minor}"),
            _ => value.to_string(),
        },
        "loop" => match value.as_int() {
            Some(0) => "infinite".to_string(),
            _ => value.to_string(),
        },
        _ => value.to_string(),
    }
}

/// JPEG comments are usually UTF-8; some writers store UTF-16BE.
fn comment_text(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    match try_decode(bytes, Encoding::Utf16Be) {
        Some(text) => text,
        None => decode_ansi(bytes),
    }
}

/// Render collected IFD tags as a `{name: value, ...}` mapping, with
/// standard tag numbers resolved to their names.
fn tiff_directory(tags: &[(u16, String)]) -> String {
    let entries: Vec<String> = tags
        .iter()
        .map(|(code, value)| {
            let tag = Tag(Context::Tiff, *code);
            if tag.description().is_some() {
                format!("{tag}: {value}")
            } else {
                format!("{code}: {value}")
            }
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Count distinct pixel values without converting the image.
fn distinct_colors(image: &DecodedImage) -> u64 {
    let stride = image.pixels.color().bytes_per_pixel() as usize;
    if stride == 0 {
        return 0;
    }
    let mut seen = HashSet::new();
    for pixel in image.pixels.as_bytes().chunks_exact(stride) {
        seen.insert(pixel);
    }
    seen.len() as u64
}

/// Group digits by thousands, `1234567` -> `1,234,567`.
pub(crate) fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
