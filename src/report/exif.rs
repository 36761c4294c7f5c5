//! EXIF report section.
//!
//! Renders the primary-image fields of the embedded EXIF blob as
//! `Name: value` lines under a byte-order header. A handful of tags get
//! human labels instead of their raw numbers; unknown tags are reported
//! with their numeric code rather than dropped.

use exif::{Field, In, Value};
use log::debug;

use crate::meta::RawMetadata;
use crate::report::tags::{exif_extra_tag_name, RENDERING_INTENT};
use crate::report::text::{decode_tagged, Encoding};

const EXIF_HEADER: &[u8] = b"Exif\0\x00";

const ORIENTATION: [&str; 8] = [
    "normal",
    "flip left right",
    "rotate 180",
    "flip top bottom",
    "transpose",
    "rotate 90",
    "transverse",
    "rotate 270",
];

const COMPONENT_LETTERS: [&str; 7] = ["-", "Y", "Cb", "Cr", "R", "G", "B"];

pub(crate) fn extract(meta: &RawMetadata) -> String {
    let Some(blob) = meta.exif.as_deref() else {
        return String::new();
    };
    if blob.is_empty() {
        return String::new();
    }
    // The byte-order mark sits at offset 6 when the JPEG-style prefix is
    // present and at 0 when the blob is bare TIFF; probe the whole head.
    let head = &blob[..blob.len().min(8)];
    let big = head.windows(2).any(|w| w == b"MM");

    let tiff = blob.strip_prefix(EXIF_HEADER).unwrap_or(blob);
    let parsed = match exif::Reader::new().read_raw(tiff.to_vec()) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("EXIF parse failed: {err}");
            return String::new();
        }
    };
    let fields: Vec<&Field> = parsed
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .collect();
    if fields.is_empty() {
        return String::new();
    }

    let mut s = format!(
        "EXIF:\nByte order: {}-endian",
        if big { "big" } else { "little" }
    );
    for field in fields {
        let code = field.tag.number();
        let known = exif_extra_tag_name(code).is_some() || field.tag.description().is_some();
        if !known {
            s.push_str(&format!(
                "\nUnknown EXIF tag {code}: {}",
                render_value(field, big)
            ));
            continue;
        }
        let name = match exif_extra_tag_name(code) {
            Some(name) => name.to_string(),
            None => field.tag.to_string(),
        };
        s.push_str(&format!("\n{name}: {}", interpret(code, field, big)));
    }
    s
}

/// Field-specific value presentation; anything unmatched renders raw.
fn interpret(code: u16, field: &Field, big: bool) -> String {
    let value = &field.value;
    match code {
        // ColorSpace
        40961 => match value.get_uint(0) {
            Some(1) => "sRGB".to_string(),
            Some(65535) => "uncalibrated".to_string(),
            _ => render_value(field, big),
        },
        // ComponentsConfiguration
        37121 => components(value).unwrap_or_else(|| render_value(field, big)),
        // Orientation
        274 => match value.get_uint(0) {
            Some(n @ 1..=8) => ORIENTATION[n as usize - 1].to_string(),
            _ => render_value(field, big),
        },
        // Rendering intent arrives as an integer packed in a byte payload.
        771 => bytes_of(value)
            .and_then(|b| int_from_bytes(b, big))
            .and_then(|n| RENDERING_INTENT.get(n as usize).copied())
            .map(str::to_string)
            .unwrap_or_else(|| render_value(field, big)),
        // ResolutionUnit
        296 => match value.get_uint(0) {
            Some(2) => "inch".to_string(),
            Some(3) => "cm".to_string(),
            _ => render_value(field, big),
        },
        // SceneCaptureType
        41990 => match value.get_uint(0) {
            Some(0) => "standard".to_string(),
            Some(1) => "landscape".to_string(),
            Some(2) => "portrait".to_string(),
            Some(3) => "night scene".to_string(),
            _ => render_value(field, big),
        },
        // YCbCrPositioning
        531 => match value.get_uint(0) {
            Some(1) => "centered".to_string(),
            Some(2) => "co-sited".to_string(),
            _ => render_value(field, big),
        },
        _ => render_value(field, big),
    }
}

fn render_value(field: &Field, big: bool) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Byte(b) => byte_value(b, big),
        Value::Undefined(b, _) => byte_value(b, big),
        Value::Short(v) => join_group(v),
        Value::Long(v) => join_group(v),
        Value::SShort(v) => join_group(v),
        Value::SLong(v) => join_group(v),
        Value::Float(v) => join_group(v),
        Value::Double(v) => join_group(v),
        Value::Rational(v) => {
            let parts: Vec<String> = v
                .iter()
                .map(|r| {
                    if r.denom == 1 {
                        r.num.to_string()
                    } else {
                        format!("{}/{}", r.num, r.denom)
                    }
                })
                .collect();
            group(parts)
        }
        Value::SRational(v) => {
            let parts: Vec<String> = v
                .iter()
                .map(|r| {
                    if r.denom == 1 {
                        r.num.to_string()
                    } else {
                        format!("{}/{}", r.num, r.denom)
                    }
                })
                .collect();
            group(parts)
        }
        _ => field.display_value().to_string(),
    }
}

/// Short byte payloads are integers; longer ones are text in the file's
/// byte order.
fn byte_value(b: &[u8], big: bool) -> String {
    if b.len() < 5 {
        return int_from_bytes(b, big)
            .map(|n| n.to_string())
            .unwrap_or_default();
    }
    let encoding = if big {
        Encoding::Utf16Be
    } else {
        Encoding::Utf16Le
    };
    decode_tagged(b, encoding)
}

fn int_from_bytes(b: &[u8], big: bool) -> Option<u64> {
    if b.len() > 8 {
        return None;
    }
    let mut n = 0u64;
    if big {
        for &x in b {
            n = n << 8 | x as u64;
        }
    } else {
        for &x in b.iter().rev() {
            n = n << 8 | x as u64;
        }
    }
    Some(n)
}

fn components(value: &Value) -> Option<String> {
    let bytes = bytes_of(value)?;
    let mut out = String::new();
    for &b in bytes {
        out.push_str(COMPONENT_LETTERS.get(b as usize)?);
    }
    Some(out)
}

fn bytes_of(value: &Value) -> Option<&[u8]> {
    match value {
        Value::Byte(b) | Value::Undefined(b, _) => Some(b),
        _ => None,
    }
}

fn join_group<T: std::fmt::Display>(values: &[T]) -> String {
    group(values.iter().map(T::to_string).collect())
}

fn group(parts: Vec<String>) -> String {
    match parts.len() {
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => format!("({})", parts.join(", ")),
    }
}
