//! ICC profile report section.
//!
//! The 128-byte profile header carries the rendering intent at offset 64.
//! The tag table follows: a count and 12-byte entries of signature, offset
//! and size. Strings come in three shapes: `text` (NUL-terminated ASCII),
//! `desc` (counted ASCII) and `mluc` (UTF-16BE records).

use log::debug;

use crate::meta::{be_u32, RawMetadata};
use crate::report::tags::RENDERING_INTENT;
use crate::report::text::{try_decode, Encoding};

const HEADER_SIZE: usize = 128;
const INTENT_OFFSET: usize = 64;

/// Tag tables beyond this are taken as corruption.
const MAX_TAGS: usize = 1024;

pub(crate) fn extract(meta: &RawMetadata) -> String {
    let Some(profile) = meta.icc_profile.as_deref() else {
        return String::new();
    };
    if profile.is_empty() {
        return String::new();
    }
    match report(profile) {
        Some(report) => report,
        None => {
            debug!("unreadable ICC profile");
            String::new()
        }
    }
}

fn report(profile: &[u8]) -> Option<String> {
    if profile.len() < HEADER_SIZE {
        return None;
    }
    let intent = be_u32(profile, INTENT_OFFSET)? as usize;
    let tags = tag_table(profile)?;

    let copyright = tag_string(profile, &tags, *b"cprt").unwrap_or_default();
    let description = tag_string(profile, &tags, *b"desc").unwrap_or_default();
    let manufacturer = tag_string(profile, &tags, *b"dmnd").unwrap_or_default();
    let model = tag_string(profile, &tags, *b"dmdd").unwrap_or_default();

    let intent_label = match RENDERING_INTENT.get(intent) {
        Some(label) => (*label).to_string(),
        None => intent.to_string(),
    };
    let mut s = format!(
        "ICC Profile:\nCopyright: {}\nDescription: {}\nIntent: {}\nisIntentSupported: {}",
        copyright.trim(),
        description.trim(),
        intent_label,
        intent < RENDERING_INTENT.len(),
    );
    let manufacturer = manufacturer.trim();
    if !manufacturer.is_empty() {
        s.push_str(&format!("\nManufacturer: {manufacturer}"));
    }
    let model = model.trim();
    if !model.is_empty() {
        s.push_str(&format!("\nModel: {model}"));
    }
    Some(s)
}

fn tag_table(profile: &[u8]) -> Option<Vec<([u8; 4], usize, usize)>> {
    let count = be_u32(profile, HEADER_SIZE)? as usize;
    if count > MAX_TAGS {
        return None;
    }
    let mut tags = Vec::with_capacity(count);
    for i in 0..count {
        let at = HEADER_SIZE + 4 + i * 12;
        let sig = profile.get(at..at + 4)?;
        let offset = be_u32(profile, at + 4)? as usize;
        let size = be_u32(profile, at + 8)? as usize;
        tags.push(([sig[0], sig[1], sig[2], sig[3]], offset, size));
    }
    Some(tags)
}

fn tag_string(
    profile: &[u8],
    tags: &[([u8; 4], usize, usize)],
    want: [u8; 4],
) -> Option<String> {
    let &(_, offset, size) = tags.iter().find(|(sig, _, _)| *sig == want)?;
    let data = profile.get(offset..offset + size)?;
    render_tag(data)
}

fn render_tag(data: &[u8]) -> Option<String> {
    let sig: [u8; 4] = data.get(..4)?.try_into().ok()?;
    match &sig {
        b"text" => {
            let body = data.get(8..)?;
            let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
            Some(String::from_utf8_lossy(&body[..end]).into_owned())
        }
        b"desc" => {
            let count = be_u32(data, 8)? as usize;
            let body = data.get(12..12 + count)?;
            Some(
                String::from_utf8_lossy(body)
                    .trim_end_matches('\0')
                    .to_string(),
            )
        }
        b"mluc" => {
            // First record only; offsets are relative to the tag start.
            let count = be_u32(data, 8)?;
            if count == 0 {
                return Some(String::new());
            }
            let len = be_u32(data, 20)? as usize;
            let offset = be_u32(data, 24)? as usize;
            let body = data.get(offset..offset + len)?;
            try_decode(body, Encoding::Utf16Be)
        }
        _ => None,
    }
}
