//! Photoshop resource report section.
//!
//! Resource payloads are mostly binary, so the byte-string form gets
//! cleaned up for display: runs of hex escapes collapse to a space, and
//! values that turn out to be pure filler are re-read as integers when
//! short enough. Everything is capped at 200 characters.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::meta::RawMetadata;
use crate::report::tags::psd_resource_name;
use crate::types::bytes_repr;

/// Two or more consecutive hex escapes collapse to one space.
static HEX_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\x[0-9a-f]{2}){2,}").expect("valid regex"));

/// A byte-string form that is only whitespace once cleaned.
static BLANK_REPR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^b"\s+""#).expect("valid regex"));

const MAX_RENDERED: usize = 200;

pub(crate) fn extract(meta: &RawMetadata) -> String {
    if meta.photoshop.is_empty() {
        return String::new();
    }
    let mut s = "Photoshop:".to_string();
    let mut seen: Vec<u16> = Vec::new();
    for (id, data) in &meta.photoshop {
        // First occurrence wins for duplicate resource IDs.
        if seen.contains(id) {
            continue;
        }
        seen.push(*id);

        let name = match psd_resource_name(*id) {
            Some(name) => name.to_string(),
            None => id.to_string(),
        };
        let repr = bytes_repr(data);
        let cleaned = HEX_RUN.replace_all(&repr, " ").replace("\\\\0", "");
        let rendered = if cleaned.is_empty() || BLANK_REPR.is_match(&cleaned) {
            // Often binary data like version numbers.
            if data.len() < 5 {
                be_int(data).to_string()
            } else {
                truncate(&repr)
            }
        } else {
            truncate(&cleaned)
        };
        s.push_str(&format!("\n{name}: {rendered}"));
    }
    s
}

fn truncate(s: &str) -> String {
    if s.chars().count() > MAX_RENDERED {
        let head: String = s.chars().take(MAX_RENDERED).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn be_int(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, &b| acc << 8 | b as u64)
}
