//! IPTC/IIM report section.
//!
//! Datasets come either from a dedicated IPTC-NAA blob (TIFF tag 33723)
//! or from Photoshop resource 1028. Repeated datasets (keywords, creator
//! names) group into lists; values stay in byte-string form since IIM
//! predates any mandatory text encoding.

use crate::meta::{irb, RawMetadata};
use crate::report::tags::{iim_name, IRB_IPTC_NAA};
use crate::types::bytes_repr;

/// ISO 2022 escape sequence announcing UTF-8 text.
const UTF8_ESCAPE: &[u8] = b"\x1b%G";

pub(crate) fn extract(meta: &RawMetadata) -> String {
    let source = meta
        .iptc
        .as_deref()
        .or_else(|| meta.photoshop_resource(IRB_IPTC_NAA));
    let Some(data) = source else {
        return String::new();
    };
    let datasets = irb::parse_iim(data);
    if datasets.is_empty() {
        return String::new();
    }

    // Group repeats under their first-seen key, keeping stream order.
    let mut grouped: Vec<((u8, u8), Vec<Vec<u8>>)> = Vec::new();
    for (key, value) in datasets {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }

    let mut s = "IPTC:".to_string();
    for (key, values) in grouped {
        match key {
            (1, 90) => {
                let labels: Vec<String> = values.iter().map(|v| charset_label(v)).collect();
                s.push_str(&format!(
                    "\nCoded Character Set: [{}]",
                    labels.join(", ")
                ));
            }
            (2, 0) => {
                let version = values.first().map(|v| le_int(v)).unwrap_or(0);
                s.push_str(&format!("\nApplication Record Version: {version}"));
            }
            _ => {
                let name = match iim_name(key.0, key.1) {
                    Some(name) => name.to_string(),
                    None => format!("({}, {})", key.0, key.1),
                };
                s.push_str(&format!("\n{name}: {}", render_values(&values)));
            }
        }
    }
    s
}

fn charset_label(value: &[u8]) -> String {
    if value == UTF8_ESCAPE {
        "\"UTF8\"".to_string()
    } else {
        bytes_repr(value)
    }
}

fn render_values(values: &[Vec<u8>]) -> String {
    match values {
        [single] => bytes_repr(single),
        _ => {
            let parts: Vec<String> = values.iter().map(|v| bytes_repr(v)).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

fn le_int(bytes: &[u8]) -> u64 {
    let slice = &bytes[..bytes.len().min(8)];
    slice
        .iter()
        .rev()
        .fold(0u64, |acc, &b| acc << 8 | b as u64)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dataset(record: u8, ds: u8, value: &[u8]) -> Vec<u8> {
        let mut block = vec![0x1C, record, ds];
        block.extend_from_slice(&(value.len() as u16).to_be_bytes());
        block.extend_from_slice(value);
        block
    }

    #[test]
    fn keywords_group_into_a_list() {
        // Record version is read little-endian.
        let mut stream = dataset(2, 0, &[4, 0]);
        stream.extend(dataset(2, 25, b"sunset"));
        stream.extend(dataset(2, 25, b"beach"));
        stream.extend(dataset(2, 5, b"Holiday"));

        let meta = RawMetadata {
            iptc: Some(stream),
            ..RawMetadata::default()
        };
        assert_eq!(
            extract(&meta),
            "IPTC:\n\
             Application Record Version: 4\n\
             keywords: [b\"sunset\", b\"beach\"]\n\
             title: b\"Holiday\""
        );
    }

    #[test]
    fn coded_character_set_maps_utf8_escape() {
        let stream = dataset(1, 90, b"\x1b%G");
        let meta = RawMetadata {
            iptc: Some(stream),
            ..RawMetadata::default()
        };
        assert_eq!(extract(&meta), "IPTC:\nCoded Character Set: [\"UTF8\"]");
    }

    #[test]
    fn unknown_key_falls_back_to_tuple() {
        let stream = dataset(9, 9, b"?");
        let meta = RawMetadata {
            iptc: Some(stream),
            ..RawMetadata::default()
        };
        assert_eq!(extract(&meta), "IPTC:\n(9, 9): b\"?\"");
    }

    #[test]
    fn photoshop_resource_is_the_fallback_source() {
        let meta = RawMetadata {
            photoshop: vec![(IRB_IPTC_NAA, dataset(2, 120, b"caption"))],
            ..RawMetadata::default()
        };
        assert_eq!(extract(&meta), "IPTC:\ndescription: b\"caption\"");
    }

    #[test]
    fn empty_sources_are_silent() {
        assert_eq!(extract(&RawMetadata::default()), "");
        let meta = RawMetadata {
            iptc: Some(b"no datasets here".to_vec()),
            ..RawMetadata::default()
        };
        assert_eq!(extract(&meta), "");
    }
}
