//! TIFF metadata scanner.
//!
//! A TIFF file opens with a byte-order mark (`II` little, `MM` big), the
//! magic number 42 and the offset of the first image file directory.
//! Each IFD is an entry count followed by 12-byte entries:
//! ```text
//! +--------+--------+--------+-----------------+
//! | tag    | type   | count  | value or offset |
//! | u16    | u16    | u32    | 4 bytes         |
//! +--------+--------+--------+-----------------+
//! ```
//! Values wider than four bytes live at the offset. A trailing u32 chains
//! to the next IFD; the chain length is the frame count.
//!
//! Entries of the first IFD are recorded as rendered `(tag, value)` pairs.
//! The ICC profile, XMP packet, IPTC block and Photoshop resources are
//! additionally lifted into their dedicated slots.

use crate::meta::{irb, RawMetadata};
use crate::types::bytes_repr;

const LITTLE: &[u8] = b"II\x2A\x00";
const BIG: &[u8] = b"MM\x00\x2A";

const TAG_XMP: u16 = 700;
const TAG_IPTC_NAA: u16 = 33723;
const TAG_PHOTOSHOP: u16 = 34377;
const TAG_ICC_PROFILE: u16 = 34675;

/// Upper bound on chained directories; defends against offset cycles.
const MAX_IFDS: u32 = 1000;

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16_bytes(self, b: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        }
    }

    fn u32_bytes(self, b: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        }
    }

    fn u64_bytes(self, b: [u8; 8]) -> u64 {
        match self {
            ByteOrder::Little => u64::from_le_bytes(b),
            ByteOrder::Big => u64::from_be_bytes(b),
        }
    }

    fn u16_at(self, data: &[u8], at: usize) -> Option<u16> {
        let b = data.get(at..at + 2)?;
        Some(self.u16_bytes([b[0], b[1]]))
    }

    fn u32_at(self, data: &[u8], at: usize) -> Option<u32> {
        let b = data.get(at..at + 4)?;
        Some(self.u32_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Byte width of one value of an IFD entry type.
fn type_size(kind: u16) -> Option<usize> {
    match kind {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 | 11 => Some(4),
        5 | 10 | 12 => Some(8),
        _ => None,
    }
}

pub(crate) fn sniff(data: &[u8]) -> bool {
    data.starts_with(LITTLE) || data.starts_with(BIG)
}

pub(crate) fn scan(data: &[u8], meta: &mut RawMetadata) {
    let order = if data.starts_with(LITTLE) {
        ByteOrder::Little
    } else if data.starts_with(BIG) {
        ByteOrder::Big
    } else {
        return;
    };
    let Some(first) = order.u32_at(data, 4) else {
        return;
    };

    let mut ifd_at = first as usize;
    let mut ifds = 0u32;
    while ifd_at != 0 && ifds < MAX_IFDS {
        let Some(count) = order.u16_at(data, ifd_at) else {
            break;
        };
        if ifds == 0 {
            for i in 0..count as usize {
                let at = ifd_at + 2 + i * 12;
                // A single bad entry should not end the walk.
                let Some((tag, kind, payload)) = entry(data, order, at) else {
                    continue;
                };
                record(tag, kind, payload, order, meta);
            }
        }
        ifds += 1;
        let next_at = ifd_at + 2 + count as usize * 12;
        match order.u32_at(data, next_at) {
            Some(next) if next as usize != ifd_at => ifd_at = next as usize,
            _ => break,
        }
    }
    meta.frames = ifds.max(1);
}

/// Reads one IFD entry and resolves its payload slice, whether inline or
/// behind an offset.
fn entry(data: &[u8], order: ByteOrder, at: usize) -> Option<(u16, u16, &[u8])> {
    let tag = order.u16_at(data, at)?;
    let kind = order.u16_at(data, at + 2)?;
    let count = order.u32_at(data, at + 4)? as usize;
    let len = count.checked_mul(type_size(kind)?)?;
    let payload = if len <= 4 {
        data.get(at + 8..at + 8 + len)?
    } else {
        let offset = order.u32_at(data, at + 8)? as usize;
        data.get(offset..offset + len)?
    };
    Some((tag, kind, payload))
}

fn record(tag: u16, kind: u16, payload: &[u8], order: ByteOrder, meta: &mut RawMetadata) {
    match tag {
        TAG_ICC_PROFILE if meta.icc_profile.is_none() => {
            meta.icc_profile = Some(payload.to_vec());
        }
        TAG_XMP if meta.xmp.is_none() => {
            meta.xmp = Some(payload.to_vec());
        }
        TAG_IPTC_NAA if meta.iptc.is_none() => {
            meta.iptc = Some(payload.to_vec());
        }
        TAG_PHOTOSHOP => irb::scan_resources(payload, &mut meta.photoshop),
        _ => {}
    }
    meta.tiff_tags.push((tag, render(kind, payload, order)));
}

/// Renders an entry payload for the directory listing.
fn render(kind: u16, payload: &[u8], order: ByteOrder) -> String {
    match kind {
        2 => String::from_utf8_lossy(payload)
            .trim_end_matches('\0')
            .to_string(),
        3 => join_values(
            payload
                .chunks_exact(2)
                .map(|c| (order.u16_bytes([c[0], c[1]]) as i64).to_string()),
        ),
        8 => join_values(
            payload
                .chunks_exact(2)
                .map(|c| (order.u16_bytes([c[0], c[1]]) as i16).to_string()),
        ),
        4 => join_values(
            payload
                .chunks_exact(4)
                .map(|c| (order.u32_bytes([c[0], c[1], c[2], c[3]]) as i64).to_string()),
        ),
        9 => join_values(
            payload
                .chunks_exact(4)
                .map(|c| (order.u32_bytes([c[0], c[1], c[2], c[3]]) as i32).to_string()),
        ),
        5 => join_values(payload.chunks_exact(8).map(|c| {
            let n = order.u32_bytes([c[0], c[1], c[2], c[3]]);
            let d = order.u32_bytes([c[4], c[5], c[6], c[7]]);
            format!("{n}/{d}")
        })),
        10 => join_values(payload.chunks_exact(8).map(|c| {
            let n = order.u32_bytes([c[0], c[1], c[2], c[3]]) as i32;
            let d = order.u32_bytes([c[4], c[5], c[6], c[7]]) as i32;
            format!("{n}/{d}")
        })),
        11 => join_values(payload.chunks_exact(4).map(|c| {
            let bits = order.u32_bytes([c[0], c[1], c[2], c[3]]);
            f32::from_bits(bits).to_string()
        })),
        12 => join_values(payload.chunks_exact(8).map(|c| {
            let bits = order.u64_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]);
            f64::from_bits(bits).to_string()
        })),
        _ => {
            if payload.len() > 32 {
                format!("{}...", bytes_repr(&payload[..32]))
            } else {
                bytes_repr(payload)
            }
        }
    }
}

fn join_values<I: Iterator<Item = String>>(values: I) -> String {
    let values: Vec<String> = values.collect();
    match values.len() {
        1 => values.into_iter().next().unwrap_or_default(),
        _ => format!("({})", values.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::meta::scan as meta_scan;

    fn entry_le(tag: u16, kind: u16, count: u32, value: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value);
        out
    }

    /// Little-endian file with one IFD holding `entries`, then `tail`
    /// appended after the next-IFD terminator for offset targets.
    fn build_le(entries: &[Vec<u8>], tail: &[u8]) -> Vec<u8> {
        let mut out = b"II\x2A\x00".to_vec();
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for e in entries {
            out.extend_from_slice(e);
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(tail);
        out
    }

    #[test]
    fn inline_short_value() {
        // Orientation = 6, stored inline.
        let data = build_le(
            &[entry_le(274, 3, 1, [6, 0, 0, 0])],
            &[],
        );

        let meta = meta_scan(&data);
        assert_eq!(meta.tiff_tags, vec![(274, "6".to_string())]);
        assert_eq!(meta.frames, 1);
    }

    #[test]
    fn offset_ascii_value() {
        // Data area starts after header(8) + count(2) + entry(12) + next(4).
        let offset = 26u32;
        let data = build_le(
            &[entry_le(270, 2, 6, offset.to_le_bytes())],
            b"hello\0",
        );

        let meta = meta_scan(&data);
        assert_eq!(meta.tiff_tags, vec![(270, "hello".to_string())]);
    }

    #[test]
    fn big_endian_rational() {
        let mut data = b"MM\x00\x2A".to_vec();
        data.extend_from_slice(&8u32.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&282u16.to_be_bytes());
        data.extend_from_slice(&5u16.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&26u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&300u32.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());

        let meta = meta_scan(&data);
        assert_eq!(meta.tiff_tags, vec![(282, "300/1".to_string())]);
    }

    #[test]
    fn icc_profile_tag_is_lifted() {
        let profile = vec![7u8; 40];
        let offset = 26u32;
        let data = build_le(
            &[entry_le(34675, 7, profile.len() as u32, offset.to_le_bytes())],
            &profile,
        );

        let meta = meta_scan(&data);
        assert_eq!(meta.icc_profile.as_deref(), Some(profile.as_slice()));
        // The raw entry still shows up in the directory listing.
        assert_eq!(meta.tiff_tags.len(), 1);
        assert_eq!(meta.tiff_tags[0].0, 34675);
        assert!(meta.tiff_tags[0].1.ends_with("..."));
    }

    #[test]
    fn ifd_chain_counts_frames() {
        // Two empty directories chained together.
        let mut data = b"II\x2A\x00".to_vec();
        data.extend_from_slice(&8u32.to_le_bytes());
        // First IFD at 8: no entries, next at 14.
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&14u32.to_le_bytes());
        // Second IFD at 14: no entries, end of chain.
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let meta = meta_scan(&data);
        assert_eq!(meta.frames, 2);
    }

    #[test]
    fn self_referencing_chain_stops() {
        let mut data = b"II\x2A\x00".to_vec();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        // Next-IFD offset points back at this IFD.
        data.extend_from_slice(&8u32.to_le_bytes());

        let meta = meta_scan(&data);
        assert_eq!(meta.frames, 1);
    }

    #[test]
    fn bad_entry_is_skipped() {
        let data = build_le(
            &[
                // Unknown value type 99.
                entry_le(900, 99, 1, [0, 0, 0, 0]),
                entry_le(274, 3, 1, [1, 0, 0, 0]),
            ],
            &[],
        );

        let meta = meta_scan(&data);
        assert_eq!(meta.tiff_tags, vec![(274, "1".to_string())]);
    }
}
