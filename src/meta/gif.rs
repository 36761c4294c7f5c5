//! GIF metadata scanner.
//!
//! After the header and logical screen descriptor, a GIF is a block
//! sequence: extensions (`0x21` + label + sub-blocks), image descriptors
//! (`0x2C`) and the trailer (`0x3B`). Sub-blocks are a size byte followed
//! by that many data bytes; size zero terminates the sequence.
//!
//! The XMP application extension (`XMP DataXMP`) stores its packet as raw
//! bytes followed by a 258-byte magic trailer laid out so that a plain
//! sub-block walk always lands on the terminator.

use log::debug;

use crate::meta::{le_u16, RawMetadata};
use crate::types::bytes_repr;

const SIGNATURE_87A: &[u8] = b"GIF87a";
const SIGNATURE_89A: &[u8] = b"GIF89a";

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const COMMENT_LABEL: u8 = 0xFE;
const APPLICATION_LABEL: u8 = 0xFF;

const NETSCAPE_APP: &[u8] = b"NETSCAPE2.0";
const XMP_APP: &[u8] = b"XMP DataXMP";

/// Magic trailer closing an XMP application extension.
const XMP_TRAILER_LEN: usize = 258;

pub(crate) fn sniff(data: &[u8]) -> bool {
    data.starts_with(SIGNATURE_87A) || data.starts_with(SIGNATURE_89A)
}

pub(crate) fn scan(data: &[u8], meta: &mut RawMetadata) {
    // Header plus logical screen descriptor.
    if data.len() < 13 {
        return;
    }
    meta.push_field("version", data[..6].to_vec());

    let packed = data[10];
    let mut pos = 13;
    if packed & 0x80 != 0 {
        meta.push_field("background", data[11] as i64);
        // Global color table: 2^(N+1) entries of 3 bytes.
        pos += (2 << (packed & 0x07) as usize) * 3;
    }

    let mut frames = 0u32;
    while pos < data.len() {
        let next = match data[pos] {
            EXTENSION_INTRODUCER => extension(data, pos, meta, frames),
            IMAGE_SEPARATOR => {
                frames += 1;
                skip_image(data, pos)
            }
            TRAILER => break,
            other => {
                debug!("unknown GIF block 0x{other:02X}");
                break;
            }
        };
        match next {
            Some(next) => pos = next,
            None => break,
        }
    }
    meta.frames = frames.max(1);
}

/// Handles one extension block and returns the offset of the next block.
///
/// Scalar fields mirror the first frame only; later frames carry their own
/// graphic control blocks.
fn extension(
    data: &[u8],
    pos: usize,
    meta: &mut RawMetadata,
    frames_seen: u32,
) -> Option<usize> {
    let label = *data.get(pos + 1)?;
    let cursor = pos + 2;
    match label {
        GRAPHIC_CONTROL_LABEL => {
            if frames_seen == 0 {
                if let Some(block) = first_sub_block(data, cursor) {
                    if block.len() >= 4 {
                        let delay = u16::from_le_bytes([block[1], block[2]]);
                        // Delay is in centiseconds.
                        meta.push_field("duration", delay as i64 * 10);
                        if block[0] & 1 != 0 {
                            meta.push_field("transparency", block[3] as i64);
                        }
                    }
                }
            }
            skip_sub_blocks(data, cursor)
        }
        COMMENT_LABEL => {
            let mut comment = Vec::new();
            let mut at = cursor;
            loop {
                let size = *data.get(at)? as usize;
                at += 1;
                if size == 0 {
                    break;
                }
                comment.extend_from_slice(data.get(at..at + size)?);
                at += size;
            }
            if frames_seen == 0 && !comment.is_empty() {
                meta.push_field("comment", comment);
            }
            Some(at)
        }
        APPLICATION_LABEL => {
            let id_len = *data.get(cursor)? as usize;
            let app_id = data.get(cursor + 1..cursor + 1 + id_len)?;
            let sub_at = cursor + 1 + id_len;
            if frames_seen == 0 {
                meta.push_field(
                    "extension",
                    format!("({}, {})", bytes_repr(app_id), sub_at),
                );
            }
            if app_id.get(..11) == Some(NETSCAPE_APP) {
                if let Some(block) = first_sub_block(data, sub_at) {
                    if block.first() == Some(&1) {
                        if let Some(count) = le_u16(block, 1) {
                            meta.push_field("loop", count as i64);
                        }
                    }
                }
            } else if app_id.get(..11) == Some(XMP_APP) && meta.xmp.is_none() {
                if let Some((packet, after)) = xmp_packet(data, sub_at) {
                    meta.xmp = Some(packet);
                    return Some(after);
                }
            }
            skip_sub_blocks(data, sub_at)
        }
        _ => skip_sub_blocks(data, cursor),
    }
}

/// Extracts the XMP packet starting at `start` (just past the app
/// identifier) and returns it with the offset of the following block.
///
/// The sub-block walk runs to the extension terminator; the packet is
/// whatever precedes the magic trailer. Packets beginning with `<` are
/// stored raw, anything else is sub-block wrapped and gets reassembled.
fn xmp_packet(data: &[u8], start: usize) -> Option<(Vec<u8>, usize)> {
    let after = skip_sub_blocks(data, start)?;
    let packet_len = after.saturating_sub(start + XMP_TRAILER_LEN);
    if packet_len == 0 {
        return None;
    }
    let raw = data.get(start..start + packet_len)?;
    let packet = if raw[0] == b'<' {
        raw.to_vec()
    } else {
        let mut packet = Vec::new();
        let mut offset = 0;
        while offset < raw.len() {
            let size = raw[offset] as usize;
            if size == 0 {
                break;
            }
            offset += 1;
            let block = raw.get(offset..offset + size)?;
            packet.extend_from_slice(block);
            offset += size;
        }
        packet
    };
    Some((packet, after))
}

fn first_sub_block(data: &[u8], at: usize) -> Option<&[u8]> {
    let size = *data.get(at)? as usize;
    data.get(at + 1..at + 1 + size)
}

fn skip_sub_blocks(data: &[u8], mut at: usize) -> Option<usize> {
    loop {
        let size = *data.get(at)? as usize;
        at += 1;
        if size == 0 {
            return Some(at);
        }
        at += size;
    }
}

fn skip_image(data: &[u8], pos: usize) -> Option<usize> {
    // Descriptor: separator, left, top, width, height, packed byte.
    let packed = *data.get(pos + 9)?;
    let mut cursor = pos + 10;
    if packed & 0x80 != 0 {
        cursor += (2 << (packed & 0x07) as usize) * 3;
    }
    // LZW minimum code size byte, then the pixel sub-blocks.
    skip_sub_blocks(data, cursor + 1)
}
