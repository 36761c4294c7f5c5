//! WebP metadata scanner.
//!
//! WebP is a RIFF container: a 12-byte header (`RIFF`, file size, `WEBP`)
//! followed by chunks of fourcc, u32 little-endian size and payload,
//! padded to even length. Metadata lives in the `EXIF`, `ICCP` and
//! `XMP ` chunks; `ANIM` and `ANMF` describe animations.

use crate::meta::{le_u16, le_u32, RawMetadata};

/// RIFF header: fourcc, file size, `WEBP` form type.
const RIFF_HEADER_SIZE: usize = 12;

/// Chunk header: fourcc and size.
const CHUNK_HEADER_SIZE: usize = 8;

pub(crate) fn sniff(data: &[u8]) -> bool {
    data.len() >= RIFF_HEADER_SIZE && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

pub(crate) fn scan(data: &[u8], meta: &mut RawMetadata) {
    // Still image unless ANMF chunks say otherwise.
    meta.frames = 1;
    let mut pos = RIFF_HEADER_SIZE;
    let mut anim_frames = 0u32;
    while pos + CHUNK_HEADER_SIZE <= data.len() {
        let id: [u8; 4] = match data[pos..pos + 4].try_into() {
            Ok(id) => id,
            Err(_) => break,
        };
        let Some(size) = le_u32(data, pos + 4) else {
            break;
        };
        let body_at = pos + CHUNK_HEADER_SIZE;
        let Some(body) = data.get(body_at..body_at + size as usize) else {
            break;
        };
        match &id {
            b"EXIF" => {
                // Payload is TIFF data, with or without the JPEG-style
                // prefix depending on the writer.
                if meta.exif.is_none() {
                    meta.exif = Some(body.to_vec());
                }
            }
            b"ICCP" => {
                if meta.icc_profile.is_none() {
                    meta.icc_profile = Some(body.to_vec());
                }
            }
            b"XMP " => {
                if meta.xmp.is_none() {
                    meta.xmp = Some(body.to_vec());
                }
            }
            b"ANIM" => {
                // Background color u32, then loop count.
                if let Some(count) = le_u16(body, 4) {
                    meta.push_field("loop", count as i64);
                }
            }
            b"ANMF" => {
                anim_frames += 1;
                // Frame header: x, y, width, height as 24-bit fields,
                // then a 24-bit duration in milliseconds.
                if anim_frames == 1 && body.len() >= 15 {
                    let duration = body[12] as i64
                        | (body[13] as i64) << 8
                        | (body[14] as i64) << 16;
                    meta.push_field("duration", duration);
                }
            }
            _ => {}
        }
        // Chunks are padded to even length.
        pos = body_at + size as usize + (size as usize & 1);
    }
    if anim_frames > 0 {
        meta.frames = anim_frames;
    }
}
