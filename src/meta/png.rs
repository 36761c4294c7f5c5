//! PNG metadata scanner.
//!
//! PNG files are a signature followed by a chunk sequence:
//! ```text
//! +--------+--------+--------------+--------+
//! | length | type   | data         | CRC    |
//! | u32 BE | 4 chars| length bytes | u32 BE |
//! +--------+--------+--------------+--------+
//! ```
//!
//! Collected chunks: `pHYs`, `gAMA`, `cHRM`, `sRGB`, `tRNS`, `acTL`,
//! `eXIf`, `iCCP` and the text family (`tEXt`, `zTXt`, `iTXt`; the
//! `XML:com.adobe.xmp` keyword carries the XMP packet).

use std::io::Read;

use log::debug;

use crate::meta::{be_u32, RawMetadata};

/// Eight-byte PNG signature.
const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Prefix normalizing the `eXIf` payload to the shape JPEG APP1 delivers.
const EXIF_PREFIX: &[u8] = b"Exif\0\x00";

/// iTXt keyword announcing an XMP packet.
const XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

/// Upper bound for a single decompressed text or profile chunk.
const MAX_INFLATED: u64 = 32 * 1024 * 1024;

pub(crate) fn sniff(data: &[u8]) -> bool {
    data.len() >= SIGNATURE.len() && data[..SIGNATURE.len()] == SIGNATURE
}

pub(crate) fn scan(data: &[u8], meta: &mut RawMetadata) {
    // Still image unless an acTL chunk says otherwise.
    meta.frames = 1;
    let mut pos = SIGNATURE.len();
    while pos + 8 <= data.len() {
        let Some(len) = be_u32(data, pos) else {
            break;
        };
        let kind: [u8; 4] = match data[pos + 4..pos + 8].try_into() {
            Ok(kind) => kind,
            Err(_) => break,
        };
        if &kind == b"IEND" {
            break;
        }
        let body_at = pos + 8;
        let Some(body) = data.get(body_at..body_at + len as usize) else {
            debug!("truncated PNG chunk {}", String::from_utf8_lossy(&kind));
            break;
        };
        chunk(&kind, body, meta);
        // Step over the data and the trailing CRC.
        pos = body_at + len as usize + 4;
    }
}

fn chunk(kind: &[u8; 4], body: &[u8], meta: &mut RawMetadata) {
    match kind {
        // Interlace method lives in the last IHDR byte.
        b"IHDR" if body.len() >= 13 => {
            if body[12] != 0 {
                meta.push_field("interlace", 1i64);
            }
        }
        b"pHYs" if body.len() >= 9 => {
            let (Some(px), Some(py)) = (be_u32(body, 0), be_u32(body, 4)) else {
                return;
            };
            match body[8] {
                // Pixels per meter, folded down to dots per inch.
                1 => meta.push_field(
                    "dpi",
                    (
                        (px as f64 * 0.0254).round() as i64,
                        (py as f64 * 0.0254).round() as i64,
                    ),
                ),
                0 => meta.push_field("aspect", (px as i64, py as i64)),
                _ => {}
            }
        }
        b"gAMA" => {
            if let Some(raw) = be_u32(body, 0) {
                meta.push_field("gamma", raw as f64 / 100_000.0);
            }
        }
        b"cHRM" if body.len() >= 32 => {
            let vals: Vec<String> = (0..8)
                .filter_map(|i| be_u32(body, i * 4))
                .map(|raw| format!("{}", raw as f64 / 100_000.0))
                .collect();
            meta.push_field("chromaticity", format!("({})", vals.join(", ")));
        }
        b"sRGB" => {
            if let Some(&intent) = body.first() {
                meta.push_field("srgb", intent as i64);
            }
        }
        b"tRNS" => {
            meta.push_field("transparency", body.to_vec());
        }
        b"acTL" if body.len() >= 8 => {
            if let Some(frames) = be_u32(body, 0) {
                if frames > 0 {
                    meta.frames = frames;
                }
            }
            if let Some(plays) = be_u32(body, 4) {
                meta.push_field("loop", plays as i64);
            }
        }
        b"eXIf" => {
            if meta.exif.is_none() {
                let mut blob = EXIF_PREFIX.to_vec();
                blob.extend_from_slice(body);
                meta.exif = Some(blob);
            }
        }
        b"iCCP" => iccp(body, meta),
        b"tEXt" => text(body, meta),
        b"zTXt" => compressed_text(body, meta),
        b"iTXt" => international_text(body, meta),
        _ => {}
    }
}

/// `iCCP`: profile name, NUL, compression method, zlib stream.
fn iccp(body: &[u8], meta: &mut RawMetadata) {
    let Some(nul) = body.iter().position(|&b| b == 0) else {
        return;
    };
    // Method 0 (deflate) is the only defined compression.
    if body.get(nul + 1) != Some(&0) {
        return;
    }
    if let Some(profile) = inflate(&body[nul + 2..]) {
        if meta.icc_profile.is_none() {
            meta.icc_profile = Some(profile);
        }
    }
}

/// `tEXt`: keyword, NUL, Latin-1 text.
fn text(body: &[u8], meta: &mut RawMetadata) {
    let Some(nul) = body.iter().position(|&b| b == 0) else {
        return;
    };
    let keyword = latin1(&body[..nul]);
    if keyword.is_empty() {
        return;
    }
    meta.push_field(&keyword, latin1(&body[nul + 1..]));
}

/// `zTXt`: keyword, NUL, compression method, zlib stream of Latin-1 text.
fn compressed_text(body: &[u8], meta: &mut RawMetadata) {
    let Some(nul) = body.iter().position(|&b| b == 0) else {
        return;
    };
    let keyword = latin1(&body[..nul]);
    if keyword.is_empty() || body.get(nul + 1) != Some(&0) {
        return;
    }
    if let Some(raw) = inflate(&body[nul + 2..]) {
        meta.push_field(&keyword, latin1(&raw));
    }
}

/// `iTXt`: keyword, NUL, compression flag, compression method, language
/// tag, NUL, translated keyword, NUL, UTF-8 text.
fn international_text(body: &[u8], meta: &mut RawMetadata) {
    let Some(key_end) = body.iter().position(|&b| b == 0) else {
        return;
    };
    let keyword = &body[..key_end];
    let Some(&flag) = body.get(key_end + 1) else {
        return;
    };
    let Some(&method) = body.get(key_end + 2) else {
        return;
    };
    let mut pos = key_end + 3;
    // Language tag and translated keyword are both NUL-terminated.
    for _ in 0..2 {
        let Some(nul) = body[pos..].iter().position(|&b| b == 0) else {
            return;
        };
        pos += nul + 1;
    }
    let raw = &body[pos..];
    let value = match flag {
        0 => raw.to_vec(),
        1 if method == 0 => match inflate(raw) {
            Some(value) => value,
            None => return,
        },
        _ => return,
    };
    if keyword == XMP_KEYWORD {
        if meta.xmp.is_none() {
            meta.xmp = Some(value);
        }
        return;
    }
    if keyword.is_empty() {
        return;
    }
    meta.push_field(
        String::from_utf8_lossy(keyword).into_owned(),
        String::from_utf8_lossy(&value).into_owned(),
    );
}

fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut decoder = flate2::read::ZlibDecoder::new(data).take(MAX_INFLATED);
    match decoder.read_to_end(&mut out) {
        Ok(_) => Some(out),
        Err(err) => {
            debug!("zlib inflate failed: {err}");
            None
        }
    }
}

/// Latin-1 maps each byte to the code point of the same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
