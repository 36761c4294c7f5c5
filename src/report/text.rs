//! Best-effort decoding of tagged metadata byte strings
//!
//! EXIF user-facing fields (UserComment and friends) carry an 8-byte
//! character-code marker: `ASCII\0\0\0` or `UNICODE\0`. The UNICODE marker
//! does not say which UTF-16 endianness follows, and cameras disagree with
//! the container byte order often enough that the decoder tries both before
//! the caller's preference. Input that carries no marker at all gets a
//! permissive single-byte decode meant for diagnostics, not round-trips.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Character encodings the decoder knows how to attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-16 big-endian
    Utf16Be,
    /// UTF-16 little-endian
    Utf16Le,
    /// UTF-8
    Utf8,
    /// Strict 7-bit ASCII
    Ascii,
    /// Windows-1252, undefined slots decoding to U+FFFD (never fails)
    Ansi,
}

const ASCII_MARKER: &[u8] = b"ASCII\0\0\0";
const UNICODE_MARKER: &[u8] = b"UNICODE\0";

/// Decode a tagged EXIF-style byte string into display text.
///
/// - `ASCII\0\0\0` prefix: the remainder decodes as ASCII.
/// - `UNICODE\0` prefix: the remainder is tried as UTF-16BE, UTF-16LE,
///   `fallback`, then UTF-8, first success wins.
/// - no prefix, or every attempt failed: permissive Windows-1252 decode with
///   runs of non-printable-ASCII collapsed to a single space.
///
/// Total over all inputs; never fails.
pub fn decode_tagged(bytes: &[u8], fallback: Encoding) -> String {
    if let Some(payload) = bytes.strip_prefix(ASCII_MARKER) {
        return try_decode(payload, Encoding::Ascii).unwrap_or_else(|| decode_permissive(payload));
    }
    if let Some(payload) = bytes.strip_prefix(UNICODE_MARKER) {
        for enc in [Encoding::Utf16Be, Encoding::Utf16Le, fallback, Encoding::Utf8] {
            debug!("decode_tagged: trying {:?}", enc);
            if let Some(s) = try_decode(payload, enc) {
                return s;
            }
        }
        return decode_permissive(payload);
    }
    decode_permissive(bytes)
}

/// Attempt a single strict decode. `Ansi` always succeeds.
pub fn try_decode(bytes: &[u8], encoding: Encoding) -> Option<String> {
    match encoding {
        Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
        Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
        Encoding::Ascii => {
            if bytes.is_ascii() {
                Some(String::from_utf8_lossy(bytes).into_owned())
            } else {
                None
            }
        }
        Encoding::Ansi => Some(decode_ansi(bytes)),
    }
}

fn decode_utf16(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect();
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Windows-1252 characters for the 0x80..=0x9F range; the five slots cp1252
/// leaves undefined map to U+FFFD.
const CP1252_80_9F: [char; 32] = [
    '\u{20ac}', '\u{fffd}', '\u{201a}', '\u{0192}', '\u{201e}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02c6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{fffd}', '\u{017d}', '\u{fffd}',
    '\u{fffd}', '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02dc}', '\u{2122}', '\u{0161}', '\u{203a}', '\u{0153}', '\u{fffd}', '\u{017e}', '\u{0178}',
];

/// Decode bytes as Windows-1252 without failing.
///
/// Shared with the external-tool extractor, whose output encoding is not
/// guaranteed on any platform.
pub fn decode_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9f => CP1252_80_9F[(b - 0x80) as usize],
            // 0x00..=0x7F ASCII and 0xA0..=0xFF Latin-1 map to themselves.
            _ => b as char,
        })
        .collect()
}

static UNPRINTABLE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\x20-\x7F]+").expect("valid regex"));

/// Permissive no-marker path: Windows-1252 decode, then collapse every run
/// of characters outside printable ASCII into one space.
pub fn decode_permissive(bytes: &[u8]) -> String {
    UNPRINTABLE_RUN
        .replace_all(&decode_ansi(bytes), " ")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ascii_marker() {
        assert_eq!(
            decode_tagged(b"ASCII\0\0\0hello", Encoding::Utf16Be),
            "hello"
        );
    }

    #[test]
    fn ascii_marker_with_binary_payload_degrades() {
        // Non-ASCII payload behind the ASCII marker falls through to the
        // permissive path rather than failing.
        let out = decode_tagged(b"ASCII\0\0\0a\xffb", Encoding::Utf16Be);
        assert_eq!(out, "a b");
    }

    #[test]
    fn unicode_marker_utf16be() {
        let mut b = b"UNICODE\0".to_vec();
        b.extend_from_slice(&[0x00, 0x68, 0x00, 0x69]); // "hi"
        assert_eq!(decode_tagged(&b, Encoding::Utf16Le), "hi");
    }

    #[test]
    fn unicode_marker_prefers_big_endian() {
        // 0x6800 is a valid BE unit, so the BE attempt wins even when the
        // caller asked for LE.
        let mut b = b"UNICODE\0".to_vec();
        b.extend_from_slice(&[0x68, 0x00]);
        let out = decode_tagged(&b, Encoding::Utf16Le);
        assert_eq!(out, "\u{6800}");
    }

    #[test]
    fn unicode_marker_falls_back_past_bad_utf16() {
        // Odd-length payload cannot be UTF-16 either way; UTF-8 text wins.
        let mut b = b"UNICODE\0".to_vec();
        b.extend_from_slice(b"abc");
        assert_eq!(decode_tagged(&b, Encoding::Utf8), "abc");
    }

    #[test]
    fn no_marker_collapses_binary_runs() {
        assert_eq!(
            decode_tagged(b"\x01\x02see\xff\xfehere\x00", Encoding::Utf16Be),
            " see here "
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode_tagged(b"", Encoding::Utf16Be), "");
        assert_eq!(decode_tagged(b"", Encoding::Ansi), "");
    }

    #[test]
    fn every_encoding_terminates() {
        let inputs: [&[u8]; 4] = [b"", b"\xff", b"UNICODE\0\xd8\x00", b"ASCII\0\0\0\xff\xff"];
        for bytes in inputs {
            for enc in [
                Encoding::Utf16Be,
                Encoding::Utf16Le,
                Encoding::Utf8,
                Encoding::Ascii,
                Encoding::Ansi,
            ] {
                let _ = decode_tagged(bytes, enc);
            }
        }
    }

    #[test]
    fn ansi_decodes_cp1252_punctuation() {
        // 0x93/0x94 are curly quotes in cp1252.
        assert_eq!(decode_ansi(b"\x93x\x94"), "\u{201c}x\u{201d}");
        // Undefined slot.
        assert_eq!(decode_ansi(b"\x81"), "\u{fffd}");
    }

    #[test]
    fn del_byte_is_kept_by_permissive_path() {
        // The printable window is 0x20..=0x7F inclusive.
        assert_eq!(decode_permissive(b"a\x7fb"), "a\x7fb");
    }
}
