//! JPEG metadata scanner
//!
//! Walks the APPn/COM segments between SOI and SOS and collects everything
//! the report layer can use: the raw EXIF APP1 payload, a reassembled
//! multi-segment ICC profile, the XMP packet, Photoshop resources from
//! APP13, JFIF/Adobe scalars and the plain-text comment.

use log::debug;

use crate::meta::{be_u16, irb, RawMetadata};
use crate::types::MetaValue;

const MARKER_SOI: u8 = 0xD8;
const MARKER_SOS: u8 = 0xDA; // Start of Scan
const MARKER_EOI: u8 = 0xD9; // End of Image
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP2: u8 = 0xE2;
const MARKER_APP13: u8 = 0xED;
const MARKER_APP14: u8 = 0xEE;
const MARKER_COM: u8 = 0xFE;

const JFIF_SIGNATURE: &[u8] = b"JFIF\0";
const EXIF_SIGNATURE: &[u8] = b"Exif\0\x00";
const XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const ICC_SIGNATURE: &[u8] = b"ICC_PROFILE\0";
const PHOTOSHOP_SIGNATURE: &[u8] = b"Photoshop 3.0\0";
const ADOBE_SIGNATURE: &[u8] = b"Adobe";

/// Progressive/arithmetic SOF markers (SOF2, SOF6, SOF10, SOF14)
const PROGRESSIVE_SOF: [u8; 4] = [0xC2, 0xC6, 0xCA, 0xCE];

pub(crate) fn sniff(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == MARKER_SOI
}

pub(crate) fn scan(data: &[u8], meta: &mut RawMetadata) {
    let mut pos = 2usize;
    // ICC profiles over 64KB span several APP2 segments, each tagged with a
    // 1-based sequence number.
    let mut icc_chunks: Vec<(u8, Vec<u8>)> = Vec::new();

    loop {
        if data.get(pos) != Some(&0xFF) {
            debug!("jpeg scan: lost marker sync at {}", pos);
            break;
        }
        let mut id_at = pos + 1;
        while data.get(id_at) == Some(&0xFF) {
            id_at += 1; // fill bytes
        }
        let Some(&marker) = data.get(id_at) else {
            break;
        };
        pos = id_at + 1;
        match marker {
            MARKER_SOS | MARKER_EOI => break,
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }
        let Some(len) = be_u16(data, pos) else { break };
        let len = len as usize;
        if len < 2 {
            break;
        }
        let Some(payload) = data.get(pos + 2..pos + len) else {
            break;
        };
        segment(marker, payload, meta, &mut icc_chunks);
        pos += len;
    }

    if !icc_chunks.is_empty() {
        icc_chunks.sort_by_key(|(seq, _)| *seq);
        let mut profile = Vec::new();
        for (_, chunk) in icc_chunks {
            profile.extend_from_slice(&chunk);
        }
        meta.icc_profile = Some(profile);
    }
}

fn segment(marker: u8, payload: &[u8], meta: &mut RawMetadata, icc: &mut Vec<(u8, Vec<u8>)>) {
    match marker {
        MARKER_APP0 if payload.starts_with(JFIF_SIGNATURE) && payload.len() >= 12 => {
            let (major, minor) = (payload[5] as i64, payload[6] as i64);
            meta.push_field("jfif", (major << 8) | minor);
            meta.push_field("jfif_version", (major, minor));
            meta.push_field("jfif_unit", payload[7] as i64);
            let density = (
                be_u16(payload, 8).unwrap_or(0) as i64,
                be_u16(payload, 10).unwrap_or(0) as i64,
            );
            meta.push_field("jfif_density", density);
            if payload[7] == 1 {
                meta.push_field("dpi", density);
            }
        }
        MARKER_APP1 if payload.starts_with(EXIF_SIGNATURE) => {
            if meta.exif.is_none() {
                meta.exif = Some(payload.to_vec());
            }
        }
        MARKER_APP1 if payload.starts_with(XMP_NAMESPACE) => {
            if meta.xmp.is_none() {
                meta.xmp = Some(payload[XMP_NAMESPACE.len()..].to_vec());
            }
        }
        MARKER_APP2 if payload.starts_with(ICC_SIGNATURE) && payload.len() > 14 => {
            icc.push((payload[12], payload[14..].to_vec()));
        }
        MARKER_APP13 if payload.starts_with(PHOTOSHOP_SIGNATURE) => {
            irb::scan_resources(&payload[PHOTOSHOP_SIGNATURE.len()..], &mut meta.photoshop);
        }
        MARKER_APP14 if payload.starts_with(ADOBE_SIGNATURE) && payload.len() >= 12 => {
            meta.push_field("adobe", be_u16(payload, 5).unwrap_or(0) as i64);
            meta.push_field("adobe_transform", payload[11] as i64);
        }
        MARKER_COM => {
            meta.push_field("comment", MetaValue::Bytes(payload.to_vec()));
        }
        m if PROGRESSIVE_SOF.contains(&m) => {
            meta.push_field("progressive", 1i64);
            meta.push_field("progression", 1i64);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segment_bytes(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn jfif_payload() -> Vec<u8> {
        let mut p = b"JFIF\0".to_vec();
        p.extend_from_slice(&[1, 2, 1]); // version 1.2, unit inch
        p.extend_from_slice(&72u16.to_be_bytes());
        p.extend_from_slice(&96u16.to_be_bytes());
        p.push(0); // no thumbnail
        p.push(0);
        p
    }

    fn build_jpeg(segments: &[(u8, Vec<u8>)]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        for (marker, payload) in segments {
            data.extend_from_slice(&segment_bytes(*marker, payload));
        }
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]); // SOS ends the walk
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn sniff_requires_soi() {
        assert!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!sniff(b"PNG"));
        assert!(!sniff(&[]));
    }

    #[test]
    fn jfif_fields_are_collected() {
        let data = build_jpeg(&[(MARKER_APP0, jfif_payload())]);
        let mut meta = RawMetadata::default();
        scan(&data, &mut meta);

        assert_eq!(meta.field("jfif_version"), Some(&MetaValue::Pair(1, 2)));
        assert_eq!(meta.field("jfif_unit"), Some(&MetaValue::Int(1)));
        assert_eq!(meta.field("jfif_density"), Some(&MetaValue::Pair(72, 96)));
        assert_eq!(meta.field("dpi"), Some(&MetaValue::Pair(72, 96)));
        assert_eq!(meta.field("jfif"), Some(&MetaValue::Int(258)));
    }

    #[test]
    fn exif_payload_keeps_signature() {
        let mut exif = b"Exif\0\x00".to_vec();
        exif.extend_from_slice(b"MM\x00\x2A\x00\x00\x00\x08");
        let data = build_jpeg(&[(MARKER_APP1, exif.clone())]);
        let mut meta = RawMetadata::default();
        scan(&data, &mut meta);

        // The blob keeps the Exif\0\0 prefix, so MM sits inside the first
        // 8 bytes for byte-order sniffing.
        assert_eq!(meta.exif.as_deref(), Some(exif.as_slice()));
    }

    #[test]
    fn xmp_packet_is_stripped_of_namespace() {
        let mut xmp = XMP_NAMESPACE.to_vec();
        xmp.extend_from_slice(b"<x:xmpmeta/>");
        let data = build_jpeg(&[(MARKER_APP1, xmp)]);
        let mut meta = RawMetadata::default();
        scan(&data, &mut meta);

        assert_eq!(meta.xmp.as_deref(), Some(b"<x:xmpmeta/>".as_slice()));
    }

    #[test]
    fn icc_chunks_reassemble_in_sequence_order() {
        let mut chunk2 = ICC_SIGNATURE.to_vec();
        chunk2.extend_from_slice(&[2, 2]);
        chunk2.extend_from_slice(b"WORLD");
        let mut chunk1 = ICC_SIGNATURE.to_vec();
        chunk1.extend_from_slice(&[1, 2]);
        chunk1.extend_from_slice(b"HELLO ");
        let data = build_jpeg(&[(MARKER_APP2, chunk2), (MARKER_APP2, chunk1)]);
        let mut meta = RawMetadata::default();
        scan(&data, &mut meta);

        assert_eq!(meta.icc_profile.as_deref(), Some(b"HELLO WORLD".as_slice()));
    }

    #[test]
    fn adobe_and_comment_segments() {
        let mut adobe = ADOBE_SIGNATURE.to_vec();
        adobe.extend_from_slice(&100u16.to_be_bytes());
        adobe.extend_from_slice(&[0, 0, 0, 0]); // flags
        adobe.push(1); // transform
        let data = build_jpeg(&[
            (MARKER_APP14, adobe),
            (MARKER_COM, b"shot on film".to_vec()),
        ]);
        let mut meta = RawMetadata::default();
        scan(&data, &mut meta);

        assert_eq!(meta.field("adobe"), Some(&MetaValue::Int(100)));
        assert_eq!(meta.field("adobe_transform"), Some(&MetaValue::Int(1)));
        assert_eq!(
            meta.field("comment"),
            Some(&MetaValue::Bytes(b"shot on film".to_vec()))
        );
    }

    #[test]
    fn truncated_segment_stops_quietly() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0xFF]; // length cut off
        data.push(0xFF);
        let mut meta = RawMetadata::default();
        scan(&data, &mut meta);
        assert!(meta.fields.is_empty());
    }
}
