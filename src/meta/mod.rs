//! Raw embedded metadata: model and per-format scanners
//!
//! Decoding a file with an image codec yields pixels; the metadata the
//! container carried (EXIF blob, ICC profile, XMP packet, Photoshop
//! resources, per-format scalars) has to be walked out of the original byte
//! stream separately. One scanner per container format does that walk and
//! fills a [`RawMetadata`]. Scanning is best-effort by contract: a truncated
//! or malformed structure ends the walk with whatever was collected so far,
//! it never fails the load.

pub mod gif;
pub mod irb;
pub mod jpeg;
pub mod png;
pub mod tiff;
pub mod webp;

use log::debug;

use crate::types::MetaValue;

/// Everything the scanners recover from a container byte stream.
///
/// Read-only once the load that produced it returns.
#[derive(Debug, Clone)]
pub struct RawMetadata {
    /// Raw EXIF blob (JPEG APP1 payload including its `Exif\0\0` signature,
    /// or a bare TIFF structure from PNG `eXIf` / WebP `EXIF`)
    pub exif: Option<Vec<u8>>,
    /// Raw ICC profile bytes (JPEG multi-segment profiles concatenated)
    pub icc_profile: Option<Vec<u8>>,
    /// Raw XMP packet bytes
    pub xmp: Option<Vec<u8>>,
    /// Raw IPTC-IIM block (TIFF tag 33723; JPEG carries IIM inside the
    /// Photoshop resource 1028 instead)
    pub iptc: Option<Vec<u8>>,
    /// Photoshop Image Resource Block contents, file order
    pub photoshop: Vec<(u16, Vec<u8>)>,
    /// Primary-IFD TIFF tags as (tag code, rendered value), file order
    pub tiff_tags: Vec<(u16, String)>,
    /// Member names of the container this image was selected from
    pub entry_names: Option<Vec<String>>,
    /// Scalar fields in insertion order (file stats, JFIF/Adobe/GIF/PNG
    /// scalars, text chunks, comment bytes)
    pub fields: Vec<(String, MetaValue)>,
    /// Frame count when the container format tracks frames, 0 when it
    /// does not (plain JPEG, unscanned formats)
    pub frames: u32,
}

impl Default for RawMetadata {
    fn default() -> Self {
        RawMetadata {
            exif: None,
            icc_profile: None,
            xmp: None,
            iptc: None,
            photoshop: Vec::new(),
            tiff_tags: Vec::new(),
            entry_names: None,
            fields: Vec::new(),
            frames: 0,
        }
    }
}

impl RawMetadata {
    /// Insert or replace a scalar field, keeping first-insertion order.
    pub fn push_field(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Look up a scalar field by key.
    pub fn field(&self, key: &str) -> Option<&MetaValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a Photoshop resource by ID (first occurrence).
    pub fn photoshop_resource(&self, id: u16) -> Option<&[u8]> {
        self.photoshop
            .iter()
            .find(|(rid, _)| *rid == id)
            .map(|(_, data)| data.as_slice())
    }

    /// Whether a legacy EXIF blob was found.
    pub fn has_exif(&self) -> bool {
        self.exif.is_some()
    }

    /// Whether an XMP packet was found.
    pub fn has_xmp(&self) -> bool {
        self.xmp.is_some()
    }
}

/// Scan `data` with the scanner matching its signature.
///
/// Formats without a scanner (BMP, ICO, ...) yield an empty `RawMetadata`:
/// the image still decodes, there is just nothing embedded to report.
pub fn scan(data: &[u8]) -> RawMetadata {
    let mut meta = RawMetadata::default();
    if jpeg::sniff(data) {
        jpeg::scan(data, &mut meta);
    } else if png::sniff(data) {
        png::scan(data, &mut meta);
    } else if gif::sniff(data) {
        gif::scan(data, &mut meta);
    } else if tiff::sniff(data) {
        tiff::scan(data, &mut meta);
    } else if webp::sniff(data) {
        webp::scan(data, &mut meta);
    } else {
        debug!("no metadata scanner for this signature");
    }
    meta
}

// Bounds-checked readers shared by the scanners. Returning None at the end
// of input is how a truncated file stops a walk.

pub(crate) fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let b = data.get(at..at + 2)?;
    Some(u16::from_be_bytes([b[0], b[1]]))
}

pub(crate) fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let b = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn le_u16(data: &[u8], at: usize) -> Option<u16> {
    let b = data.get(at..at + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn le_u32(data: &[u8], at: usize) -> Option<u32> {
    let b = data.get(at..at + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
