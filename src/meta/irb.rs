//! Photoshop image resource block (8BIM) parsing.
//!
//! Resource block layout:
//! ```text
//! +--------+--------+---------------------+--------+----------+
//! | "8BIM" | ID     | Pascal name         | size   | data     |
//! | 4 bytes| u16 BE | len byte + chars,   | u32 BE | size     |
//! |        |        | padded to even      |        | bytes,   |
//! |        |        |                     |        | padded   |
//! +--------+--------+---------------------+--------+----------+
//! ```
//!
//! The IPTC-NAA resource (ID 1028) holds IIM datasets:
//! ```text
//! +------+--------+---------+--------+-------+
//! | 0x1C | record | dataset | length | value |
//! |      | u8     | u8      | u16 BE |       |
//! +------+--------+---------+--------+-------+
//! ```

use crate::meta::{be_u16, be_u32};

/// Signature preceding every image resource block.
const RESOURCE_SIGNATURE: &[u8; 4] = b"8BIM";

/// Marker byte starting every IIM dataset.
const DATASET_MARKER: u8 = 0x1C;

/// Walks a resource block sequence and appends `(id, data)` pairs to `out`.
///
/// Stops quietly at the first block that does not carry the `8BIM`
/// signature or runs past the end of `data`.
pub(crate) fn scan_resources(data: &[u8], out: &mut Vec<(u16, Vec<u8>)>) {
    let mut pos = 0usize;
    // Smallest possible block: signature + id + empty name + size field.
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != RESOURCE_SIGNATURE {
            break;
        }
        let Some(id) = be_u16(data, pos + 4) else {
            break;
        };
        // Pascal name: length byte plus characters, padded so the whole
        // field occupies an even number of bytes.
        let name_len = data[pos + 6] as usize;
        let name_field = (1 + name_len + 1) & !1;
        let size_at = pos + 6 + name_field;
        let Some(size) = be_u32(data, size_at) else {
            break;
        };
        let data_at = size_at + 4;
        let Some(value) = data.get(data_at..data_at + size as usize) else {
            break;
        };
        out.push((id, value.to_vec()));
        // Resource data is padded to an even length as well.
        pos = data_at + ((size as usize + 1) & !1);
    }
}

/// Parses IIM datasets out of an IPTC-NAA resource payload.
///
/// Returns `((record, dataset), value)` tuples in stream order. A length
/// with the high bit set announces an extended dataset whose low bits give
/// the size of the real length field that follows.
pub(crate) fn parse_iim(data: &[u8]) -> Vec<((u8, u8), Vec<u8>)> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos + 5 <= data.len() {
        if data[pos] != DATASET_MARKER {
            break;
        }
        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let Some(raw_len) = be_u16(data, pos + 3) else {
            break;
        };
        pos += 5;
        let mut len = raw_len as usize;
        if len & 0x8000 != 0 {
            let len_bytes = len & 0x7FFF;
            if len_bytes > 8 {
                break;
            }
            let Some(field) = data.get(pos..pos + len_bytes) else {
                break;
            };
            len = field.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            pos += len_bytes;
        }
        let Some(value) = data.get(pos..pos + len) else {
            break;
        };
        out.push(((record, dataset), value.to_vec()));
        pos += len;
    }
    out
}
