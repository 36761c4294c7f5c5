//! MHTML and EML single-file web archives
//!
//! The document is a MIME multipart body. A part qualifies as an image when
//! its headers declare base64 transfer encoding and either omit the content
//! type or declare an image one. Parts keep document order; there is no
//! name sorting. The display name of a part is the last path segment of its
//! first header line in sorted order, which in practice is the content
//! location URL.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::container::{decode_bytes, member_error, LoadOptions, LoadedImage};
use crate::error::{InfoError, InfoResult};

static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"boundary="(.+)""#).expect("valid regex"));

#[derive(Debug)]
struct Part {
    name: String,
    body: String,
}

pub(crate) fn load(path: &Path, options: &LoadOptions) -> InfoResult<LoadedImage> {
    let text = std::fs::read_to_string(path)?;
    let parts = parse_parts(&text, path)?;
    let names: Vec<String> = parts.iter().map(|part| part.name.clone()).collect();
    let index = if options.entry_index < parts.len() {
        options.entry_index
    } else {
        0
    };
    let part = &parts[index];
    debug!("decoding part {}/{}: {}", index + 1, parts.len(), part.name);

    let payload = decode_base64(&part.body)
        .map_err(|err| InfoError::decode(path, format!("{}: {err}", part.name)))?;
    let mut loaded =
        decode_bytes(&payload, path).map_err(|err| member_error(path, &part.name, err))?;
    loaded.meta.entry_names = Some(names);
    Ok(loaded)
}

pub(crate) fn entry_names(path: &Path) -> InfoResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_parts(&text, path)?
        .into_iter()
        .map(|part| part.name)
        .collect())
}

/// Split the document on its multipart boundary and keep the image parts.
fn parse_parts(text: &str, path: &Path) -> InfoResult<Vec<Part>> {
    let text = text.replace("\r\n", "\n");
    let boundary = BOUNDARY
        .captures(&text)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| InfoError::decode(path, "no multipart boundary"))?;

    let pieces: Vec<&str> = text.split(&boundary).collect();
    let mut parts = Vec::new();
    if pieces.len() >= 3 {
        // Drop the preamble before the first boundary and the epilogue
        // after the last one.
        for piece in &pieces[1..pieces.len() - 1] {
            let Some((header, body)) = piece.split_once("\n\n") else {
                continue;
            };
            let lowered = header.to_ascii_lowercase();
            if !lowered.contains("\ncontent-transfer-encoding: base64") {
                continue;
            }
            if lowered.contains("\ncontent-type:") && !lowered.contains("\ncontent-type: image") {
                continue;
            }
            let mut lines: Vec<&str> = header.trim().lines().collect();
            lines.sort_unstable();
            let first = lines.first().copied().unwrap_or_default();
            let name = first.rsplit('/').next().unwrap_or(first).to_string();
            parts.push(Part {
                name,
                body: body.to_string(),
            });
        }
    }
    if parts.is_empty() {
        return Err(InfoError::empty(path));
    }
    Ok(parts)
}

/// Decode a base64 body, discarding line breaks and any other byte outside
/// the base64 alphabet.
fn decode_base64(body: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: Vec<u8> = body
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        .collect();
    STANDARD.decode(cleaned)
}
