//! Container dispatch: from a filesystem path to a decoded image
//!
//! A path resolves to one of four routes, picked by file name:
//!
//! - raster file: decode the bytes directly
//! - ZIP or TAR archive (optionally compressed): pick one member by index
//! - MHTML document (`.eml`, `.mht`, `.mhtml`): pick one base64 part
//! - SVG (`.svg`, `.svgz`): rasterize, then decode the raster
//!
//! Every route ends in [`decode_bytes`], which scans the selected bytes for
//! embedded metadata and decodes them, so container members carry the same
//! metadata fields as directly opened files. File stats (size, timestamps,
//! frame count) are prepended to the scanned fields afterwards.

mod archive;
mod mhtml;
mod raster;
mod svg;

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use log::debug;

use crate::error::{InfoError, InfoResult};
use crate::meta::{self, RawMetadata};
use crate::report::thousands;
use crate::sort::SortMode;
use crate::types::MetaValue;

pub(crate) use archive::tar_compression;

/// Timestamp layout for the stat lines, rendered in local time.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Extensions handled by the dispatcher itself, on top of the raster codecs.
const CONTAINER_EXTENSIONS: [&str; 15] = [
    "bz2", "eml", "gz", "mht", "mhtml", "svg", "svgz", "tar", "tbz2", "tgz", "txz", "xz", "zip",
    "zst", "zstd",
];

/// A decoded bitmap plus the facts reported about it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Decoded pixel data.
    pub pixels: image::DynamicImage,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Color mode label ("L", "RGB", "RGBA", ...).
    pub mode: String,
    /// Container format label ("JPEG", "PNG", "SVG", ...).
    pub format: String,
    /// MIME type, when the format has one registered.
    pub mime: Option<String>,
    /// Bits per channel, when known.
    pub bit_depth: Option<u8>,
    /// Number of frames; 1 for still images.
    pub frame_count: u32,
    /// Whether the byte stream carried a legacy EXIF blob.
    pub has_legacy_exif: bool,
    /// Whether the byte stream carried an XMP packet.
    pub has_xmp: bool,
}

/// A decoded image together with the metadata scanned from its bytes.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// The decoded bitmap and its facts.
    pub image: DecodedImage,
    /// Scanned metadata, with file stats prepended to the fields.
    pub meta: RawMetadata,
}

/// One selectable member of a multi-image container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    /// Member name inside the container.
    pub name: String,
    /// Position in the entry list, as [`LoadOptions::entry`] counts it.
    pub index: usize,
}

/// Options for [`load`] and [`list_entries`].
///
/// Methods consume and return `self`, so options chain:
///
/// ```rust,no_run
/// use imagemeta::container::{load, LoadOptions};
/// use imagemeta::sort::SortMode;
///
/// let options = LoadOptions::default().entry(3).sort(SortMode::String);
/// let loaded = load("album.zip".as_ref(), &options)?;
/// # Ok::<(), imagemeta::InfoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Index into the entry list of a container. Out-of-range indexes fall
    /// back to the first entry.
    pub entry_index: usize,
    /// Ordering applied to archive member names.
    pub sort: SortMode,
    /// Keep only archive members with a recognized raster extension.
    pub filter_images: bool,
    /// Scale factor applied when rasterizing an SVG.
    pub svg_scale: Option<f32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            entry_index: 0,
            sort: SortMode::Natural,
            filter_images: true,
            svg_scale: None,
        }
    }
}

impl LoadOptions {
    /// Select the container entry at `index`.
    pub fn entry(mut self, index: usize) -> Self {
        self.entry_index = index;
        self
    }

    /// Order archive members with `mode`.
    pub fn sort(mut self, mode: SortMode) -> Self {
        self.sort = mode;
        self
    }

    /// Keep every archive member, not only raster-named ones.
    pub fn all_members(mut self) -> Self {
        self.filter_images = false;
        self
    }

    /// Rasterize SVG input at `ratio` times its intrinsic size.
    pub fn fit_scale(mut self, ratio: f32) -> Self {
        self.svg_scale = Some(ratio);
        self
    }
}

/// Load the image at `path`, routing through the container format its file
/// name indicates.
pub fn load(path: &Path, options: &LoadOptions) -> InfoResult<LoadedImage> {
    let name = file_name_lower(path);
    debug!("loading {}", path.display());
    let mut loaded = if let Some(compression) = tar_compression(&name) {
        archive::load_tar(path, compression, options)?
    } else {
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("zip") => archive::load_zip(path, options)?,
            Some("eml" | "mht" | "mhtml") => mhtml::load(path, options)?,
            Some("svg" | "svgz") => svg::load(path, &name, options)?,
            _ => {
                let data = std::fs::read(path)?;
                decode_bytes(&data, path)?
            }
        }
    };
    attach_stats(path, &mut loaded.meta);
    Ok(loaded)
}

/// List the selectable entries of the container at `path`.
///
/// Non-container paths list no entries. A container with zero qualifying
/// entries is an error, same as [`load`].
pub fn list_entries(path: &Path, options: &LoadOptions) -> InfoResult<Vec<ContainerEntry>> {
    let name = file_name_lower(path);
    let names = if let Some(compression) = tar_compression(&name) {
        archive::tar_entry_names(path, compression, options)?
    } else {
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("zip") => archive::zip_entry_names(path, options)?,
            Some("eml" | "mht" | "mhtml") => mhtml::entry_names(path)?,
            _ => Vec::new(),
        }
    };
    Ok(names
        .into_iter()
        .enumerate()
        .map(|(index, name)| ContainerEntry { name, index })
        .collect())
}

/// Decode raster bytes and scan them for embedded metadata.
pub(crate) fn decode_bytes(data: &[u8], origin: &Path) -> InfoResult<LoadedImage> {
    let meta = meta::scan(data);
    let image = raster::decode(data, origin, &meta)?;
    Ok(LoadedImage { image, meta })
}

/// Clamp a requested entry index into `names` and return the chosen name.
///
/// Callers guarantee `names` is non-empty.
pub(crate) fn pick(names: &[String], index: usize) -> String {
    let index = if index < names.len() { index } else { 0 };
    names[index].clone()
}

/// Rewrite a member decode failure so the error names the member.
pub(crate) fn member_error(path: &Path, member: &str, err: InfoError) -> InfoError {
    match err {
        InfoError::DecodeFailure { detail, .. } => {
            InfoError::decode(path, format!("{member}: {detail}"))
        }
        other => other,
    }
}

/// Whether `name` carries a raster extension one of the codecs understands.
pub fn is_image_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => image::ImageFormat::from_extension(ext.to_ascii_lowercase()).is_some(),
        None => false,
    }
}

/// Whether `name` carries any extension [`load`] routes, raster or container.
pub fn is_openable_name(name: &str) -> bool {
    if is_image_name(name) {
        return true;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => CONTAINER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Every extension [`load`] accepts, lowercased, sorted and deduplicated.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = image::ImageFormat::all()
        .flat_map(|format| format.extensions_str())
        .copied()
        .collect();
    extensions.extend(CONTAINER_EXTENSIONS);
    extensions.sort_unstable();
    extensions.dedup();
    extensions
}

/// Prepend file stats and the frame count to the scanned fields.
///
/// Order: Size, Created, Modified, Accessed, Frames, then everything the
/// scan found. Timestamps the filesystem cannot report are left out.
fn attach_stats(path: &Path, meta: &mut RawMetadata) {
    let stat = match std::fs::metadata(path) {
        Ok(stat) => stat,
        Err(err) => {
            debug!("stat {} failed: {err}", path.display());
            return;
        }
    };
    let mut fields: Vec<(String, MetaValue)> = Vec::with_capacity(meta.fields.len() + 5);
    fields.push((
        "Size".to_string(),
        MetaValue::Str(format!("{} B", thousands(stat.len()))),
    ));
    let times = [
        ("Created", stat.created()),
        ("Modified", stat.modified()),
        ("Accessed", stat.accessed()),
    ];
    for (key, time) in times {
        if let Ok(time) = time {
            fields.push((key.to_string(), MetaValue::Str(local_timestamp(time))));
        }
    }
    if meta.frames > 0 {
        fields.push(("Frames".to_string(), MetaValue::Int(i64::from(meta.frames))));
    }
    fields.append(&mut meta.fields);
    meta.fields = fields;
}

fn local_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIME_FORMAT).to_string()
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn options_chain() {
        let options = LoadOptions::default().entry(4).sort(SortMode::String);
        assert_eq!(options.entry_index, 4);
        assert_eq!(options.sort, SortMode::String);
        assert!(options.filter_images);
        assert_eq!(options.svg_scale, None);

        let options = LoadOptions::default().all_members().fit_scale(2.0);
        assert!(!options.filter_images);
        assert_eq!(options.svg_scale, Some(2.0));
    }

    #[test]
    fn image_names_follow_codec_extensions() {
        assert!(is_image_name("IMG_0001.JPG"));
        assert!(is_image_name("frame.png"));
        assert!(!is_image_name("notes.txt"));
        assert!(!is_image_name("archive.zip"));
        assert!(!is_image_name("noext"));
    }

    #[test]
    fn openable_names_add_container_formats() {
        assert!(is_openable_name("album.zip"));
        assert!(is_openable_name("frames.tar.gz"));
        assert!(is_openable_name("page.MHT"));
        assert!(is_openable_name("icon.svgz"));
        assert!(is_openable_name("photo.jpeg"));
        assert!(!is_openable_name("notes.txt"));
    }

    #[test]
    fn extension_table_is_sorted_and_unique() {
        let extensions = supported_extensions();
        assert!(extensions.contains(&"png"));
        assert!(extensions.contains(&"zip"));
        assert!(extensions.contains(&"svgz"));
        let mut sorted = extensions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(extensions, sorted);
    }

    #[test]
    fn out_of_range_index_falls_back_to_first() {
        let names = vec!["a.png".to_string(), "b.png".to_string()];
        assert_eq!(pick(&names, 1), "b.png");
        assert_eq!(pick(&names, 99), "a.png");
    }

    #[test]
    fn stats_precede_scanned_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.bin");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let mut meta = RawMetadata::default();
        meta.frames = 3;
        meta.push_field("gamma", MetaValue::Float(0.5));
        attach_stats(&path, &mut meta);

        let keys: Vec<&str> = meta.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys.first(), Some(&"Size"));
        assert_eq!(keys.last(), Some(&"gamma"));
        assert!(keys.contains(&"Modified"));
        assert!(keys.contains(&"Accessed"));
        let frames = keys.iter().position(|k| *k == "Frames").unwrap();
        let gamma = keys.iter().position(|k| *k == "gamma").unwrap();
        assert_eq!(frames + 1, gamma);
        assert_eq!(meta.field("Size"), Some(&MetaValue::Str("2,048 B".into())));
    }

    #[test]
    fn untracked_frames_stay_out_of_the_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("y.bin");
        std::fs::write(&path, b"abc").unwrap();

        let mut meta = RawMetadata::default();
        attach_stats(&path, &mut meta);
        assert!(meta.field("Frames").is_none());
        assert_eq!(meta.field("Size"), Some(&MetaValue::Str("3 B".into())));
    }

    #[test]
    fn missing_file_leaves_fields_untouched() {
        let mut meta = RawMetadata::default();
        meta.push_field("comment", MetaValue::Str("hi".into()));
        attach_stats(Path::new("/no/such/file"), &mut meta);
        assert_eq!(meta.fields.len(), 1);
    }
}
