//! ZIP and TAR archive members as images
//!
//! Both archive kinds run the same flow: collect member names, filter to
//! raster-named entries unless told otherwise, sort with the active mode,
//! clamp the requested index, then decode that one member. The full name
//! list is recorded on the scanned metadata so the report can show it.
//!
//! TAR archives are streams, so selection reads the archive twice: once for
//! the name list, once to reach the chosen member. Handles live only for
//! the duration of one call.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;

use crate::container::{decode_bytes, is_image_name, member_error, pick, LoadOptions, LoadedImage};
use crate::error::{InfoError, InfoResult};
use crate::sort::sort_entry_names;

/// Transparent TAR decompression, chosen by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TarCompression {
    Plain,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

/// Map a lowercased file name to its TAR flavor, or `None` when the name is
/// not a TAR at all.
pub(crate) fn tar_compression(name: &str) -> Option<TarCompression> {
    if name.ends_with(".tar") {
        Some(TarCompression::Plain)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(TarCompression::Gzip)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Some(TarCompression::Bzip2)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Some(TarCompression::Xz)
    } else if name.ends_with(".tar.zst") || name.ends_with(".tar.zstd") {
        Some(TarCompression::Zstd)
    } else {
        None
    }
}

pub(crate) fn load_zip(path: &Path, options: &LoadOptions) -> InfoResult<LoadedImage> {
    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|err| InfoError::decode(path, err.to_string()))?;
    let names = member_names(archive.file_names(), options, path)?;
    let selected = pick(&names, options.entry_index);
    debug!("zip member {}/{}: {selected}", options.entry_index, names.len());

    let mut data = Vec::new();
    archive
        .by_name(&selected)
        .map_err(|err| InfoError::decode(path, format!("{selected}: {err}")))?
        .read_to_end(&mut data)?;
    let mut loaded =
        decode_bytes(&data, path).map_err(|err| member_error(path, &selected, err))?;
    loaded.meta.entry_names = Some(names);
    Ok(loaded)
}

pub(crate) fn zip_entry_names(path: &Path, options: &LoadOptions) -> InfoResult<Vec<String>> {
    let file = File::open(path)?;
    let archive =
        zip::ZipArchive::new(file).map_err(|err| InfoError::decode(path, err.to_string()))?;
    member_names(archive.file_names(), options, path)
}

pub(crate) fn load_tar(
    path: &Path,
    compression: TarCompression,
    options: &LoadOptions,
) -> InfoResult<LoadedImage> {
    let names = tar_entry_names(path, compression, options)?;
    let selected = pick(&names, options.entry_index);
    debug!("tar member {}/{}: {selected}", options.entry_index, names.len());

    let mut archive = tar::Archive::new(tar_reader(path, compression)?);
    let entries = archive
        .entries()
        .map_err(|err| InfoError::decode(path, err.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|err| InfoError::decode(path, err.to_string()))?;
        let matches = {
            let entry_path = entry
                .path()
                .map_err(|err| InfoError::decode(path, err.to_string()))?;
            entry_path.to_string_lossy() == selected
        };
        if !matches {
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        let mut loaded =
            decode_bytes(&data, path).map_err(|err| member_error(path, &selected, err))?;
        loaded.meta.entry_names = Some(names);
        return Ok(loaded);
    }
    Err(InfoError::decode(path, format!("{selected}: not in archive")))
}

pub(crate) fn tar_entry_names(
    path: &Path,
    compression: TarCompression,
    options: &LoadOptions,
) -> InfoResult<Vec<String>> {
    let mut archive = tar::Archive::new(tar_reader(path, compression)?);
    let entries = archive
        .entries()
        .map_err(|err| InfoError::decode(path, err.to_string()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| InfoError::decode(path, err.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let Ok(entry_path) = entry.path() else {
            debug!("skipping tar member with undecodable name");
            continue;
        };
        names.push(entry_path.to_string_lossy().into_owned());
    }
    member_names(names.iter().map(String::as_str), options, path)
}

/// Filter, reject-if-empty and sort a raw member name list.
fn member_names<'a>(
    all: impl Iterator<Item = &'a str>,
    options: &LoadOptions,
    path: &Path,
) -> InfoResult<Vec<String>> {
    let mut names: Vec<String> = all
        .filter(|name| !options.filter_images || is_image_name(name))
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Err(InfoError::empty(path));
    }
    sort_entry_names(&mut names, options.sort);
    Ok(names)
}

fn tar_reader(path: &Path, compression: TarCompression) -> InfoResult<Box<dyn Read>> {
    let file = BufReader::new(File::open(path)?);
    Ok(match compression {
        TarCompression::Plain => Box::new(file),
        TarCompression::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
        TarCompression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(file)),
        TarCompression::Xz => Box::new(xz2::read::XzDecoder::new(file)),
        TarCompression::Zstd => Box::new(zstd::stream::read::Decoder::new(file)?),
    })
}
