//! Image metadata inspection and container browsing
//!
//! This crate turns a filesystem path into a decoded image plus a plain-text
//! metadata report. Embedded EXIF, ICC, IPTC, XMP and Photoshop blocks are
//! scanned straight from the bytes, ZIP/TAR archives and MHTML documents
//! expose their members as selectable entries, and SVG input is rasterized
//! before decoding so every route ends in the same pipeline.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use imagemeta::{build_report, load, LoadOptions, ReportRequest};
//!
//! let path = std::path::Path::new("photo.jpg");
//! let loaded = load(path, &LoadOptions::default())?;
//! let report = build_report(&ReportRequest {
//!     image: Some(&loaded.image),
//!     meta: &loaded.meta,
//!     path,
//! });
//! println!("{}x{}{report}", loaded.image.width, loaded.image.height);
//! # Ok::<(), imagemeta::InfoError>(())
//! ```

pub mod container;
pub mod error;
pub mod meta;
pub mod report;
pub mod sort;
pub mod types;

pub use container::{
    is_image_name, is_openable_name, list_entries, load, supported_extensions, ContainerEntry,
    DecodedImage, LoadOptions, LoadedImage,
};
pub use error::{InfoError, InfoResult};
pub use meta::RawMetadata;
pub use report::{build_report, ReportRequest};
pub use sort::{sort_entry_names, sort_paths, SortMode};
pub use types::MetaValue;
