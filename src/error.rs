//! Error types for image loading and container dispatch
//!
//! Metadata extraction never produces these errors: a failing extractor
//! contributes an empty section instead. Only loading, container selection
//! and decoding surface `InfoError` to the caller.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error types for image loading and container dispatch
#[derive(Debug, Error)]
pub enum InfoError {
    /// The codec or container parser rejected the byte stream
    #[error("cannot decode {}: {detail}", .path.display())]
    DecodeFailure {
        /// Path of the offending file (a container member is named in `detail`)
        path: PathBuf,
        /// Underlying codec/container error text
        detail: String,
    },

    /// A multi-entry container held zero qualifying entries after filtering
    #[error("no image found in {}", .path.display())]
    ContainerEmpty {
        /// Path of the container
        path: PathBuf,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InfoError {
    /// Build a [`InfoError::DecodeFailure`] for `path` with the given detail text.
    pub fn decode(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        InfoError::DecodeFailure {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    /// Build a [`InfoError::ContainerEmpty`] for `path`.
    pub fn empty(path: impl AsRef<Path>) -> Self {
        InfoError::ContainerEmpty {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Result type alias for image loading operations
pub type InfoResult<T> = Result<T, InfoError>;
