//! Value types for raw metadata fields
//!
//! This module defines the scalar value types that metadata scanners store
//! and the report builder renders.

pub mod value;

pub use value::{bytes_repr, MetaValue};
