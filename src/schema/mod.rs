//! Declarative schema mapping.
//!
//! This module provides:
//! - Field descriptors (column name, type tag, primary-key flag, default)
//! - The `Model` trait and the `model!` declaration macro
//! - The registrar that builds immutable table metadata once per model type

pub mod field;
pub mod model;
pub mod registry;

pub use field::{Field, FieldDefault};
pub use model::{Declaration, Model};
pub use registry::{Column, TableMetadata, is_registered, metadata, quote_identifier, register};
