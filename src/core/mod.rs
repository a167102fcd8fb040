//! Core value and error types for the calculator.
//!
//! This module contains the foundational pieces shared by every stage of
//! the pipeline:
//! - Scalar values and voxel datatypes
//! - Tile-sized chunks with broadcast support
//! - The error taxonomy

pub mod chunk;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use chunk::Chunk;
pub use error::{CalcError, CalcResult};
pub use types::{format_scalar, is_real, parse_scalar, re, DataType, Real, Scalar};
