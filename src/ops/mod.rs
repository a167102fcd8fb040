//! Operator catalogue module.
//!
//! Contains the registry and the built-in kernel implementations.

pub mod binary;
pub mod registry;
pub mod ternary;
pub mod unary;

pub use registry::{registry, Kernels, OpRegistry, OpSpec};
