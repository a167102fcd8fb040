//! N-dimensional voxel images.
//!
//! The container, its header, the random-access cursor used by the
//! evaluator, and the on-disk format.

pub mod format;
pub mod header;
pub mod volume;

pub use format::{open, save};
pub use header::ImageHeader;
pub use volume::{VoxelCursor, VoxelImage};
