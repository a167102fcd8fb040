//! In-memory N-dimensional voxel container and its random-access cursor.
//!
//! Input files of any datatype are widened to [`Scalar`] when opened, so
//! the evaluator only ever sees complex 32-bit values. Images are shared
//! between workers behind an `Arc`; each worker creates its own cheap
//! [`VoxelCursor`] over the shared storage.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::Scalar;
use crate::image::header::ImageHeader;
use std::sync::Arc;

/// A read-only N-dimensional image held fully in memory.
///
/// Storage is a flat vector with axis 0 varying fastest.
#[derive(Debug)]
pub struct VoxelImage {
    /// Path the image was opened from, used in provenance strings.
    pub path: String,
    /// Geometry and declared datatype.
    pub header: ImageHeader,
    data: Vec<Scalar>,
}

impl VoxelImage {
    /// Assemble an image from a header and matching voxel data.
    pub fn from_parts(
        path: impl Into<String>,
        header: ImageHeader,
        data: Vec<Scalar>,
    ) -> CalcResult<Self> {
        let path = path.into();
        if data.len() != header.voxel_count() {
            return Err(CalcError::format(
                path,
                format!(
                    "voxel payload holds {} values, header declares {}",
                    data.len(),
                    header.voxel_count()
                ),
            ));
        }
        Ok(Self { path, header, data })
    }

    /// The flat voxel payload, axis 0 fastest.
    #[inline]
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.header.ndim()
    }

    /// Size along `axis` (1 beyond the image's axes).
    #[inline]
    pub fn size(&self, axis: usize) -> usize {
        self.header.size(axis)
    }
}

/// Random-access voxel cursor over a shared image.
///
/// Holds a full index vector and keeps a flat offset incrementally up to
/// date, so `value()` is a plain load. Cursors are created per worker and
/// never shared.
#[derive(Debug, Clone)]
pub struct VoxelCursor {
    image: Arc<VoxelImage>,
    strides: Vec<usize>,
    index: Vec<usize>,
    offset: usize,
}

impl VoxelCursor {
    /// Create a cursor positioned at the origin.
    pub fn new(image: Arc<VoxelImage>) -> Self {
        let strides = image.header.strides();
        let index = vec![0; image.ndim()];
        Self {
            image,
            strides,
            index,
            offset: 0,
        }
    }

    /// Number of axes of the underlying image.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.index.len()
    }

    /// Size of the underlying image along `axis`.
    #[inline]
    pub fn size(&self, axis: usize) -> usize {
        self.image.size(axis)
    }

    /// Move the cursor to position `i` along `axis`.
    #[inline]
    pub fn index(&mut self, axis: usize, i: usize) {
        let old = self.index[axis];
        if i != old {
            self.offset = self.offset + i * self.strides[axis] - old * self.strides[axis];
            self.index[axis] = i;
        }
    }

    /// Voxel value at the current position.
    #[inline]
    pub fn value(&self) -> Scalar {
        self.image.data[self.offset]
    }
}
