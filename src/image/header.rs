//! Image headers: geometry and datatype without the voxel payload.
//!
//! Keeping the header separate from the data lets geometry inference and
//! datatype negotiation run without touching voxels, the same split the
//! rest of the pipeline relies on.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::{DataType, Real};

/// Geometry and storage description of an N-dimensional image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    /// Per-axis sizes, each at least 1. Axis 0 varies fastest in storage.
    pub sizes: Vec<usize>,
    /// Per-axis voxel spacing. NaN when the file declares none.
    pub spacing: Vec<Real>,
    /// Declared voxel storage format.
    pub datatype: DataType,
}

impl ImageHeader {
    /// Create a header with the given sizes, unit spacing and datatype.
    ///
    /// Fails with a range error when any axis size is zero.
    pub fn new(sizes: Vec<usize>, datatype: DataType) -> CalcResult<Self> {
        if sizes.iter().any(|&s| s == 0) {
            return Err(CalcError::Range {
                detail: "image axis sizes must be at least 1".to_string(),
            });
        }
        let spacing = vec![1.0; sizes.len()];
        Ok(Self {
            sizes,
            spacing,
            datatype,
        })
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    /// Size along `axis`; axes beyond `ndim` have size 1 (broadcast).
    #[inline]
    pub fn size(&self, axis: usize) -> usize {
        self.sizes.get(axis).copied().unwrap_or(1)
    }

    /// Spacing along `axis`; NaN beyond `ndim`.
    #[inline]
    pub fn spacing(&self, axis: usize) -> Real {
        self.spacing.get(axis).copied().unwrap_or(Real::NAN)
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Row-major strides with axis 0 fastest-varying.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = Vec::with_capacity(self.sizes.len());
        let mut acc = 1;
        for &s in &self.sizes {
            strides.push(acc);
            acc *= s;
        }
        strides
    }

    /// Whether voxels carry an imaginary component.
    #[inline]
    pub fn is_complex(&self) -> bool {
        self.datatype.is_complex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_basics() {
        let h = ImageHeader::new(vec![4, 3, 2], DataType::Float32).unwrap();
        assert_eq!(h.ndim(), 3);
        assert_eq!(h.voxel_count(), 24);
        assert_eq!(h.size(1), 3);
        assert_eq!(h.size(7), 1);
        assert!(h.spacing(7).is_nan());
        assert!(!h.is_complex());
    }

    #[test]
    fn test_strides_axis0_fastest() {
        let h = ImageHeader::new(vec![4, 3, 2], DataType::Float32).unwrap();
        assert_eq!(h.strides(), vec![1, 4, 12]);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(ImageHeader::new(vec![4, 0], DataType::Float32).is_err());
    }
}
