//! Output geometry inference.
//!
//! Walks the image leaves of a finished tree in traversal order and
//! merges their headers: the output has the maximum axis count, each axis
//! takes the maximum size (a size of 1 broadcasts), and the spacing is
//! the first finite spacing encountered. Two leaves disagreeing on an
//! axis where neither is 1 is a geometry mismatch.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::Real;
use crate::expr::node::Expr;

/// The merged geometry the output image will have.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGeometry {
    /// Per-axis sizes. Empty when the expression has no image leaves.
    pub sizes: Vec<usize>,
    /// Per-axis spacing; NaN where no leaf declared one.
    pub spacing: Vec<Real>,
}

impl OutputGeometry {
    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    /// No image leaves contributed: the degenerate calculator-mode shape.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Size along `axis`, 1 beyond the axis count.
    pub fn size(&self, axis: usize) -> usize {
        self.sizes.get(axis).copied().unwrap_or(1)
    }

    /// Sizes of the two inner (fastest-varying) axes.
    pub fn inner_sizes(&self) -> [usize; 2] {
        [self.size(0), self.size(1)]
    }

    /// Sizes of the outer axes (everything past the first two).
    pub fn outer_sizes(&self) -> &[usize] {
        if self.sizes.len() > 2 {
            &self.sizes[2..]
        } else {
            &[]
        }
    }

    /// Cells in one inner-axes tile.
    pub fn tile_len(&self) -> usize {
        let [x, y] = self.inner_sizes();
        x * y
    }

    /// Number of outer positions, i.e. of independent tiles.
    pub fn outer_count(&self) -> usize {
        self.outer_sizes().iter().product()
    }

    /// Total voxel count.
    pub fn voxel_count(&self) -> usize {
        self.sizes.iter().product()
    }
}

/// Derive the output geometry of an expression.
pub fn infer(root: &Expr) -> CalcResult<OutputGeometry> {
    let mut sizes: Vec<usize> = Vec::new();
    let mut spacing: Vec<Real> = Vec::new();

    for leaf in root.images() {
        let header = &leaf.image.header;
        if sizes.is_empty() {
            sizes = header.sizes.clone();
            spacing = (0..header.ndim()).map(|a| header.spacing(a)).collect();
            continue;
        }
        if header.ndim() > sizes.len() {
            sizes.resize(header.ndim(), 1);
            spacing.resize(header.ndim(), Real::NAN);
        }
        for a in 0..header.ndim() {
            let s = header.sizes[a];
            if sizes[a] > 1 && s > 1 && sizes[a] != s {
                return Err(CalcError::GeometryMismatch {
                    axis: a,
                    left: sizes[a],
                    right: s,
                });
            }
            sizes[a] = sizes[a].max(s);
            if !spacing[a].is_finite() {
                spacing[a] = header.spacing(a);
            }
        }
    }

    Ok(OutputGeometry { sizes, spacing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{re, DataType, Scalar};
    use crate::expr::node::{ImageLeaf, OpNode};
    use crate::image::header::ImageHeader;
    use crate::image::volume::VoxelImage;
    use crate::ops::registry::registry;
    use std::sync::Arc;

    fn leaf(sizes: Vec<usize>, spacing: Vec<Real>) -> Expr {
        let n: usize = sizes.iter().product();
        let mut header = ImageHeader::new(sizes, DataType::Float32).unwrap();
        header.spacing = spacing;
        let image =
            VoxelImage::from_parts("t.mif", header, vec![Scalar::new(0.0, 0.0); n]).unwrap();
        Expr::Image(ImageLeaf {
            image: Arc::new(image),
            complex: false,
            slot: 0,
        })
    }

    fn add(a: Expr, b: Expr) -> Expr {
        Expr::Op(OpNode {
            spec: registry().get("add").unwrap(),
            children: vec![a, b],
            operands_complex: false,
            result_complex: false,
        })
    }

    #[test]
    fn test_broadcast_merge() {
        // [2,2,1] + [1,1,3] -> [2,2,3]
        let tree = add(
            leaf(vec![2, 2, 1], vec![1.0, 1.0, 1.0]),
            leaf(vec![1, 1, 3], vec![1.0, 1.0, 1.0]),
        );
        let g = infer(&tree).unwrap();
        assert_eq!(g.sizes, vec![2, 2, 3]);
        assert_eq!(g.inner_sizes(), [2, 2]);
        assert_eq!(g.outer_sizes(), &[3]);
        assert_eq!(g.tile_len(), 4);
        assert_eq!(g.outer_count(), 3);
        assert_eq!(g.voxel_count(), 12);
    }

    #[test]
    fn test_ndim_extension() {
        let tree = add(
            leaf(vec![4, 4], vec![1.0, 1.0]),
            leaf(vec![4, 4, 5], vec![1.0, 1.0, 2.0]),
        );
        let g = infer(&tree).unwrap();
        assert_eq!(g.sizes, vec![4, 4, 5]);
        assert_eq!(g.spacing[2], 2.0);
    }

    #[test]
    fn test_mismatch_detected() {
        let tree = add(
            leaf(vec![2, 3], vec![1.0, 1.0]),
            leaf(vec![2, 4], vec![1.0, 1.0]),
        );
        assert!(matches!(
            infer(&tree),
            Err(CalcError::GeometryMismatch { axis: 1, left: 3, right: 4 })
        ));
    }

    #[test]
    fn test_first_finite_spacing_wins() {
        let tree = add(
            leaf(vec![2, 2], vec![Real::NAN, 0.5]),
            leaf(vec![2, 2], vec![3.0, 4.0]),
        );
        let g = infer(&tree).unwrap();
        assert_eq!(g.spacing, vec![3.0, 0.5]);
    }

    #[test]
    fn test_no_images_is_empty() {
        let g = infer(&Expr::scalar(re(1.0))).unwrap();
        assert!(g.is_empty());
        assert_eq!(g.outer_count(), 1);
        assert_eq!(g.tile_len(), 1);
    }
}
