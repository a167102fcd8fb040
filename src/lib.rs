//! # voxcalc - Voxel-wise Image Calculator
//!
//! voxcalc applies generic voxel-wise mathematical operations to
//! N-dimensional images using a stack-based (reverse-Polish) syntax.
//! Operands — images, numeric values, or random sources — are pushed on a
//! stack in the order they appear, and operators consume the top-most
//! entries and push their result:
//!
//! ```text
//! voxcalc a.mif 2 -multiply r.mif          # r = 2 * a
//! voxcalc a.mif -neg b.mif -divide -exp 9.3 -multiply r.mif
//!                                          # r = 9.3 * exp(-a / b)
//! ```
//!
//! Images of different sizes may be combined provided each axis either
//! matches or has size one, in which case the image broadcasts along that
//! axis. An expression without any image operand folds to a scalar and is
//! printed instead (*calculator mode*).
//!
//! ## Architecture
//!
//! - [`core`]: scalar values, chunks, datatypes, the error taxonomy
//! - [`image`]: the N-D voxel container, cursor, and file format
//! - [`ops`]: the operator catalogue with real and complex kernels
//! - [`expr`]: the stack-machine builder, expression tree, and geometry
//!   inference
//! - [`eval`]: per-worker scratch, the chunked evaluator, and the
//!   parallel driver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voxcalc::prelude::*;
//!
//! let mut builder = ExpressionBuilder::new();
//! builder.push_operand("a.mif");
//! builder.push_operand("2");
//! builder.apply(registry().get("multiply").unwrap())?;
//! builder.push_operand("out.mif");
//!
//! match builder.finish()? {
//!     Program::Value(v) => println!("{}", format_scalar(v)),
//!     Program::Image { root, plan, output } => {
//!         let geometry = voxcalc::expr::geometry::infer(&root)?;
//!         let (header, data) =
//!             evaluate_image(&root, &plan, &geometry, &EvalOptions::new())?;
//!         voxcalc::image::format::save(&output, &header, &data, false)?;
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod eval;
pub mod expr;
pub mod image;
pub mod ops;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::chunk::Chunk;
    pub use crate::core::error::{CalcError, CalcResult};
    pub use crate::core::types::{format_scalar, parse_scalar, re, DataType, Real, Scalar};

    pub use crate::image::format::{open, save};
    pub use crate::image::header::ImageHeader;
    pub use crate::image::volume::{VoxelCursor, VoxelImage};

    pub use crate::ops::registry::{registry, OpRegistry, OpSpec};

    pub use crate::expr::builder::{ExpressionBuilder, Program};
    pub use crate::expr::geometry::{infer, OutputGeometry};
    pub use crate::expr::node::{Expr, ImageLeaf, LeafPlan, RandomKind};

    pub use crate::eval::driver::{evaluate_image, negotiate_datatype, EvalOptions};
    pub use crate::eval::progress::{ProgressTracker, ProgressUpdate};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::core::types::re;
    use tempfile::TempDir;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "voxcalc");
    }

    // End-to-end: build from tokens, evaluate, write, read back.
    #[test]
    fn test_full_pipeline() {
        let dir = TempDir::new().unwrap();
        let a_path = dir.path().join("a.mif");
        let out_path = dir.path().join("out.mif");
        let a_path = a_path.to_str().unwrap();
        let out_path = out_path.to_str().unwrap();

        let header = ImageHeader::new(vec![2, 2], DataType::Float32).unwrap();
        let data = vec![re(1.0), re(2.0), re(3.0), re(4.0)];
        save(a_path, &header, &data, false).unwrap();

        let mut builder = ExpressionBuilder::new();
        builder.push_operand(a_path);
        builder.push_operand("2");
        builder.apply(registry().get("multiply").unwrap()).unwrap();
        builder.push_operand(out_path);

        let Program::Image { root, plan, output } = builder.finish().unwrap() else {
            panic!("expected image mode");
        };
        let geometry = infer(&root).unwrap();
        let (out_header, out_data) =
            evaluate_image(&root, &plan, &geometry, &EvalOptions::new()).unwrap();
        save(&output, &out_header, &out_data, false).unwrap();

        let result = open(out_path).unwrap();
        let got: Vec<f32> = result.data().iter().map(|v| v.re).collect();
        assert_eq!(got, vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_calculator_pipeline() {
        let mut builder = ExpressionBuilder::new();
        builder.push_operand("3");
        builder.push_operand("2");
        builder.apply(registry().get("multiply").unwrap()).unwrap();
        let Program::Value(v) = builder.finish().unwrap() else {
            panic!("expected calculator mode");
        };
        assert_eq!(format_scalar(v), "6");
    }
}
