//! Expression building and analysis.
//!
//! The stack-machine builder, the expression tree it produces, and the
//! geometry inference that runs over the finished tree.

pub mod builder;
pub mod geometry;
pub mod node;

pub use builder::{ExpressionBuilder, Program};
pub use geometry::{infer, OutputGeometry};
pub use node::{Expr, ImageLeaf, LeafPlan, OpNode, RandomKind};
