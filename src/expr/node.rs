//! The expression tree.
//!
//! Built by the stack machine in postfix order. Leaves are tagged
//! variants (image, random source, scalar literal); operator nodes point
//! at their catalogue entry and cache both complex-ness bits at
//! construction time, so the evaluator never inspects runtime values to
//! choose a kernel.

use crate::core::types::{format_scalar, is_real, Scalar};
use crate::image::volume::VoxelImage;
use crate::ops::registry::OpSpec;
use std::sync::Arc;

/// Distribution of a per-voxel random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomKind {
    /// Uniform on [0, 1).
    Uniform,
    /// Standard normal.
    Normal,
}

/// Scratch-slot template for one leaf, in traversal order.
///
/// Workers instantiate their private slot vector from this plan: a
/// chunk-sized buffer for image and random leaves, a broadcast value for
/// scalar leaves.
#[derive(Debug, Clone)]
pub enum LeafPlan {
    /// An opened image shared between workers.
    Image(Arc<VoxelImage>),
    /// A per-worker random source.
    Random(RandomKind),
    /// A literal installed once at worker start.
    Scalar(Scalar),
}

/// An image leaf of the expression tree.
#[derive(Debug, Clone)]
pub struct ImageLeaf {
    /// The opened image, shared with the leaf cache and other leaves.
    pub image: Arc<VoxelImage>,
    /// Complex flag carried from the file's declared datatype.
    pub complex: bool,
    /// Scratch slot index, assigned after the tree is complete.
    pub slot: usize,
}

/// An operator node.
#[derive(Debug, Clone)]
pub struct OpNode {
    /// Catalogue entry.
    pub spec: &'static OpSpec,
    /// Operand subtrees, in stack order.
    pub children: Vec<Expr>,
    /// Whether any operand is complex; selects the R or Z kernel.
    pub operands_complex: bool,
    /// Whether this node's result is complex: RtoZ, or any complex
    /// operand without ZtoR.
    pub result_complex: bool,
}

/// A node of the expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A scalar literal.
    Scalar {
        /// The literal value.
        value: Scalar,
        /// Scratch slot index holding the broadcast value.
        slot: usize,
    },
    /// A per-voxel random source.
    Random {
        /// Which distribution to draw from.
        kind: RandomKind,
        /// Scratch slot index of the draw buffer.
        slot: usize,
    },
    /// An image operand.
    Image(ImageLeaf),
    /// An operator applied to 1..3 operands.
    Op(OpNode),
}

impl Expr {
    /// Create a scalar leaf; its slot is assigned later.
    pub fn scalar(value: Scalar) -> Self {
        Expr::Scalar { value, slot: 0 }
    }

    /// Create a random leaf; its slot is assigned later.
    pub fn random(kind: RandomKind) -> Self {
        Expr::Random { kind, slot: 0 }
    }

    /// Whether this subtree produces complex values.
    pub fn is_complex(&self) -> bool {
        match self {
            Expr::Scalar { value, .. } => !is_real(*value),
            Expr::Random { .. } => false,
            Expr::Image(leaf) => leaf.complex,
            Expr::Op(op) => op.result_complex,
        }
    }

    /// Whether any image leaf appears in this subtree.
    pub fn contains_image(&self) -> bool {
        match self {
            Expr::Image(_) => true,
            Expr::Op(op) => op.children.iter().any(Expr::contains_image),
            _ => false,
        }
    }

    /// All image leaves in pre-order.
    pub fn images(&self) -> Vec<&ImageLeaf> {
        let mut leaves = Vec::new();
        self.collect_images(&mut leaves);
        leaves
    }

    fn collect_images<'a>(&'a self, leaves: &mut Vec<&'a ImageLeaf>) {
        match self {
            Expr::Image(leaf) => leaves.push(leaf),
            Expr::Op(op) => {
                for c in &op.children {
                    c.collect_images(leaves);
                }
            }
            _ => {}
        }
    }

    /// Assign scratch slot indices to every leaf in pre-order and return
    /// the matching slot plan.
    pub fn assign_slots(&mut self) -> Vec<LeafPlan> {
        let mut plan = Vec::new();
        self.assign_into(&mut plan);
        plan
    }

    fn assign_into(&mut self, plan: &mut Vec<LeafPlan>) {
        match self {
            Expr::Scalar { value, slot } => {
                *slot = plan.len();
                plan.push(LeafPlan::Scalar(*value));
            }
            Expr::Random { kind, slot } => {
                *slot = plan.len();
                plan.push(LeafPlan::Random(*kind));
            }
            Expr::Image(leaf) => {
                leaf.slot = plan.len();
                plan.push(LeafPlan::Image(leaf.image.clone()));
            }
            Expr::Op(op) => {
                for c in &mut op.children {
                    c.assign_into(plan);
                }
            }
        }
    }

    /// Human-readable rendering of the expression, used as the progress
    /// label.
    pub fn provenance(&self) -> String {
        match self {
            Expr::Scalar { value, .. } => format_scalar(*value),
            Expr::Random {
                kind: RandomKind::Uniform,
                ..
            } => "rand()".to_string(),
            Expr::Random {
                kind: RandomKind::Normal,
                ..
            } => "randn()".to_string(),
            Expr::Image(leaf) => leaf.image.path.clone(),
            Expr::Op(op) => {
                let mut s = op.spec.format.to_string();
                for (n, c) in op.children.iter().enumerate() {
                    substitute(&mut s, n, &c.provenance());
                }
                s
            }
        }
    }
}

/// Substitute operand `n` (0-based) into a format string.
///
/// When the format is itself parenthesised, a parenthesised placeholder
/// `(%i)` is replaced whole, collapsing redundant parentheses; otherwise
/// the bare `%i` placeholder is replaced.
fn substitute(orig: &mut String, n: usize, value: &str) {
    let placeholder = format!("%{}", n + 1);
    if orig.starts_with('(') && orig.ends_with(')') {
        let wrapped = format!("({placeholder})");
        if let Some(pos) = orig.find(&wrapped) {
            orig.replace_range(pos..pos + wrapped.len(), value);
            return;
        }
    }
    if let Some(pos) = orig.find(&placeholder) {
        orig.replace_range(pos..pos + placeholder.len(), value);
    }
}
