//! Recursive tile evaluation.
//!
//! Evaluates the tree bottom-up over one tile. Leaves refresh their
//! scratch slot and hand back its index; operator nodes apply their
//! kernel element-wise, writing **in place** into the leftmost
//! non-broadcast child chunk. When every child is a broadcast scalar the
//! kernel runs once and the result stays a broadcast value.
//!
//! Kernel choice (R vs Z) comes from the node's cached operand bit, never
//! from inspecting values at runtime.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::Scalar;
use crate::eval::scratch::WorkerScratch;
use crate::expr::node::{Expr, OpNode};
use crate::ops::registry::Kernels;

/// Where an evaluated subtree's values live.
#[derive(Debug, Clone, Copy)]
pub enum EvalRef {
    /// A scratch slot holding a full tile.
    Slot(usize),
    /// A single value broadcast over the tile.
    Value(Scalar),
}

/// Evaluate a subtree for the tile at the given outer position.
pub fn evaluate(
    node: &Expr,
    scratch: &mut WorkerScratch,
    outer: &[usize],
) -> CalcResult<EvalRef> {
    match node {
        Expr::Scalar { value, .. } => Ok(EvalRef::Value(*value)),
        Expr::Random { slot, .. } => {
            scratch.fill_random(*slot);
            Ok(EvalRef::Slot(*slot))
        }
        Expr::Image(leaf) => {
            scratch.refresh_image(leaf.slot, outer);
            Ok(EvalRef::Slot(leaf.slot))
        }
        Expr::Op(op) => {
            let mut refs = [EvalRef::Value(Scalar::new(0.0, 0.0)); 3];
            for (i, child) in op.children.iter().enumerate() {
                refs[i] = evaluate(child, scratch, outer)?;
            }
            apply_elementwise(op, &refs[..op.children.len()], scratch)
        }
    }
}

#[inline]
fn operand(scratch: &WorkerScratch, r: EvalRef, n: usize) -> Scalar {
    match r {
        EvalRef::Value(v) => v,
        EvalRef::Slot(s) => scratch.get(s, n),
    }
}

fn apply_elementwise(
    op: &OpNode,
    refs: &[EvalRef],
    scratch: &mut WorkerScratch,
) -> CalcResult<EvalRef> {
    // All operands broadcast: one kernel application, result broadcast.
    if refs.iter().all(|r| matches!(r, EvalRef::Value(_))) {
        let args: Vec<Scalar> = refs
            .iter()
            .map(|r| operand(scratch, *r, 0))
            .collect();
        return Ok(EvalRef::Value(op.spec.apply(&args)?));
    }

    let dest = refs
        .iter()
        .find_map(|r| match r {
            EvalRef::Slot(s) => Some(*s),
            EvalRef::Value(_) => None,
        })
        .ok_or_else(|| CalcError::OperationNotSupported {
            op: op.spec.name.to_string(),
        })?;

    let len = scratch.tile_len();
    let unsupported = || CalcError::OperationNotSupported {
        op: op.spec.name.to_string(),
    };

    match op.spec.kernels {
        Kernels::Unary { r, z } => {
            if op.operands_complex {
                let f = z.ok_or_else(unsupported)?;
                for n in 0..len {
                    let a = operand(scratch, refs[0], n);
                    scratch.set(dest, n, f(a));
                }
            } else {
                let f = r.ok_or_else(unsupported)?;
                for n in 0..len {
                    let a = operand(scratch, refs[0], n);
                    scratch.set(dest, n, f(a.re));
                }
            }
        }
        Kernels::Binary { r, z } => {
            if op.operands_complex {
                let f = z.ok_or_else(unsupported)?;
                for n in 0..len {
                    let a = operand(scratch, refs[0], n);
                    let b = operand(scratch, refs[1], n);
                    scratch.set(dest, n, f(a, b));
                }
            } else {
                let f = r.ok_or_else(unsupported)?;
                for n in 0..len {
                    let a = operand(scratch, refs[0], n);
                    let b = operand(scratch, refs[1], n);
                    scratch.set(dest, n, f(a.re, b.re));
                }
            }
        }
        Kernels::Ternary { r, z } => {
            if op.operands_complex {
                let f = z.ok_or_else(unsupported)?;
                for n in 0..len {
                    let a = operand(scratch, refs[0], n);
                    let b = operand(scratch, refs[1], n);
                    let c = operand(scratch, refs[2], n);
                    scratch.set(dest, n, f(a, b, c));
                }
            } else {
                let f = r.ok_or_else(unsupported)?;
                for n in 0..len {
                    let a = operand(scratch, refs[0], n);
                    let b = operand(scratch, refs[1], n);
                    let c = operand(scratch, refs[2], n);
                    scratch.set(dest, n, f(a.re, b.re, c.re));
                }
            }
        }
    }

    Ok(EvalRef::Slot(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{re, DataType};
    use crate::expr::node::{ImageLeaf, OpNode, RandomKind};
    use crate::image::header::ImageHeader;
    use crate::image::volume::VoxelImage;
    use crate::ops::registry::registry;
    use std::sync::Arc;

    fn image(sizes: Vec<usize>, values: Vec<f32>) -> Expr {
        let header = ImageHeader::new(sizes, DataType::Float32).unwrap();
        let data = values.into_iter().map(re).collect();
        let image = Arc::new(VoxelImage::from_parts("t.mif", header, data).unwrap());
        Expr::Image(ImageLeaf {
            image,
            complex: false,
            slot: 0,
        })
    }

    fn op(name: &str, children: Vec<Expr>) -> Expr {
        let spec = registry().get(name).unwrap();
        let operands_complex = children.iter().any(Expr::is_complex);
        Expr::Op(OpNode {
            spec,
            children,
            operands_complex,
            result_complex: spec.rtoz || (!spec.ztor && operands_complex),
        })
    }

    fn eval_tile(mut tree: Expr, inner: [usize; 2]) -> (Vec<Scalar>, Expr) {
        let plan = tree.assign_slots();
        let mut scratch = WorkerScratch::new(&plan, inner);
        let r = evaluate(&tree, &mut scratch, &[]).unwrap();
        let out = match r {
            EvalRef::Slot(s) => scratch.chunk_data(s).to_vec(),
            EvalRef::Value(v) => vec![v; inner[0] * inner[1]],
        };
        (out, tree)
    }

    #[test]
    fn test_image_times_scalar() {
        let tree = op(
            "multiply",
            vec![image(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]), Expr::scalar(re(2.0))],
        );
        let (out, _) = eval_tile(tree, [2, 2]);
        let got: Vec<f32> = out.iter().map(|v| v.re).collect();
        assert_eq!(got, vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_neg_exp_chain() {
        // exp(-a) for a = [[1,0],[-1,0]] (axis 0 fastest: 1, 0, -1, 0).
        let tree = op(
            "exp",
            vec![op("neg", vec![image(vec![2, 2], vec![1.0, 0.0, -1.0, 0.0])])],
        );
        let (out, _) = eval_tile(tree, [2, 2]);
        let e = std::f32::consts::E;
        let expected = [1.0 / e, 1.0, e, 1.0];
        for (got, want) in out.iter().zip(expected) {
            assert!((got.re - want).abs() < 1e-6);
            assert_eq!(got.im, 0.0);
        }
    }

    #[test]
    fn test_in_place_reuse_prefers_leftmost_chunk() {
        // scalar + image: the image chunk (rightmost) is the only
        // non-broadcast operand and receives the result.
        let tree = op(
            "add",
            vec![Expr::scalar(re(10.0)), image(vec![2, 1], vec![1.0, 2.0])],
        );
        let (out, tree) = eval_tile(tree, [2, 1]);
        let got: Vec<f32> = out.iter().map(|v| v.re).collect();
        assert_eq!(got, vec![11.0, 12.0]);

        // The image leaf holds slot 1; the result must have landed there.
        let Expr::Op(node) = &tree else { panic!() };
        let Expr::Image(leaf) = &node.children[1] else { panic!() };
        assert_eq!(leaf.slot, 1);
    }

    #[test]
    fn test_if_selects_elementwise() {
        let cond = image(vec![4], vec![1.0, 0.0, 5.0, 0.0]);
        let tree = op(
            "if",
            vec![cond, Expr::scalar(re(7.0)), Expr::scalar(re(9.0))],
        );
        let (out, _) = eval_tile(tree, [4, 1]);
        let got: Vec<f32> = out.iter().map(|v| v.re).collect();
        assert_eq!(got, vec![7.0, 9.0, 7.0, 9.0]);
    }

    #[test]
    fn test_all_broadcast_children_fold_to_value() {
        let mut tree = op("add", vec![Expr::scalar(re(1.0)), Expr::scalar(re(2.0))]);
        let plan = tree.assign_slots();
        let mut scratch = WorkerScratch::new(&plan, [2, 2]);
        let r = evaluate(&tree, &mut scratch, &[]).unwrap();
        assert!(matches!(r, EvalRef::Value(v) if v == re(3.0)));
    }

    #[test]
    fn test_real_of_complex_is_identity_elementwise() {
        // real(complex(a, 0)) == a: the complex node is RtoZ, so the
        // enclosing real dispatches to its Z kernel even though every
        // stored imaginary part is zero.
        let a = image(vec![2, 2], vec![1.0, -2.5, 0.0, 4.0]);
        let tree = op("real", vec![op("complex", vec![a, Expr::scalar(re(0.0))])]);
        assert!(!tree.is_complex());
        let (out, _) = eval_tile(tree, [2, 2]);
        let got: Vec<f32> = out.iter().map(|v| v.re).collect();
        assert_eq!(got, vec![1.0, -2.5, 0.0, 4.0]);
    }

    #[test]
    fn test_random_source_fills_tile() {
        let tree = op(
            "multiply",
            vec![Expr::random(RandomKind::Uniform), Expr::scalar(re(1.0))],
        );
        let (out, _) = eval_tile(tree, [8, 8]);
        assert!(out.iter().all(|v| v.re >= 0.0 && v.re < 1.0));
        // Draws must not all collapse to one value.
        let first = out[0].re;
        assert!(out.iter().any(|v| v.re != first));
    }
}
