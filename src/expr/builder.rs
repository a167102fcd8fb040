//! The stack-machine expression builder.
//!
//! Consumes a linear stream of operand strings and operator applications.
//! Operand tokens stay unresolved on the stack until an operator needs
//! them: resolution probes the token as an image path first (through the
//! builder-local leaf cache), then as a reserved word, then as a numeric
//! literal. When every operand of an operator is a scalar literal the
//! result is folded eagerly; otherwise an operator node is pushed.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::{parse_scalar, re, Real, Scalar};
use crate::expr::node::{Expr, ImageLeaf, LeafPlan, OpNode, RandomKind};
use crate::image::format;
use crate::image::volume::VoxelImage;
use crate::ops::registry::OpSpec;
use indexmap::IndexMap;
use std::sync::Arc;

/// One stack entry: a raw operand string, or a resolved expression node.
#[derive(Debug)]
enum StackEntry {
    Raw(String),
    Node(Expr),
}

/// The result of building a complete token stream.
#[derive(Debug)]
pub enum Program {
    /// Calculator mode: no image leaves, the expression folded to a
    /// single scalar.
    Value(Scalar),
    /// Image mode: an expression over at least one image, plus the
    /// trailing output path.
    Image {
        /// Root of the expression tree, slots assigned.
        root: Expr,
        /// Scratch slot plan in leaf traversal order.
        plan: Vec<LeafPlan>,
        /// Path the result is written to.
        output: String,
    },
}

/// Stack machine building an expression tree from postfix tokens.
pub struct ExpressionBuilder {
    stack: Vec<StackEntry>,
    // Keyed by the operand string; repeated operands share one handle.
    cache: IndexMap<String, Arc<VoxelImage>>,
}

impl ExpressionBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            cache: IndexMap::new(),
        }
    }

    /// Push an operand token. It is not inspected until an operator (or
    /// the end of the stream) needs it.
    pub fn push_operand(&mut self, token: &str) {
        self.stack.push(StackEntry::Raw(token.to_string()));
    }

    /// Apply an operator to the top of the stack.
    pub fn apply(&mut self, spec: &'static OpSpec) -> CalcResult<()> {
        let k = spec.arity();
        if self.stack.len() < k {
            return Err(CalcError::StackUnderflow {
                op: spec.name.to_string(),
                needed: k,
                found: self.stack.len(),
            });
        }
        let base = self.stack.len() - k;
        for i in base..self.stack.len() {
            self.resolve_at(i)?;
        }

        let mut children = Vec::with_capacity(k);
        for entry in self.stack.drain(base..) {
            match entry {
                StackEntry::Node(x) => children.push(x),
                StackEntry::Raw(token) => return Err(CalcError::Parse { token }),
            }
        }

        let all_literal = children.iter().all(|e| matches!(e, Expr::Scalar { .. }));
        if all_literal {
            let args: Vec<Scalar> = children
                .iter()
                .map(|e| match e {
                    Expr::Scalar { value, .. } => *value,
                    _ => re(0.0),
                })
                .collect();
            let folded = spec.apply(&args)?;
            self.stack.push(StackEntry::Node(Expr::scalar(folded)));
            return Ok(());
        }

        let operands_complex = children.iter().any(|e| e.is_complex());
        if !spec.supports(operands_complex) {
            return Err(CalcError::OperationNotSupported {
                op: spec.name.to_string(),
            });
        }
        let result_complex = spec.rtoz || (!spec.ztor && operands_complex);
        self.stack.push(StackEntry::Node(Expr::Op(OpNode {
            spec,
            children,
            operands_complex,
            result_complex,
        })));
        Ok(())
    }

    /// Finish the stream and check the terminal stack shape.
    pub fn finish(mut self) -> CalcResult<Program> {
        if self.stack.is_empty() {
            return Err(CalcError::StackImbalance { remaining: 0 });
        }
        self.resolve_at(0)?;

        let has_images = match &self.stack[0] {
            StackEntry::Node(e) => e.contains_image(),
            StackEntry::Raw(_) => false,
        };

        if !has_images {
            if self.stack.len() == 1 {
                if let StackEntry::Node(Expr::Scalar { value, .. }) = &self.stack[0] {
                    return Ok(Program::Value(*value));
                }
            }
            return Err(CalcError::StackImbalance {
                remaining: self.stack.len(),
            });
        }

        if self.stack.len() == 1 {
            return Err(CalcError::OutputNotSpecified);
        }
        if self.stack.len() > 2 {
            return Err(CalcError::StackImbalance {
                remaining: self.stack.len(),
            });
        }

        let output_entry = self.stack.pop();
        let root_entry = self.stack.pop();
        match (root_entry, output_entry) {
            (Some(StackEntry::Node(mut root)), Some(StackEntry::Raw(output))) => {
                let plan = root.assign_slots();
                Ok(Program::Image { root, plan, output })
            }
            // The trailing entry was already consumed as an operand, so
            // nothing names the output image.
            _ => Err(CalcError::OutputNotSpecified),
        }
    }

    fn resolve_at(&mut self, i: usize) -> CalcResult<()> {
        if let StackEntry::Raw(token) = &self.stack[i] {
            let token = token.clone();
            let node = self.resolve_token(&token)?;
            self.stack[i] = StackEntry::Node(node);
        }
        Ok(())
    }

    /// Resolution order: cached image, fresh image open, reserved word,
    /// random source, numeric literal. Anything else is a parse error.
    fn resolve_token(&mut self, token: &str) -> CalcResult<Expr> {
        if let Some(image) = self.cache.get(token) {
            return Ok(Expr::Image(ImageLeaf {
                complex: image.header.is_complex(),
                image: image.clone(),
                slot: 0,
            }));
        }
        if let Ok(image) = format::open(token) {
            let image = Arc::new(image);
            self.cache.insert(token.to_string(), image.clone());
            return Ok(Expr::Image(ImageLeaf {
                complex: image.header.is_complex(),
                image,
                slot: 0,
            }));
        }
        match token.to_lowercase().as_str() {
            "nan" => return Ok(Expr::scalar(re(Real::NAN))),
            "-nan" => return Ok(Expr::scalar(re(-Real::NAN))),
            "inf" => return Ok(Expr::scalar(re(Real::INFINITY))),
            "-inf" => return Ok(Expr::scalar(re(Real::NEG_INFINITY))),
            "rand" => return Ok(Expr::random(RandomKind::Uniform)),
            "randn" => return Ok(Expr::random(RandomKind::Normal)),
            _ => {}
        }
        match parse_scalar(token) {
            Some(v) => Ok(Expr::scalar(v)),
            None => Err(CalcError::Parse {
                token: token.to_string(),
            }),
        }
    }

    /// Number of distinct images opened so far.
    pub fn cached_image_count(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{format_scalar, DataType};
    use crate::image::header::ImageHeader;
    use crate::ops::registry::registry;
    use tempfile::TempDir;

    /// Feed a token stream the way the CLI does: tokens with a leading
    /// dash that name a catalogue operator are applied, everything else
    /// is an operand.
    fn build(tokens: &[&str]) -> CalcResult<Program> {
        let mut builder = ExpressionBuilder::new();
        for t in tokens {
            match t.strip_prefix('-').and_then(|name| registry().get(name)) {
                Some(spec) => builder.apply(spec)?,
                None => builder.push_operand(t),
            }
        }
        builder.finish()
    }

    fn write_image(dir: &TempDir, name: &str, sizes: Vec<usize>, values: &[f32]) -> String {
        let header = ImageHeader::new(sizes, DataType::Float32).unwrap();
        let data: Vec<Scalar> = values.iter().map(|&v| re(v)).collect();
        let path = dir.path().join(name);
        let path = path.to_str().unwrap().to_string();
        format::save(&path, &header, &data, false).unwrap();
        path
    }

    #[test]
    fn test_scalar_folding() {
        let Program::Value(v) = build(&["3", "2", "-multiply"]).unwrap() else {
            panic!("expected calculator mode");
        };
        assert_eq!(v, re(6.0));
    }

    #[test]
    fn test_folding_matches_direct_kernel_application() {
        // 9.3 * exp(-1 / 2)
        let Program::Value(v) =
            build(&["1", "-neg", "2", "-divide", "-exp", "9.3", "-multiply"]).unwrap()
        else {
            panic!("expected calculator mode");
        };
        let expected = 9.3 * (-0.5f32).exp();
        assert!((v.re - expected).abs() < 1e-6);
        assert_eq!(v.im, 0.0);
    }

    #[test]
    fn test_complex_folding() {
        // |2 + 3i| = sqrt(13)
        let Program::Value(v) = build(&["2", "3", "-complex", "-abs"]).unwrap() else {
            panic!("expected calculator mode");
        };
        assert!((v.re - 13.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(v.im, 0.0);
    }

    #[test]
    fn test_real_of_complex_roundtrip() {
        let Program::Value(v) = build(&["1.5", "2", "-complex", "-real"]).unwrap() else {
            panic!();
        };
        assert_eq!(v, re(1.5));

        // A folded complex value with zero imaginary part is real again,
        // so the Z-only `real` operator rejects it.
        assert!(matches!(
            build(&["1.5", "0", "-complex", "-real"]),
            Err(CalcError::OperationNotSupported { .. })
        ));
    }

    #[test]
    fn test_double_negation_identity() {
        for input in ["2.5", "-3", "0"] {
            let Program::Value(v) = build(&[input, "-neg", "-neg"]).unwrap() else {
                panic!();
            };
            assert_eq!(format_scalar(v), input.trim_start_matches('+'));
        }
    }

    #[test]
    fn test_reserved_words() {
        let Program::Value(v) = build(&["NaN", "-isnan"]).unwrap() else {
            panic!();
        };
        assert_eq!(v, re(1.0));

        let Program::Value(v) = build(&["inf", "-isinf"]).unwrap() else {
            panic!();
        };
        assert_eq!(v, re(1.0));

        let Program::Value(v) = build(&["nan", "-finite"]).unwrap() else {
            panic!();
        };
        assert_eq!(v, re(0.0));

        let Program::Value(v) = build(&["0", "-isnan"]).unwrap() else {
            panic!();
        };
        assert_eq!(v, re(0.0));
    }

    #[test]
    fn test_stack_underflow() {
        assert!(matches!(
            build(&["3", "-add"]),
            Err(CalcError::StackUnderflow { needed: 2, found: 1, .. })
        ));
        assert!(matches!(
            build(&["-neg"]),
            Err(CalcError::StackUnderflow { .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            build(&["no_such_file.mif", "-neg"]),
            Err(CalcError::Parse { .. })
        ));
    }

    #[test]
    fn test_unsupported_on_complex_literal() {
        assert!(matches!(
            build(&["1", "2", "-complex", "-round"]),
            Err(CalcError::OperationNotSupported { .. })
        ));
        assert!(matches!(
            build(&["1", "2", "-complex", "3", "-min"]),
            Err(CalcError::OperationNotSupported { .. })
        ));
        // conj has no real-domain kernel.
        assert!(matches!(
            build(&["2", "-conj"]),
            Err(CalcError::OperationNotSupported { .. })
        ));
    }

    #[test]
    fn test_imbalance_with_leftover_scalars() {
        assert!(matches!(
            build(&["1", "2"]),
            Err(CalcError::StackImbalance { remaining: 2 })
        ));
        assert!(matches!(build(&[]), Err(CalcError::StackImbalance { remaining: 0 })));
    }

    #[test]
    fn test_random_root_is_not_a_scalar() {
        // rand alone has no image leaves and is not a foldable scalar.
        assert!(matches!(
            build(&["rand", "out.mif"]),
            Err(CalcError::StackImbalance { .. })
        ));
    }

    #[test]
    fn test_image_expression_keeps_output_path() {
        let dir = TempDir::new().unwrap();
        let a = write_image(&dir, "a.mif", vec![2, 2], &[1.0, 2.0, 3.0, 4.0]);

        let Program::Image { root, plan, output } =
            build(&[&a, "2", "-multiply", "out.mif"]).unwrap()
        else {
            panic!("expected image mode");
        };
        assert_eq!(output, "out.mif");
        assert_eq!(plan.len(), 2);
        assert!(root.contains_image());
        assert!(!root.is_complex());
        assert_eq!(root.provenance(), format!("({a} * 2)"));
    }

    #[test]
    fn test_missing_output_path() {
        let dir = TempDir::new().unwrap();
        let a = write_image(&dir, "a.mif", vec![2], &[1.0, 2.0]);
        assert!(matches!(
            build(&[&a, "-neg"]),
            Err(CalcError::OutputNotSpecified)
        ));
    }

    #[test]
    fn test_leaf_cache_deduplicates() {
        let dir = TempDir::new().unwrap();
        let a = write_image(&dir, "a.mif", vec![2], &[1.0, 2.0]);

        let mut builder = ExpressionBuilder::new();
        builder.push_operand(&a);
        builder.push_operand(&a);
        builder.apply(registry().get("add").unwrap()).unwrap();
        assert_eq!(builder.cached_image_count(), 1);

        builder.push_operand("out.mif");
        let Program::Image { root, .. } = builder.finish().unwrap() else {
            panic!();
        };
        let images = root.images();
        assert_eq!(images.len(), 2);
        assert!(Arc::ptr_eq(&images[0].image, &images[1].image));
    }

    #[test]
    fn test_bare_image_copy() {
        let dir = TempDir::new().unwrap();
        let a = write_image(&dir, "a.mif", vec![3], &[1.0, 2.0, 3.0]);
        let Program::Image { root, plan, output } = build(&[&a, "out.mif"]).unwrap() else {
            panic!();
        };
        assert!(matches!(root, Expr::Image(_)));
        assert_eq!(plan.len(), 1);
        assert_eq!(output, "out.mif");
    }
}
