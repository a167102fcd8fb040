//! The operator catalogue.
//!
//! A closed registry of unary, binary and ternary operators. Each entry
//! declares its name, a help description, a provenance format string
//! (`%1`..`%3` placeholders), whether a complex input yields a real
//! output (ZtoR) or real inputs yield a complex output (RtoZ), and up to
//! two kernels: the real-domain `R` form and the complex-domain `Z` form.
//! A missing kernel means the operator does not exist in that domain and
//! applying it there is an error.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::{is_real, Real, Scalar};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Real-domain unary kernel.
pub type UnaryR = fn(Real) -> Scalar;
/// Complex-domain unary kernel.
pub type UnaryZ = fn(Scalar) -> Scalar;
/// Real-domain binary kernel.
pub type BinaryR = fn(Real, Real) -> Scalar;
/// Complex-domain binary kernel.
pub type BinaryZ = fn(Scalar, Scalar) -> Scalar;
/// Real-domain ternary kernel.
pub type TernaryR = fn(Real, Real, Real) -> Scalar;
/// Complex-domain ternary kernel.
pub type TernaryZ = fn(Scalar, Scalar, Scalar) -> Scalar;

/// The kernel pair of an operator, by arity.
#[derive(Debug, Clone, Copy)]
pub enum Kernels {
    /// One operand.
    Unary {
        /// Real-domain form, if it exists.
        r: Option<UnaryR>,
        /// Complex-domain form, if it exists.
        z: Option<UnaryZ>,
    },
    /// Two operands.
    Binary {
        /// Real-domain form, if it exists.
        r: Option<BinaryR>,
        /// Complex-domain form, if it exists.
        z: Option<BinaryZ>,
    },
    /// Three operands.
    Ternary {
        /// Real-domain form, if it exists.
        r: Option<TernaryR>,
        /// Complex-domain form, if it exists.
        z: Option<TernaryZ>,
    },
}

/// One catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct OpSpec {
    /// Operator identifier, as typed on the command line.
    pub name: &'static str,
    /// One-line description for the help listing.
    pub description: &'static str,
    /// Provenance format string with `%1`..`%3` placeholders.
    pub format: &'static str,
    /// Complex input yields a real output.
    pub ztor: bool,
    /// Real inputs yield a complex output.
    pub rtoz: bool,
    /// The kernel pair.
    pub kernels: Kernels,
}

impl OpSpec {
    /// Number of operands the operator consumes.
    pub fn arity(&self) -> usize {
        match self.kernels {
            Kernels::Unary { .. } => 1,
            Kernels::Binary { .. } => 2,
            Kernels::Ternary { .. } => 3,
        }
    }

    /// Whether the kernel required for the given operand domain exists.
    pub fn supports(&self, operands_complex: bool) -> bool {
        match self.kernels {
            Kernels::Unary { r, z } => {
                if operands_complex {
                    z.is_some()
                } else {
                    r.is_some()
                }
            }
            Kernels::Binary { r, z } => {
                if operands_complex {
                    z.is_some()
                } else {
                    r.is_some()
                }
            }
            Kernels::Ternary { r, z } => {
                if operands_complex {
                    z.is_some()
                } else {
                    r.is_some()
                }
            }
        }
    }

    /// Apply the operator to fully resolved scalar operands.
    ///
    /// Used for eager constant folding in the builder and for broadcast
    /// results in the evaluator. The R kernel is chosen when every
    /// operand is real, else the Z kernel; a missing kernel is
    /// `OperationNotSupported`.
    pub fn apply(&self, args: &[Scalar]) -> CalcResult<Scalar> {
        debug_assert_eq!(args.len(), self.arity());
        let all_real = args.iter().all(|&v| is_real(v));
        let unsupported = || CalcError::OperationNotSupported {
            op: self.name.to_string(),
        };
        match self.kernels {
            Kernels::Unary { r, z } => {
                if all_real {
                    Ok(r.ok_or_else(unsupported)?(args[0].re))
                } else {
                    Ok(z.ok_or_else(unsupported)?(args[0]))
                }
            }
            Kernels::Binary { r, z } => {
                if all_real {
                    Ok(r.ok_or_else(unsupported)?(args[0].re, args[1].re))
                } else {
                    Ok(z.ok_or_else(unsupported)?(args[0], args[1]))
                }
            }
            Kernels::Ternary { r, z } => {
                if all_real {
                    Ok(r.ok_or_else(unsupported)?(args[0].re, args[1].re, args[2].re))
                } else {
                    Ok(z.ok_or_else(unsupported)?(args[0], args[1], args[2]))
                }
            }
        }
    }
}

/// Registry of all catalogue operators, in registration order.
pub struct OpRegistry {
    ops: IndexMap<&'static str, OpSpec>,
}

impl OpRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            ops: IndexMap::new(),
        }
    }

    /// Create a registry holding the full built-in catalogue.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::ops::unary::register(&mut registry);
        crate::ops::binary::register(&mut registry);
        crate::ops::ternary::register(&mut registry);
        registry
    }

    /// Register one operator.
    pub fn register(&mut self, spec: OpSpec) {
        self.ops.insert(spec.name, spec);
    }

    /// Look up an operator by name.
    pub fn get(&self, name: &str) -> Option<&OpSpec> {
        self.ops.get(name)
    }

    /// Whether the name is a catalogue operator.
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when no operators are registered.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// All operators in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OpSpec> {
        self.ops.values()
    }

    /// Operators grouped by arity, for the help listing.
    pub fn grouped_by_arity(&self) -> Vec<(&'static str, Vec<&OpSpec>)> {
        let groups: [(usize, &'static str); 3] = [
            (1, "Unary operators"),
            (2, "Binary operators"),
            (3, "Ternary operators"),
        ];
        groups
            .iter()
            .map(|&(arity, title)| {
                let ops = self.ops.values().filter(|s| s.arity() == arity).collect();
                (title, ops)
            })
            .collect()
    }
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

static REGISTRY: Lazy<OpRegistry> = Lazy::new(OpRegistry::with_builtins);

/// The process-wide catalogue.
pub fn registry() -> &'static OpRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::re;

    #[test]
    fn test_catalogue_is_complete() {
        let reg = registry();
        for name in [
            "abs", "neg", "sqrt", "exp", "log", "log10", "cos", "sin", "tan", "cosh", "sinh",
            "tanh", "acos", "asin", "atan", "acosh", "asinh", "atanh", "round", "ceil", "floor",
            "real", "imag", "phase", "conj", "isnan", "isinf", "finite", "add", "subtract",
            "multiply", "divide", "pow", "min", "max", "lt", "gt", "le", "ge", "eq", "neq",
            "complex", "if",
        ] {
            assert!(reg.contains(name), "missing operator {name}");
        }
        assert_eq!(reg.len(), 43);
    }

    #[test]
    fn test_arity_groups() {
        let reg = registry();
        assert_eq!(reg.get("abs").unwrap().arity(), 1);
        assert_eq!(reg.get("add").unwrap().arity(), 2);
        assert_eq!(reg.get("if").unwrap().arity(), 3);

        let grouped = reg.grouped_by_arity();
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].1.len(), 28);
        assert_eq!(grouped[1].1.len(), 14);
        assert_eq!(grouped[2].1.len(), 1);
    }

    #[test]
    fn test_flags() {
        let reg = registry();
        assert!(reg.get("abs").unwrap().ztor);
        assert!(!reg.get("abs").unwrap().rtoz);
        assert!(reg.get("complex").unwrap().rtoz);
        assert!(reg.get("real").unwrap().ztor);
        assert!(!reg.get("conj").unwrap().ztor);
        assert!(reg.get("eq").unwrap().ztor);
        assert!(!reg.get("add").unwrap().ztor);
    }

    #[test]
    fn test_real_only_operators_reject_complex() {
        let reg = registry();
        assert!(!reg.get("round").unwrap().supports(true));
        assert!(!reg.get("min").unwrap().supports(true));
        assert!(!reg.get("acos").unwrap().supports(true));
        assert!(reg.get("sqrt").unwrap().supports(true));
        // Z-only operators reject real operands.
        assert!(!reg.get("conj").unwrap().supports(false));
        assert!(!reg.get("real").unwrap().supports(false));
    }

    #[test]
    fn test_apply_dispatch() {
        let reg = registry();
        let mult = reg.get("multiply").unwrap();
        assert_eq!(mult.apply(&[re(3.0), re(2.0)]).unwrap(), re(6.0));

        let cx = reg.get("complex").unwrap();
        let v = cx.apply(&[re(2.0), re(3.0)]).unwrap();
        assert_eq!(v, Scalar::new(2.0, 3.0));

        let abs = reg.get("abs").unwrap();
        let m = abs.apply(&[v]).unwrap();
        assert!((m.re - 13.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(m.im, 0.0);

        // round has no Z kernel
        let round = reg.get("round").unwrap();
        assert!(round.apply(&[Scalar::new(1.0, 1.0)]).is_err());
    }
}
