//! Binary operator kernels.
//!
//! Comparisons and `min`/`max` are real-only; applying them to a complex
//! operand is rejected when the operator node is built. Equality exists in
//! both domains and always yields a real truth value.

use crate::core::types::{re, Real, Scalar};
use crate::ops::registry::{BinaryR, BinaryZ, Kernels, OpRegistry, OpSpec};

/// Register all binary operators.
pub fn register(registry: &mut OpRegistry) {
    let binary = |name: &'static str,
                  description: &'static str,
                  format: &'static str,
                  ztor: bool,
                  rtoz: bool,
                  r: Option<BinaryR>,
                  z: Option<BinaryZ>| OpSpec {
        name,
        description,
        format,
        ztor,
        rtoz,
        kernels: Kernels::Binary { r, z },
    };

    registry.register(binary("add", "add values", "(%1 + %2)", false, false, Some(add_r), Some(add_z)));
    registry.register(binary("subtract", "subtract nth operand from (n-1)th", "(%1 - %2)", false, false, Some(subtract_r), Some(subtract_z)));
    registry.register(binary("multiply", "multiply values", "(%1 * %2)", false, false, Some(multiply_r), Some(multiply_z)));
    registry.register(binary("divide", "divide (n-1)th operand by nth", "(%1 / %2)", false, false, Some(divide_r), Some(divide_z)));
    registry.register(binary("pow", "raise (n-1)th operand to nth power", "%1^%2", false, false, Some(pow_r), Some(pow_z)));

    registry.register(binary("min", "smallest of last two operands", "min (%1, %2)", false, false, Some(min_r), None));
    registry.register(binary("max", "greatest of last two operands", "max (%1, %2)", false, false, Some(max_r), None));
    registry.register(binary("lt", "less-than operator (true=1, false=0)", "(%1 < %2)", false, false, Some(lt_r), None));
    registry.register(binary("gt", "greater-than operator (true=1, false=0)", "(%1 > %2)", false, false, Some(gt_r), None));
    registry.register(binary("le", "less-than-or-equal-to operator (true=1, false=0)", "(%1 <= %2)", false, false, Some(le_r), None));
    registry.register(binary("ge", "greater-than-or-equal-to operator (true=1, false=0)", "(%1 >= %2)", false, false, Some(ge_r), None));
    registry.register(binary("eq", "equal-to operator (true=1, false=0)", "(%1 == %2)", true, false, Some(eq_r), Some(eq_z)));
    registry.register(binary("neq", "not-equal-to operator (true=1, false=0)", "(%1 != %2)", true, false, Some(neq_r), Some(neq_z)));

    registry.register(binary("complex", "create complex number using the last two operands as real,imaginary components", "(%1 + %2 i)", false, true, Some(complex_r), None));
}

fn bool_scalar(b: bool) -> Scalar {
    re(if b { 1.0 } else { 0.0 })
}

fn add_r(a: Real, b: Real) -> Scalar {
    re(a + b)
}
fn add_z(a: Scalar, b: Scalar) -> Scalar {
    a + b
}

fn subtract_r(a: Real, b: Real) -> Scalar {
    re(a - b)
}
fn subtract_z(a: Scalar, b: Scalar) -> Scalar {
    a - b
}

fn multiply_r(a: Real, b: Real) -> Scalar {
    re(a * b)
}
fn multiply_z(a: Scalar, b: Scalar) -> Scalar {
    a * b
}

fn divide_r(a: Real, b: Real) -> Scalar {
    re(a / b)
}
fn divide_z(a: Scalar, b: Scalar) -> Scalar {
    a / b
}

fn pow_r(a: Real, b: Real) -> Scalar {
    re(a.powf(b))
}
fn pow_z(a: Scalar, b: Scalar) -> Scalar {
    a.powc(b)
}

// NaN handling follows f32::min/f32::max: the non-NaN operand wins when
// one side is NaN. Non-NaN inputs behave per IEEE-754.
fn min_r(a: Real, b: Real) -> Scalar {
    re(a.min(b))
}
fn max_r(a: Real, b: Real) -> Scalar {
    re(a.max(b))
}

fn lt_r(a: Real, b: Real) -> Scalar {
    bool_scalar(a < b)
}
fn gt_r(a: Real, b: Real) -> Scalar {
    bool_scalar(a > b)
}
fn le_r(a: Real, b: Real) -> Scalar {
    bool_scalar(a <= b)
}
fn ge_r(a: Real, b: Real) -> Scalar {
    bool_scalar(a >= b)
}

fn eq_r(a: Real, b: Real) -> Scalar {
    bool_scalar(a == b)
}
fn eq_z(a: Scalar, b: Scalar) -> Scalar {
    bool_scalar(a == b)
}
fn neq_r(a: Real, b: Real) -> Scalar {
    bool_scalar(a != b)
}
fn neq_z(a: Scalar, b: Scalar) -> Scalar {
    bool_scalar(a != b)
}

fn complex_r(a: Real, b: Real) -> Scalar {
    Scalar::new(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::registry::registry;

    #[test]
    fn test_arithmetic() {
        assert_eq!(add_r(1.0, 2.0), re(3.0));
        assert_eq!(subtract_r(1.0, 2.0), re(-1.0));
        assert_eq!(multiply_r(3.0, 2.0), re(6.0));
        assert_eq!(divide_r(1.0, 4.0), re(0.25));
        assert_eq!(pow_r(2.0, 10.0), re(1024.0));
        assert!(divide_r(1.0, 0.0).re.is_infinite());
    }

    #[test]
    fn test_complex_arithmetic() {
        let i = Scalar::new(0.0, 1.0);
        assert_eq!(multiply_z(i, i), re(-1.0));
        assert_eq!(add_z(Scalar::new(1.0, 2.0), Scalar::new(3.0, -1.0)), Scalar::new(4.0, 1.0));
        let sq = pow_z(i, re(2.0));
        assert!((sq.re + 1.0).abs() < 1e-6);
        assert!(sq.im.abs() < 1e-6);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(lt_r(1.0, 2.0), re(1.0));
        assert_eq!(gt_r(1.0, 2.0), re(0.0));
        assert_eq!(le_r(2.0, 2.0), re(1.0));
        assert_eq!(ge_r(1.0, 2.0), re(0.0));
        assert_eq!(eq_r(2.0, 2.0), re(1.0));
        assert_eq!(neq_r(2.0, 2.0), re(0.0));
        // NaN compares false everywhere, including against itself.
        assert_eq!(eq_r(Real::NAN, Real::NAN), re(0.0));
        assert_eq!(neq_r(Real::NAN, Real::NAN), re(1.0));
    }

    #[test]
    fn test_equality_on_complex() {
        let a = Scalar::new(1.0, 2.0);
        let b = Scalar::new(1.0, -2.0);
        assert_eq!(eq_z(a, a), re(1.0));
        assert_eq!(eq_z(a, b), re(0.0));
        assert_eq!(neq_z(a, b), re(1.0));
    }

    #[test]
    fn test_min_max_nan() {
        assert_eq!(min_r(1.0, 2.0), re(1.0));
        assert_eq!(max_r(1.0, 2.0), re(2.0));
        assert_eq!(min_r(Real::NAN, 2.0), re(2.0));
        assert_eq!(max_r(1.0, Real::NAN), re(1.0));
    }

    #[test]
    fn test_complex_constructor_is_rtoz() {
        let spec = registry().get("complex").unwrap();
        assert!(spec.rtoz);
        assert!(!spec.supports(true));
        assert_eq!(complex_r(2.0, 3.0), Scalar::new(2.0, 3.0));
    }
}
