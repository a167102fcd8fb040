//! Ternary operator kernels.

use crate::core::types::{Real, Scalar};
use crate::ops::registry::{Kernels, OpRegistry, OpSpec, TernaryR, TernaryZ};

/// Register all ternary operators.
pub fn register(registry: &mut OpRegistry) {
    let ternary = |name: &'static str,
                   description: &'static str,
                   format: &'static str,
                   r: Option<TernaryR>,
                   z: Option<TernaryZ>| OpSpec {
        name,
        description,
        format,
        ztor: false,
        rtoz: false,
        kernels: Kernels::Ternary { r, z },
    };

    registry.register(ternary(
        "if",
        "if first operand is true (non-zero), return second operand, otherwise return third operand",
        "(%1 ? %2 : %3)",
        Some(if_r),
        Some(if_z),
    ));
}

// Truthiness is "not exactly zero", so NaN conditions select the second
// operand.
fn if_r(a: Real, b: Real, c: Real) -> Scalar {
    Scalar::new(if a != 0.0 { b } else { c }, 0.0)
}

// The complex condition tests only its real part.
fn if_z(a: Scalar, b: Scalar, c: Scalar) -> Scalar {
    if a.re != 0.0 {
        b
    } else {
        c
    }
}
