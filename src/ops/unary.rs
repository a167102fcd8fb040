//! Unary operator kernels.
//!
//! R kernels take the real part of their operand; Z kernels take the full
//! complex value. Both return a [`Scalar`]. Domain violations follow
//! IEEE-754 (`sqrt(-1)` in the real domain is NaN, not an error).

use crate::core::types::{re, Real, Scalar};
use crate::ops::registry::{Kernels, OpRegistry, OpSpec};
use std::f32::consts::LN_10;

/// Register all unary operators.
pub fn register(registry: &mut OpRegistry) {
    let unary = |name: &'static str,
                 description: &'static str,
                 format: &'static str,
                 ztor: bool,
                 rtoz: bool,
                 r: Option<crate::ops::registry::UnaryR>,
                 z: Option<crate::ops::registry::UnaryZ>| OpSpec {
        name,
        description,
        format,
        ztor,
        rtoz,
        kernels: Kernels::Unary { r, z },
    };

    registry.register(unary("abs", "absolute value", "|%1|", true, false, Some(abs_r), Some(abs_z)));
    registry.register(unary("neg", "negative value", "-%1", false, false, Some(neg_r), Some(neg_z)));
    registry.register(unary("sqrt", "square root", "sqrt (%1)", false, false, Some(sqrt_r), Some(sqrt_z)));
    registry.register(unary("exp", "exponential function", "exp (%1)", false, false, Some(exp_r), Some(exp_z)));
    registry.register(unary("log", "natural logarithm", "log (%1)", false, false, Some(log_r), Some(log_z)));
    registry.register(unary("log10", "common logarithm", "log10 (%1)", false, false, Some(log10_r), Some(log10_z)));

    registry.register(unary("cos", "cosine", "cos (%1)", false, false, Some(cos_r), Some(cos_z)));
    registry.register(unary("sin", "sine", "sin (%1)", false, false, Some(sin_r), Some(sin_z)));
    registry.register(unary("tan", "tangent", "tan (%1)", false, false, Some(tan_r), Some(tan_z)));

    registry.register(unary("cosh", "hyperbolic cosine", "cosh (%1)", false, false, Some(cosh_r), Some(cosh_z)));
    registry.register(unary("sinh", "hyperbolic sine", "sinh (%1)", false, false, Some(sinh_r), Some(sinh_z)));
    registry.register(unary("tanh", "hyperbolic tangent", "tanh (%1)", false, false, Some(tanh_r), Some(tanh_z)));

    registry.register(unary("acos", "inverse cosine", "acos (%1)", false, false, Some(acos_r), None));
    registry.register(unary("asin", "inverse sine", "asin (%1)", false, false, Some(asin_r), None));
    registry.register(unary("atan", "inverse tangent", "atan (%1)", false, false, Some(atan_r), None));

    registry.register(unary("acosh", "inverse hyperbolic cosine", "acosh (%1)", false, false, Some(acosh_r), None));
    registry.register(unary("asinh", "inverse hyperbolic sine", "asinh (%1)", false, false, Some(asinh_r), None));
    registry.register(unary("atanh", "inverse hyperbolic tangent", "atanh (%1)", false, false, Some(atanh_r), None));

    registry.register(unary("round", "round to nearest integer", "round (%1)", false, false, Some(round_r), None));
    registry.register(unary("ceil", "round up to nearest integer", "ceil (%1)", false, false, Some(ceil_r), None));
    registry.register(unary("floor", "round down to nearest integer", "floor (%1)", false, false, Some(floor_r), None));

    registry.register(unary("real", "real part of complex number", "real (%1)", true, false, None, Some(real_z)));
    registry.register(unary("imag", "imaginary part of complex number", "imag (%1)", true, false, None, Some(imag_z)));
    registry.register(unary("phase", "phase of complex number", "phase (%1)", true, false, None, Some(phase_z)));
    registry.register(unary("conj", "complex conjugate", "conj (%1)", false, false, None, Some(conj_z)));

    registry.register(unary("isnan", "true (1) if operand is not-a-number (NaN)", "isnan (%1)", true, false, Some(isnan_r), Some(isnan_z)));
    registry.register(unary("isinf", "true (1) if operand is infinite (Inf)", "isinf (%1)", true, false, Some(isinf_r), Some(isinf_z)));
    registry.register(unary("finite", "true (1) if operand is finite (i.e. not NaN or Inf)", "finite (%1)", true, false, Some(finite_r), Some(finite_z)));
}

fn bool_scalar(b: bool) -> Scalar {
    re(if b { 1.0 } else { 0.0 })
}

fn abs_r(v: Real) -> Scalar {
    re(v.abs())
}
fn abs_z(v: Scalar) -> Scalar {
    re(v.norm())
}

fn neg_r(v: Real) -> Scalar {
    re(-v)
}
fn neg_z(v: Scalar) -> Scalar {
    -v
}

fn sqrt_r(v: Real) -> Scalar {
    re(v.sqrt())
}
fn sqrt_z(v: Scalar) -> Scalar {
    v.sqrt()
}

fn exp_r(v: Real) -> Scalar {
    re(v.exp())
}
fn exp_z(v: Scalar) -> Scalar {
    v.exp()
}

fn log_r(v: Real) -> Scalar {
    re(v.ln())
}
fn log_z(v: Scalar) -> Scalar {
    v.ln()
}

fn log10_r(v: Real) -> Scalar {
    re(v.log10())
}
fn log10_z(v: Scalar) -> Scalar {
    v.ln() / LN_10
}

fn cos_r(v: Real) -> Scalar {
    re(v.cos())
}
fn cos_z(v: Scalar) -> Scalar {
    v.cos()
}

fn sin_r(v: Real) -> Scalar {
    re(v.sin())
}
fn sin_z(v: Scalar) -> Scalar {
    v.sin()
}

fn tan_r(v: Real) -> Scalar {
    re(v.tan())
}
fn tan_z(v: Scalar) -> Scalar {
    v.tan()
}

fn cosh_r(v: Real) -> Scalar {
    re(v.cosh())
}
fn cosh_z(v: Scalar) -> Scalar {
    v.cosh()
}

fn sinh_r(v: Real) -> Scalar {
    re(v.sinh())
}
fn sinh_z(v: Scalar) -> Scalar {
    v.sinh()
}

fn tanh_r(v: Real) -> Scalar {
    re(v.tanh())
}
fn tanh_z(v: Scalar) -> Scalar {
    v.tanh()
}

fn acos_r(v: Real) -> Scalar {
    re(v.acos())
}
fn asin_r(v: Real) -> Scalar {
    re(v.asin())
}
fn atan_r(v: Real) -> Scalar {
    re(v.atan())
}

fn acosh_r(v: Real) -> Scalar {
    re(v.acosh())
}
fn asinh_r(v: Real) -> Scalar {
    re(v.asinh())
}
fn atanh_r(v: Real) -> Scalar {
    re(v.atanh())
}

fn round_r(v: Real) -> Scalar {
    re(v.round())
}
fn ceil_r(v: Real) -> Scalar {
    re(v.ceil())
}
fn floor_r(v: Real) -> Scalar {
    re(v.floor())
}

fn real_z(v: Scalar) -> Scalar {
    re(v.re)
}
fn imag_z(v: Scalar) -> Scalar {
    re(v.im)
}
fn phase_z(v: Scalar) -> Scalar {
    re(v.arg())
}
fn conj_z(v: Scalar) -> Scalar {
    v.conj()
}

fn isnan_r(v: Real) -> Scalar {
    bool_scalar(v.is_nan())
}
// The Z predicates test each component independently: true when either
// satisfies. finite keeps the same either-component rule, so for complex
// values finite(z) is not the negation of isnan(z) || isinf(z).
fn isnan_z(v: Scalar) -> Scalar {
    bool_scalar(v.re.is_nan() || v.im.is_nan())
}

fn isinf_r(v: Real) -> Scalar {
    bool_scalar(v.is_infinite())
}
fn isinf_z(v: Scalar) -> Scalar {
    bool_scalar(v.re.is_infinite() || v.im.is_infinite())
}

fn finite_r(v: Real) -> Scalar {
    bool_scalar(v.is_finite())
}
fn finite_z(v: Scalar) -> Scalar {
    bool_scalar(v.re.is_finite() || v.im.is_finite())
}
