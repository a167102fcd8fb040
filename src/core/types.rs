//! Scalar values and voxel datatypes.
//!
//! Every value flowing through the calculator is a complex number with
//! 32-bit components. A value is *real* when its imaginary part is exactly
//! zero; real-only operators reject anything else. The enum-based datatype
//! keeps the set of storable voxel formats closed so conversions can be
//! matched exhaustively.

use num_complex::Complex;
use std::fmt;

/// Real component type of every voxel value.
pub type Real = f32;

/// The value type of a single voxel.
pub type Scalar = Complex<Real>;

/// Lift a real number into a [`Scalar`] with zero imaginary part.
#[inline]
pub fn re(v: Real) -> Scalar {
    Scalar::new(v, 0.0)
}

/// A scalar is real when its imaginary part is exactly zero.
#[inline]
pub fn is_real(v: Scalar) -> bool {
    v.im == 0.0
}

/// Parse a numeric literal, including complex forms.
///
/// Accepted forms: `3`, `-1.5`, `1e-3`, `3+4i`, `3-4i`, `4i`, `-i`, `i`.
/// The split between real and imaginary part skips signs that belong to
/// an exponent (`1.5e-2+2i`). Returns `None` for anything else; reserved
/// words (`nan`, `rand`, ...) are handled by the expression builder, not
/// here.
pub fn parse_scalar(token: &str) -> Option<Scalar> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if let Ok(v) = token.parse::<Real>() {
        return Some(re(v));
    }
    let body = token.strip_suffix(|c| c == 'i' || c == 'I')?;
    // Bare imaginary unit, optionally signed.
    match body {
        "" | "+" => return Some(Scalar::new(0.0, 1.0)),
        "-" => return Some(Scalar::new(0.0, -1.0)),
        _ => {}
    }
    // Split at the last sign that is not leading and not an exponent sign.
    let bytes = body.as_bytes();
    let mut split = None;
    for p in (1..bytes.len()).rev() {
        if (bytes[p] == b'+' || bytes[p] == b'-') && !matches!(bytes[p - 1], b'e' | b'E') {
            split = Some(p);
            break;
        }
    }
    match split {
        Some(p) => {
            let re_part = body[..p].parse::<Real>().ok()?;
            let im_part = match &body[p..] {
                "+" => 1.0,
                "-" => -1.0,
                s => s.parse::<Real>().ok()?,
            };
            Some(Scalar::new(re_part, im_part))
        }
        None => {
            let im_part = body.parse::<Real>().ok()?;
            Some(Scalar::new(0.0, im_part))
        }
    }
}

/// Render a scalar for calculator-mode output and provenance strings.
///
/// Real values print as a bare number; complex values as `re+imi` or
/// `re-imi`.
pub fn format_scalar(v: Scalar) -> String {
    if is_real(v) {
        format!("{}", v.re)
    } else if v.im.is_sign_negative() {
        format!("{}{}i", v.re, v.im)
    } else {
        format!("{}+{}i", v.re, v.im)
    }
}

/// Voxel storage formats.
///
/// These are the values accepted by the `-datatype` option and the
/// formats an image file can declare. Complex kinds store two components
/// per voxel; integer kinds round the real part to nearest and clamp to
/// the type's range on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit float, real part only.
    Float32,
    /// 64-bit float, real part only.
    Float64,
    /// Complex pair of 32-bit floats.
    CFloat32,
    /// Complex pair of 64-bit floats.
    CFloat64,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
}

impl DataType {
    /// Parse a datatype specifier, case-insensitively.
    pub fn from_spec(spec: &str) -> Option<Self> {
        match spec.to_lowercase().as_str() {
            "float32" => Some(DataType::Float32),
            "float64" => Some(DataType::Float64),
            "cfloat32" => Some(DataType::CFloat32),
            "cfloat64" => Some(DataType::CFloat64),
            "int8" => Some(DataType::Int8),
            "uint8" => Some(DataType::UInt8),
            "int16" => Some(DataType::Int16),
            "uint16" => Some(DataType::UInt16),
            "int32" => Some(DataType::Int32),
            "uint32" => Some(DataType::UInt32),
            _ => None,
        }
    }

    /// Canonical name, as written to image headers.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
            DataType::CFloat32 => "CFloat32",
            DataType::CFloat64 => "CFloat64",
            DataType::Int8 => "Int8",
            DataType::UInt8 => "UInt8",
            DataType::Int16 => "Int16",
            DataType::UInt16 => "UInt16",
            DataType::Int32 => "Int32",
            DataType::UInt32 => "UInt32",
        }
    }

    /// Whether voxels of this type carry an imaginary component.
    pub fn is_complex(&self) -> bool {
        matches!(self, DataType::CFloat32 | DataType::CFloat64)
    }

    /// Storage size of one voxel in bytes.
    pub fn bytes_per_voxel(&self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Float32 | DataType::Int32 | DataType::UInt32 => 4,
            DataType::Float64 | DataType::CFloat32 => 8,
            DataType::CFloat64 => 16,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
