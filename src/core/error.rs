//! Error types for voxcalc.
//!
//! A single closed taxonomy covers both build-time failures (bad tokens,
//! stack misuse, incompatible geometry) and evaluation-time failures.
//! Builder-phase errors abort before any worker is spawned; inside the
//! worker pool the first error wins and cancels the remaining tiles.

use thiserror::Error;

/// Top-level error type for the calculator.
#[derive(Error, Debug)]
pub enum CalcError {
    /// An operand token is neither a readable image, a reserved word, nor
    /// a numeric literal.
    #[error("invalid operand \"{token}\": not an image, reserved word, or numeric value")]
    Parse {
        /// The offending token.
        token: String,
    },

    /// An operator was applied with fewer entries on the stack than its
    /// arity requires.
    #[error("not enough operands on stack for operation \"{op}\" (needs {needed}, found {found})")]
    StackUnderflow {
        /// Operator name.
        op: String,
        /// Operator arity.
        needed: usize,
        /// Stack height at the point of application.
        found: usize,
    },

    /// After all tokens were consumed the stack was not in a valid
    /// terminal shape.
    #[error("{remaining} operands left on stack after evaluating expression")]
    StackImbalance {
        /// Final stack height.
        remaining: usize,
    },

    /// Image leaves are present but no output path trails the expression.
    #[error("output image not specified")]
    OutputNotSpecified,

    /// The operator lacks the kernel required by its operands' type.
    #[error("operation \"{op}\" not supported for the data type supplied")]
    OperationNotSupported {
        /// Operator name.
        op: String,
    },

    /// Two image leaves disagree on an axis size and neither is 1.
    #[error("dimensions of input images do not match on axis {axis} ({left} vs {right})")]
    GeometryMismatch {
        /// Offending axis.
        axis: usize,
        /// Size already established for the axis.
        left: usize,
        /// Conflicting size.
        right: usize,
    },

    /// The requested output datatype's complex-ness conflicts with the
    /// expression's.
    #[error("output datatype {requested} does not match the expression (which is {kind})")]
    DatatypeMismatch {
        /// Name of the requested datatype.
        requested: &'static str,
        /// `"complex"` or `"real"`, describing the expression root.
        kind: &'static str,
    },

    /// Opening an input or creating the output failed.
    #[error("error accessing \"{path}\": {source}")]
    Io {
        /// The path involved.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An image file was recognised but its header or payload is invalid.
    #[error("invalid image file \"{path}\": {detail}")]
    Format {
        /// The path involved.
        path: String,
        /// What was wrong with it.
        detail: String,
    },

    /// A configuration value is outside its valid range.
    #[error("value out of range: {detail}")]
    Range {
        /// What was out of range.
        detail: String,
    },

    /// Evaluation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,
}

impl CalcError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CalcError::Io {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a format error on the given path.
    pub fn format(path: impl Into<String>, detail: impl Into<String>) -> Self {
        CalcError::Format {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Result type alias for calculator operations.
pub type CalcResult<T> = Result<T, CalcError>;
