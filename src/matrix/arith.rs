//! Delayed element-wise arithmetic and math functions
//!
//! All operations are evaluated on extraction. A node stays sparse only when
//! its operation maps zero to zero, so that structural zeros of the input
//! remain zeros in the output.

use super::{Axis, Extract, Matrix};
use crate::error::{Result, ScranError};
use std::str::FromStr;
use std::sync::Arc;

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl FromStr for ArithOp {
    type Err = ScranError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" | "add" => Ok(ArithOp::Add),
            "-" | "subtract" => Ok(ArithOp::Subtract),
            "*" | "multiply" => Ok(ArithOp::Multiply),
            "/" | "divide" => Ok(ArithOp::Divide),
            _ => Err(ScranError::UnknownOperation {
                kind: "arithmetic operation",
                name: s.to_string(),
            }),
        }
    }
}

impl ArithOp {
    /// Apply to matrix element `x` and operand `y`
    ///
    /// With `right`, the element is the right-hand operand (`y - x`, `y / x`).
    #[inline]
    pub fn apply(self, x: f64, y: f64, right: bool) -> f64 {
        let (a, b) = if right { (y, x) } else { (x, y) };
        match self {
            ArithOp::Add => a + b,
            ArithOp::Subtract => a - b,
            ArithOp::Multiply => a * b,
            ArithOp::Divide => a / b,
        }
    }

    /// Whether `apply(0, y, right)` is zero
    pub fn preserves_zero(self, y: f64, right: bool) -> bool {
        match (self, right) {
            (ArithOp::Add, _) | (ArithOp::Subtract, _) => y == 0.0,
            (ArithOp::Multiply, _) => y.is_finite(),
            (ArithOp::Divide, false) => y != 0.0 && !y.is_nan(),
            (ArithOp::Divide, true) => false,
        }
    }
}

/// Unary math function
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathOp {
    /// Absolute value
    Abs,
    /// Square root
    Sqrt,
    /// `ln(1 + x)`
    Log1p,
    /// `e^x`
    Exp,
    /// `e^x - 1`
    Expm1,
    /// Round half away from zero
    Round,
    /// -1, 0 or 1
    Sign,
    /// Round up
    Ceil,
    /// Round down
    Floor,
    /// Round toward zero
    Trunc,
    /// Logarithm; natural when no base is given
    Log(Option<f64>),
}

impl MathOp {
    /// Parse a function name, with an optional base for `log`
    ///
    /// # Errors
    ///
    /// - [`ScranError::UnknownOperation`] for unrecognized names
    /// - [`ScranError::InvalidArgument`] for a `log` base that is not
    ///   positive, equals one, or is not finite
    pub fn parse(name: &str, base: Option<f64>) -> Result<Self> {
        let op = match name {
            "abs" => MathOp::Abs,
            "sqrt" => MathOp::Sqrt,
            "log1p" => MathOp::Log1p,
            "exp" => MathOp::Exp,
            "expm1" => MathOp::Expm1,
            "round" => MathOp::Round,
            "sign" => MathOp::Sign,
            "ceil" => MathOp::Ceil,
            "floor" => MathOp::Floor,
            "trunc" => MathOp::Trunc,
            "log" => {
                if let Some(b) = base {
                    if !(b.is_finite() && b > 0.0 && b != 1.0) {
                        return Err(ScranError::InvalidArgument(format!(
                            "log base must be positive and not 1, got {}",
                            b
                        )));
                    }
                }
                MathOp::Log(base)
            }
            _ => {
                return Err(ScranError::UnknownOperation {
                    kind: "math operation",
                    name: name.to_string(),
                })
            }
        };
        Ok(op)
    }

    /// Evaluate at `x`
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            MathOp::Abs => x.abs(),
            MathOp::Sqrt => x.sqrt(),
            MathOp::Log1p => x.ln_1p(),
            MathOp::Exp => x.exp(),
            MathOp::Expm1 => x.exp_m1(),
            MathOp::Round => x.round(),
            MathOp::Sign => {
                if x == 0.0 || x.is_nan() {
                    x
                } else {
                    x.signum()
                }
            }
            MathOp::Ceil => x.ceil(),
            MathOp::Floor => x.floor(),
            MathOp::Trunc => x.trunc(),
            MathOp::Log(None) => x.ln(),
            MathOp::Log(Some(base)) => x.ln() / base.ln(),
        }
    }

    /// Whether `apply(0) == 0`
    pub fn preserves_zero(self) -> bool {
        !matches!(self, MathOp::Exp | MathOp::Log(_))
    }
}

/// Element-wise operation recorded by a [`DelayedUnary`] node
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOp {
    /// Arithmetic against a constant
    Scalar {
        /// Operator
        op: ArithOp,
        /// Constant operand
        value: f64,
        /// Whether the matrix element is the right operand
        right: bool,
    },
    /// Arithmetic against one value per row or per column
    Vector {
        /// Operator
        op: ArithOp,
        /// One operand per entry of `margin`
        values: Arc<[f64]>,
        /// `Axis::Row`: one value per row; `Axis::Column`: one per column
        margin: Axis,
        /// Whether the matrix element is the right operand
        right: bool,
    },
    /// Unary function
    Math(MathOp),
}

impl UnaryOp {
    fn preserves_zero(&self) -> bool {
        match self {
            UnaryOp::Scalar { op, value, right } => op.preserves_zero(*value, *right),
            UnaryOp::Vector {
                op, values, right, ..
            } => values.iter().all(|&v| op.preserves_zero(v, *right)),
            UnaryOp::Math(m) => m.preserves_zero(),
        }
    }
}

/// Applies a [`UnaryOp`] to every element of another matrix on extraction
#[derive(Debug)]
pub struct DelayedUnary {
    inner: Arc<dyn Matrix>,
    op: UnaryOp,
}

impl DelayedUnary {
    /// Wrap `inner` with `op`
    ///
    /// # Errors
    ///
    /// Returns [`ScranError::LengthMismatch`] if a vector operand's length
    /// differs from the extent of its margin.
    pub fn new(inner: Arc<dyn Matrix>, op: UnaryOp) -> Result<Self> {
        if let UnaryOp::Vector { values, margin, .. } = &op {
            let expected = inner.extent(*margin);
            if values.len() != expected {
                return Err(ScranError::LengthMismatch {
                    what: match margin {
                        Axis::Row => "per-row operand vector",
                        Axis::Column => "per-column operand vector",
                    },
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(Self { inner, op })
    }

    /// Recorded operation
    pub fn op(&self) -> &UnaryOp {
        &self.op
    }
}

impl Matrix for DelayedUnary {
    fn nrow(&self) -> usize {
        self.inner.nrow()
    }

    fn ncol(&self) -> usize {
        self.inner.ncol()
    }

    fn is_sparse(&self) -> bool {
        self.inner.is_sparse() && self.op.preserves_zero()
    }

    fn prefer_rows(&self) -> bool {
        self.inner.prefer_rows()
    }

    fn extractor(&self, axis: Axis) -> Box<dyn Extract + '_> {
        Box::new(UnaryExtractor {
            inner: self.inner.extractor(axis),
            op: &self.op,
            axis,
        })
    }
}

struct UnaryExtractor<'a> {
    inner: Box<dyn Extract + 'a>,
    op: &'a UnaryOp,
    axis: Axis,
}

impl Extract for UnaryExtractor<'_> {
    fn fetch(&mut self, index: usize, out: &mut [f64]) {
        self.inner.fetch(index, out);
        match self.op {
            UnaryOp::Scalar { op, value, right } => {
                for x in out.iter_mut() {
                    *x = op.apply(*x, *value, *right);
                }
            }
            UnaryOp::Vector {
                op,
                values,
                margin,
                right,
            } => {
                if *margin == self.axis {
                    // Whole slice shares one operand
                    let y = values[index];
                    for x in out.iter_mut() {
                        *x = op.apply(*x, y, *right);
                    }
                } else {
                    for (x, &y) in out.iter_mut().zip(values.iter()) {
                        *x = op.apply(*x, y, *right);
                    }
                }
            }
            UnaryOp::Math(m) => {
                for x in out.iter_mut() {
                    *x = m.apply(*x);
                }
            }
        }
    }
}
