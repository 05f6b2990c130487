//! Elementwise kernels with NumPy type promotion and broadcasting.
//!
//! Every operation computes into a fresh buffer before anything is written to
//! an `out` array, so `out` may alias (or be a view of) either input.

use std::cmp::Ordering;

use crate::array::NdArray;
use crate::dtype::{DType, Scalar};
use crate::error::{ArrayError, Result};
use crate::shape::{broadcast_all, broadcast_shapes};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negative,
    Absolute,
    Sqrt,
    Exp,
    Tanh,
    Conjugate,
    Real,
    Imag,
    IsNonZero,
    LogicalNot,
}

impl UnaryOp {
    pub const fn name(self) -> &'static str {
        match self {
            UnaryOp::Negative => "negative",
            UnaryOp::Absolute => "absolute",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Conjugate => "conjugate",
            UnaryOp::Real => "real",
            UnaryOp::Imag => "imag",
            UnaryOp::IsNonZero => "nonzero",
            UnaryOp::LogicalNot => "logical_not",
        }
    }

    fn compute_dtype(self, input: DType) -> Result<DType> {
        match self {
            UnaryOp::Negative if input == DType::Bool => Err(ArrayError::invalid(
                "The numpy boolean negative, the `-` operator, is not supported, \
                 use the `~` operator or the logical_not function instead.",
            )),
            UnaryOp::Sqrt | UnaryOp::Exp | UnaryOp::Tanh => Ok(input.inexact()),
            _ => Ok(input),
        }
    }

    pub fn result_dtype(self, input: DType) -> Result<DType> {
        let compute = self.compute_dtype(input)?;
        Ok(match self {
            UnaryOp::Absolute | UnaryOp::Real | UnaryOp::Imag => compute.real_part(),
            UnaryOp::IsNonZero | UnaryOp::LogicalNot => DType::Bool,
            _ => compute,
        })
    }

    fn apply(self, value: Scalar) -> Scalar {
        use Scalar::*;
        match (self, value) {
            (UnaryOp::Negative, Int(v)) => Int(v.wrapping_neg()),
            (UnaryOp::Negative, Float(v)) => Float(-v),
            (UnaryOp::Negative, Complex(v)) => Complex(-v),
            (UnaryOp::Absolute, Int(v)) => Int(v.wrapping_abs()),
            (UnaryOp::Absolute, Float(v)) => Float(v.abs()),
            (UnaryOp::Absolute, Complex(v)) => Float(v.norm()),
            (UnaryOp::Sqrt, Float(v)) => Float(v.sqrt()),
            (UnaryOp::Sqrt, Complex(v)) => Complex(v.sqrt()),
            (UnaryOp::Exp, Float(v)) => Float(v.exp()),
            (UnaryOp::Exp, Complex(v)) => Complex(v.exp()),
            (UnaryOp::Tanh, Float(v)) => Float(v.tanh()),
            (UnaryOp::Tanh, Complex(v)) => Complex(v.tanh()),
            (UnaryOp::Conjugate, Complex(v)) => Complex(v.conj()),
            (UnaryOp::Real, Complex(v)) => Float(v.re),
            (UnaryOp::Imag, Complex(v)) => Float(v.im),
            (UnaryOp::Imag, other) => other.dtype().zero(),
            (UnaryOp::IsNonZero, other) => Bool(other.is_nonzero()),
            (UnaryOp::LogicalNot, other) => Bool(!other.is_nonzero()),
            (_, other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    TrueDivide,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Maximum,
    Minimum,
}

impl BinaryOp {
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::TrueDivide => "true_divide",
            BinaryOp::Power => "power",
            BinaryOp::Equal => "equal",
            BinaryOp::NotEqual => "not_equal",
            BinaryOp::Less => "less",
            BinaryOp::LessEqual => "less_equal",
            BinaryOp::Greater => "greater",
            BinaryOp::GreaterEqual => "greater_equal",
            BinaryOp::LogicalAnd => "logical_and",
            BinaryOp::LogicalOr => "logical_or",
            BinaryOp::LogicalXor => "logical_xor",
            BinaryOp::Maximum => "maximum",
            BinaryOp::Minimum => "minimum",
        }
    }

    fn is_predicate(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
                | BinaryOp::LogicalXor
        )
    }

    fn compute_dtype(self, left: DType, right: DType) -> Result<DType> {
        let common = left.promote(right);
        match self {
            BinaryOp::Subtract if common == DType::Bool => Err(ArrayError::invalid(
                "numpy boolean subtract, the `-` operator, is not supported, \
                 use the bitwise_xor, the `^` operator, or the logical_xor function instead.",
            )),
            BinaryOp::TrueDivide => Ok(common.inexact()),
            BinaryOp::Power if common == DType::Bool => Ok(DType::Int64),
            _ => Ok(common),
        }
    }

    pub fn result_dtype(self, left: DType, right: DType) -> Result<DType> {
        let compute = self.compute_dtype(left, right)?;
        Ok(if self.is_predicate() {
            DType::Bool
        } else {
            compute
        })
    }

    /// Both operands are already cast to the compute dtype.
    fn apply(self, left: Scalar, right: Scalar) -> Result<Scalar> {
        use Scalar::*;
        let value = match self {
            BinaryOp::Equal => Bool(left.equals(&right)),
            BinaryOp::NotEqual => Bool(!left.equals(&right)),
            BinaryOp::Less => Bool(compare(left, right) == Some(Ordering::Less)),
            BinaryOp::LessEqual => Bool(matches!(
                compare(left, right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Greater => Bool(compare(left, right) == Some(Ordering::Greater)),
            BinaryOp::GreaterEqual => Bool(matches!(
                compare(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOp::LogicalAnd => Bool(left.is_nonzero() && right.is_nonzero()),
            BinaryOp::LogicalOr => Bool(left.is_nonzero() || right.is_nonzero()),
            BinaryOp::LogicalXor => Bool(left.is_nonzero() != right.is_nonzero()),
            BinaryOp::Maximum => extremum(left, right, Ordering::Greater),
            BinaryOp::Minimum => extremum(left, right, Ordering::Less),
            BinaryOp::Add => match (left, right) {
                (Bool(a), Bool(b)) => Bool(a || b),
                (Int(a), Int(b)) => Int(a.wrapping_add(b)),
                (Float(a), Float(b)) => Float(a + b),
                (a, b) => Complex(a.to_complex() + b.to_complex()),
            },
            BinaryOp::Subtract => match (left, right) {
                (Int(a), Int(b)) => Int(a.wrapping_sub(b)),
                (Float(a), Float(b)) => Float(a - b),
                (a, b) => Complex(a.to_complex() - b.to_complex()),
            },
            BinaryOp::Multiply => match (left, right) {
                (Bool(a), Bool(b)) => Bool(a && b),
                (Int(a), Int(b)) => Int(a.wrapping_mul(b)),
                (Float(a), Float(b)) => Float(a * b),
                (a, b) => Complex(a.to_complex() * b.to_complex()),
            },
            BinaryOp::TrueDivide => match (left, right) {
                (Float(a), Float(b)) => Float(a / b),
                (a, b) => Complex(a.to_complex() / b.to_complex()),
            },
            BinaryOp::Power => match (left, right) {
                (Int(a), Int(b)) => Int(int_pow(a, b)?),
                (Float(a), Float(b)) => Float(a.powf(b)),
                (a, b) => Complex(a.to_complex().powc(b.to_complex())),
            },
        };
        Ok(value)
    }
}

fn int_pow(base: i64, exponent: i64) -> Result<i64> {
    if exponent < 0 {
        return Err(ArrayError::invalid(
            "Integers to negative integer powers are not allowed.",
        ));
    }
    let mut result = 1i64;
    let mut base = base;
    let mut exponent = exponent as u64;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exponent >>= 1;
    }
    Ok(result)
}

/// Ordering of two scalars of the same dtype. Complex values compare
/// lexicographically; any NaN makes them unordered.
pub(crate) fn compare(left: Scalar, right: Scalar) -> Option<Ordering> {
    match (left, right) {
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(&b)),
        (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(&b)),
        (Scalar::Complex(a), Scalar::Complex(b)) => {
            match (a.re.partial_cmp(&b.re)?, a.im.partial_cmp(&b.im)?) {
                (Ordering::Equal, im) => Some(im),
                (re, _) => Some(re),
            }
        }
        (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
    }
}

fn is_nan(value: Scalar) -> bool {
    match value {
        Scalar::Float(v) => v.is_nan(),
        Scalar::Complex(v) => v.re.is_nan() || v.im.is_nan(),
        _ => false,
    }
}

/// NaN-propagating max/min, as `np.maximum` and `np.minimum`.
fn extremum(left: Scalar, right: Scalar, keep: Ordering) -> Scalar {
    match compare(left, right) {
        Some(ordering) if ordering == keep || ordering == Ordering::Equal => left,
        Some(_) => right,
        None if is_nan(left) => left,
        None => right,
    }
}

fn check_output(result: DType, out: &NdArray) -> Result<()> {
    if result.promote(out.dtype()) != out.dtype() {
        return Err(ArrayError::DTypeMismatch {
            from: result,
            to: out.dtype(),
        });
    }
    Ok(())
}

fn check_output_shape(shape: &[usize], out: &NdArray) -> Result<()> {
    if shape != out.shape() {
        return Err(ArrayError::shape(format!(
            "non-broadcastable output operand with shape {:?} doesn't match the broadcast shape {shape:?}",
            out.shape()
        )));
    }
    Ok(())
}

fn unary_values(op: UnaryOp, x: &NdArray) -> Result<Storage> {
    let compute = op.compute_dtype(x.dtype())?;
    let result = op.result_dtype(x.dtype())?;
    let values = x.to_storage().astype(compute);
    Ok(Storage::from_scalars(
        result,
        values.iter().map(|value| op.apply(value)),
    ))
}

fn binary_values(op: BinaryOp, a: &NdArray, b: &NdArray, shape: &[usize]) -> Result<Storage> {
    let compute = op.compute_dtype(a.dtype(), b.dtype())?;
    let result = op.result_dtype(a.dtype(), b.dtype())?;
    let left = a.broadcast_to(shape)?.to_storage().astype(compute);
    let right = b.broadcast_to(shape)?.to_storage().astype(compute);
    let values = left
        .iter()
        .zip(right.iter())
        .map(|(l, r)| op.apply(l, r))
        .collect::<Result<Vec<_>>>()?;
    Ok(Storage::from_scalars(result, values))
}

pub fn unary(op: UnaryOp, x: &NdArray) -> Result<NdArray> {
    let values = unary_values(op, x)?;
    Ok(NdArray::from_storage(values, x.shape()))
}

/// `op(x, out=out)`; `x` must broadcast to `out`'s shape.
pub fn unary_into(op: UnaryOp, x: &NdArray, out: &NdArray) -> Result<()> {
    check_output(op.result_dtype(x.dtype())?, out)?;
    check_output_shape(&broadcast_shapes(x.shape(), out.shape())?, out)?;
    let values = unary_values(op, &x.broadcast_to(out.shape())?)?;
    out.write_storage(&values.astype(out.dtype()));
    Ok(())
}

pub fn binary(op: BinaryOp, a: &NdArray, b: &NdArray) -> Result<NdArray> {
    let shape = broadcast_shapes(a.shape(), b.shape())?;
    let values = binary_values(op, a, b, &shape)?;
    Ok(NdArray::from_storage(values, &shape))
}

/// `op(a, b, out=out)`; the operands must broadcast to `out`'s shape.
pub fn binary_into(op: BinaryOp, a: &NdArray, b: &NdArray, out: &NdArray) -> Result<()> {
    check_output(op.result_dtype(a.dtype(), b.dtype())?, out)?;
    let shape = broadcast_all(&[a.shape(), b.shape(), out.shape()])?;
    check_output_shape(&shape, out)?;
    let values = binary_values(op, a, b, &shape)?;
    out.write_storage(&values.astype(out.dtype()));
    Ok(())
}

pub fn negative(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Negative, x)
}

pub fn abs(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Absolute, x)
}

pub fn sqrt(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Sqrt, x)
}

pub fn exp(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Exp, x)
}

pub fn tanh(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Tanh, x)
}

pub fn conj(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Conjugate, x)
}

pub fn real(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Real, x)
}

pub fn imag(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::Imag, x)
}

/// `x != 0` as a boolean array.
pub fn nonzero_mask(x: &NdArray) -> Result<NdArray> {
    unary(UnaryOp::IsNonZero, x)
}

pub fn add(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Add, a, b)
}

pub fn subtract(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Subtract, a, b)
}

pub fn multiply(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Multiply, a, b)
}

pub fn divide(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::TrueDivide, a, b)
}

pub fn power(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Power, a, b)
}

/// `x **= exponent`.
pub fn power_inplace(x: &NdArray, exponent: impl Into<Scalar>) -> Result<()> {
    let exponent = NdArray::from_scalar(exponent);
    binary_into(BinaryOp::Power, x, &exponent, x)
}

pub fn equal(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Equal, a, b)
}

pub fn not_equal(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::NotEqual, a, b)
}

pub fn less(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Less, a, b)
}

pub fn greater(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Greater, a, b)
}

pub fn logical_xor(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::LogicalXor, a, b)
}

pub fn maximum(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Maximum, a, b)
}

pub fn minimum(a: &NdArray, b: &NdArray) -> Result<NdArray> {
    binary(BinaryOp::Minimum, a, b)
}
