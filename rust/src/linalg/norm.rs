use std::fmt;

use crate::array::NdArray;
use crate::dtype::DType;
use crate::error::{ArrayError, Result};
use crate::reduce::{self, Axis};
use crate::ufunc::{self, BinaryOp};

/// The `ord` argument of [`norm`]; `None` at the call site means the
/// 2-norm.
#[derive(Debug, Clone, PartialEq)]
pub enum NormOrder {
    Inf,
    NegInf,
    Int(i64),
    Float(f64),
    /// A string order such as `"fro"`, which is not a vector norm.
    Named(String),
}

impl NormOrder {
    /// Integral value of the order, if it has one (`2.0` counts as `2`).
    fn as_int(&self) -> Option<i64> {
        match *self {
            NormOrder::Int(p) => Some(p),
            NormOrder::Float(p) if p.fract() == 0.0 && p.abs() < 1e18 => Some(p as i64),
            _ => None,
        }
    }

    fn is_inf(&self, positive: bool) -> bool {
        match *self {
            NormOrder::Inf => positive,
            NormOrder::NegInf => !positive,
            NormOrder::Float(p) => p.is_infinite() && (p > 0.0) == positive,
            _ => false,
        }
    }
}

impl fmt::Display for NormOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormOrder::Inf => f.write_str("inf"),
            NormOrder::NegInf => f.write_str("-inf"),
            NormOrder::Int(p) => write!(f, "{p}"),
            NormOrder::Float(p) => write!(f, "{p:?}"),
            NormOrder::Named(name) => f.write_str(name),
        }
    }
}

impl From<i64> for NormOrder {
    fn from(p: i64) -> Self {
        NormOrder::Int(p)
    }
}

impl From<i32> for NormOrder {
    fn from(p: i32) -> Self {
        NormOrder::Int(i64::from(p))
    }
}

impl From<f64> for NormOrder {
    fn from(p: f64) -> Self {
        if p == f64::INFINITY {
            NormOrder::Inf
        } else if p == f64::NEG_INFINITY {
            NormOrder::NegInf
        } else {
            NormOrder::Float(p)
        }
    }
}

impl From<&str> for NormOrder {
    fn from(name: &str) -> Self {
        NormOrder::Named(name.to_string())
    }
}

/// Vector norm of `x` along `axis`.
///
/// Only vector norms are supported: `axis` must be `Axis::Index`, or
/// `Axis::All` with a 1-d input. Anything that would be a matrix norm is
/// reported as not implemented.
pub fn norm(x: &NdArray, ord: Option<NormOrder>, axis: &Axis, keepdims: bool) -> Result<NdArray> {
    let vector = match axis {
        Axis::All => x.ndim() == 1,
        Axis::Index(_) => true,
        Axis::Many(_) => false,
    };
    if !vector {
        return Err(ArrayError::not_implemented(
            "needs support for other kinds of norms",
        ));
    }

    let Some(ord) = ord else {
        return two_norm(x, axis, keepdims);
    };
    if ord.is_inf(true) {
        return reduce::max(&ufunc::abs(x)?, axis.clone(), keepdims);
    }
    if ord.is_inf(false) {
        return reduce::min(&ufunc::abs(x)?, axis.clone(), keepdims);
    }
    if let NormOrder::Named(name) = &ord {
        return Err(ArrayError::invalid(format!(
            "Invalid norm order '{name}' for vectors"
        )));
    }
    match ord.as_int() {
        Some(0) => {
            let nonzero = ufunc::nonzero_mask(x)?.astype(DType::Int64);
            reduce::sum(&nonzero, axis.clone(), keepdims)
        }
        Some(1) => reduce::sum(&ufunc::abs(x)?, axis.clone(), keepdims),
        Some(2) => two_norm(x, axis, keepdims),
        Some(p) if matches!(ord, NormOrder::Int(_)) => p_norm(x, p, axis, keepdims),
        _ => Err(ArrayError::invalid("Invalid 'ord' argument passed to norm")),
    }
}

/// `sqrt(sum((conj(x) * x).real))`
fn two_norm(x: &NdArray, axis: &Axis, keepdims: bool) -> Result<NdArray> {
    let squares = ufunc::real(&ufunc::multiply(&ufunc::conj(x)?, x)?)?;
    ufunc::sqrt(&reduce::sum(&squares, axis.clone(), keepdims)?)
}

/// `sum(abs(x) ** p) ** (1 / p)`, with both powers applied in place.
fn p_norm(x: &NdArray, p: i64, axis: &Axis, keepdims: bool) -> Result<NdArray> {
    let mut absx = ufunc::abs(x)?;
    if absx.dtype().is_integral() {
        absx = absx.astype(DType::Float64);
    }
    ufunc::binary_into(BinaryOp::Power, &absx, &NdArray::from(p), &absx)?;
    let ret = reduce::sum(&absx, axis.clone(), keepdims)?;
    ufunc::power_inplace(&ret, 1.0 / p as f64)?;
    Ok(ret)
}
